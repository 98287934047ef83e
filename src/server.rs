//! The single-threaded control loop.
//!
//! One iteration runs a playback step and then serves at most one pending
//! client. While a command waits for its payload, playback pauses; a stalled
//! peer can freeze the strip for up to the socket timeout per read.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, TcpListener};
use std::time::Instant;

use thiserror::Error;

use crate::PixelSink;
use crate::config::{Config, ConfigError};
use crate::connection::TcpConnection;
use crate::controller::Controller;
use crate::protocol::{CommandError, Opcode};

/// Errors that prevent the control loop from starting.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to open listener: {0}")]
    Io(#[from] io::Error),
}

/// What one iteration of the loop did with the network side.
#[derive(Debug)]
pub enum Served {
    /// No client was waiting
    Idle,
    /// A client connected and its command ran or was abandoned
    Client {
        peer: Option<SocketAddr>,
        outcome: Result<Opcode, CommandError>,
    },
}

#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    config: Config,
    last_status: Instant,
}

impl Server {
    /// Listen on all interfaces at the configured port.
    pub fn bind(config: Config) -> Result<Self, ServerError> {
        config.validate()?;
        let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, config.port))?;
        Self::from_listener(listener, config)
    }

    /// Serve on an already bound listener.
    pub fn from_listener(listener: TcpListener, config: Config) -> Result<Self, ServerError> {
        config.validate()?;
        listener.set_nonblocking(true)?;
        log::info!("listening on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            config,
            last_status: Instant::now(),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the control loop forever.
    pub fn run<S: PixelSink>(&mut self, controller: &mut Controller<S>) -> ! {
        loop {
            if let Served::Idle = self.poll_once(controller) {
                std::thread::sleep(self.config.idle_pause);
            }
        }
    }

    /// One loop iteration: a playback step, then at most one client.
    pub fn poll_once<S: PixelSink>(&mut self, controller: &mut Controller<S>) -> Served {
        let now = Instant::now();
        if let Err(e) = controller.tick(now) {
            log::warn!("frame playback failed: {e}");
        }
        self.log_status(controller, now);

        let stream = match self.listener.accept() {
            Ok((stream, _)) => stream,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Served::Idle,
            Err(e) => {
                log::warn!("accept failed: {e}");
                return Served::Idle;
            }
        };

        let mut conn = match TcpConnection::new(stream, self.config.poll_interval) {
            Ok(conn) => conn,
            Err(e) => {
                log::warn!("failed to set up client connection: {e}");
                return Served::Idle;
            }
        };
        let peer = conn.peer_addr();
        log::info!("client connected: {peer:?}");

        let outcome = controller.handle(&mut conn);
        match &outcome {
            Ok(opcode) => log::debug!("{opcode:?} done"),
            Err(e) if e.is_protocol_error() => log::warn!("command rejected: {e}"),
            Err(e) => log::warn!("command abandoned: {e}"),
        }

        // One command per connection; dropping closes it
        drop(conn);
        log::info!("client disconnected");

        Served::Client { peer, outcome }
    }

    fn log_status<S: PixelSink>(&mut self, controller: &Controller<S>, now: Instant) {
        if now.saturating_duration_since(self.last_status) < self.config.status_interval {
            return;
        }
        self.last_status = now;
        log::info!(
            "mode {:?}, {}, {} frames stored",
            controller.mode(),
            if controller.scheduler().is_playing() {
                "animating"
            } else {
                "not animating"
            },
            controller.store().used_slots().count()
        );
    }
}
