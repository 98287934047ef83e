use std::time::Duration;

use thiserror::Error;

/// TCP port clients connect to
pub const DEFAULT_PORT: u16 = 42069;

/// How long a command may take to deliver each payload
pub const DEFAULT_SOCKET_TIMEOUT: Duration = Duration::from_millis(100);

/// Runtime settings for the controller and its control loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Port the listener binds on all interfaces.
    pub port: u16,
    /// Upper bound on each payload wait inside a command.
    pub socket_timeout: Duration,
    /// Back-off while a partial payload is buffered.
    pub poll_interval: Duration,
    /// Pause between control loop iterations when no client is pending.
    pub idle_pause: Duration,
    /// How often the control loop logs its status.
    pub status_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            socket_timeout: DEFAULT_SOCKET_TIMEOUT,
            poll_interval: Duration::from_millis(1),
            idle_pause: Duration::from_millis(1),
            status_interval: Duration::from_secs(30),
        }
    }
}

/// Rejected configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("socket timeout must be greater than zero")]
    ZeroTimeout,
    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,
    #[error("poll interval {poll:?} exceeds socket timeout {timeout:?}")]
    PollExceedsTimeout { poll: Duration, timeout: Duration },
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.socket_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.poll_interval > self.socket_timeout {
            return Err(ConfigError::PollExceedsTimeout {
                poll: self.poll_interval,
                timeout: self.socket_timeout,
            });
        }
        Ok(())
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_socket_timeout(mut self, timeout: Duration) -> Self {
        self.socket_timeout = timeout;
        self
    }
}
