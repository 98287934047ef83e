#[cfg(target_os = "espidf")]
fn main() {
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log::info!("Window Lights - ESP32");

    let config = window_lights::config::Config::default();
    if let Err(e) = window_lights::esp32::run(config) {
        log::error!("startup failed: {e}");
    }
    loop {
        esp_idf_svc::hal::delay::FreeRtos::delay_ms(1000);
    }
}

#[cfg(not(target_os = "espidf"))]
mod host {
    use std::time::Duration;

    use clap::Parser;
    use window_lights::PixelSink;
    use window_lights::config::{Config, DEFAULT_PORT};
    use window_lights::controller::Controller;
    use window_lights::mock::{RecordingSink, TerminalSink};
    use window_lights::server::{Server, ServerError};

    /// Serve the window lights protocol and render the strip in the terminal.
    #[derive(Parser, Debug)]
    pub struct Arguments {
        /// TCP port to listen on
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Per-payload socket timeout in milliseconds
        #[arg(long, default_value_t = 100)]
        timeout_ms: u64,

        /// Keep the strip in memory instead of drawing it
        #[arg(long)]
        quiet: bool,
    }

    pub fn run(args: Arguments) -> Result<(), ServerError> {
        let config = Config::default()
            .with_port(args.port)
            .with_socket_timeout(Duration::from_millis(args.timeout_ms));
        let mut server = Server::bind(config.clone())?;

        if args.quiet {
            serve(&mut server, RecordingSink::headless(), &config)
        } else {
            serve(&mut server, TerminalSink::new(), &config)
        }
    }

    fn serve<S: PixelSink>(server: &mut Server, sink: S, config: &Config) -> ! {
        let mut controller = Controller::new(sink, config);
        if let Err(e) = controller.blank() {
            log::warn!("failed to blank strip: {e}");
        }
        server.run(&mut controller)
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    use clap::Parser;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Window Lights - simulator");

    if let Err(e) = host::run(host::Arguments::parse()) {
        log::error!("{e}");
        std::process::exit(1);
    }
}
