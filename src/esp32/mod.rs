mod display;
mod wifi;

pub use display::{Esp32StripSink, LedDisplayError};
pub use wifi::WifiError;

use std::convert::Infallible;

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sys::EspError;

use crate::config::Config;
use crate::controller::Controller;
use crate::geometry::PIXEL_COUNT;
use crate::server::{Server, ServerError};

/// Error types for firmware start-up.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("peripheral setup failed: {0}")]
    Esp(#[from] EspError),
    #[error(transparent)]
    Wifi(#[from] WifiError),
    #[error(transparent)]
    Display(#[from] LedDisplayError),
    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Bring up Wi-Fi and the strip, then serve clients forever.
///
/// The strip data line is on GPIO2.
pub fn run(config: Config) -> Result<Infallible, StartupError> {
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // Keep the driver alive for as long as the loop runs
    let _wifi = wifi::connect(peripherals.modem, sysloop, nvs)?;

    let sink = Esp32StripSink::new(peripherals.rmt.channel0, peripherals.pins.gpio2)?;
    let mut controller = Controller::new(sink, &config);
    controller.blank()?;
    log::info!("setup finished, {PIXEL_COUNT} pixels");

    let mut server = Server::bind(config)?;
    server.run(&mut controller)
}
