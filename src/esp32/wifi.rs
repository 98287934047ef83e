use embedded_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::modem::Modem;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sys::EspError;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

/// Network name, baked in at build time
const SSID: &str = match option_env!("WINDOWLIGHTS_SSID") {
    Some(ssid) => ssid,
    None => "",
};

/// Network password, baked in at build time; empty for open networks
const PASSWORD: &str = match option_env!("WINDOWLIGHTS_PASSWORD") {
    Some(password) => password,
    None => "",
};

/// Error types for Wi-Fi bring-up.
#[derive(Debug, thiserror::Error)]
pub enum WifiError {
    #[error("WINDOWLIGHTS_SSID was not set at build time")]
    MissingSsid,
    #[error("Wi-Fi credentials too long")]
    CredentialsTooLong,
    #[error("Wi-Fi driver error: {0}")]
    Driver(#[from] EspError),
}

/// Join the configured network as a station and wait for an address.
pub fn connect(
    modem: Modem,
    sysloop: EspSystemEventLoop,
    nvs: EspDefaultNvsPartition,
) -> Result<BlockingWifi<EspWifi<'static>>, WifiError> {
    if SSID.is_empty() {
        return Err(WifiError::MissingSsid);
    }

    let mut wifi = BlockingWifi::wrap(EspWifi::new(modem, sysloop.clone(), Some(nvs))?, sysloop)?;
    wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        ssid: SSID.try_into().map_err(|_| WifiError::CredentialsTooLong)?,
        password: PASSWORD
            .try_into()
            .map_err(|_| WifiError::CredentialsTooLong)?,
        auth_method: if PASSWORD.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        },
        ..Default::default()
    }))?;

    wifi.start()?;
    log::info!("connecting to {SSID}");
    wifi.connect()?;
    wifi.wait_netif_up()?;

    let ip_info = wifi.wifi().sta_netif().get_ip_info()?;
    log::info!("finished waiting for wifi, address {}", ip_info.ip);
    Ok(wifi)
}
