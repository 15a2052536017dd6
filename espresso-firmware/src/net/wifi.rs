// WiFi Link - Verbindet mit WLAN und meldet den Link-Zustand an die Schleife
use defmt::{Debug2Format, error, info, warn};
use embassy_net::{Runner, Stack};
use embassy_time::{Duration, with_timeout};
use esp_radio::wifi::{ClientConfig, ModeConfig, WifiController, WifiDevice};
use espresso_core::{Link, LinkError};

use crate::config::{DHCP_TIMEOUT_SECS, WIFI_PASSWORD, WIFI_SSID};

/// WLAN-Link über esp-radio und embassy-net
///
/// Der Link gilt als benutzbar, wenn der Controller mit dem AP verbunden ist
/// und DHCP eine IPv4-Adresse vergeben hat. Reconnects steuert die Schleife
/// über [`Link::join`], es gibt keinen eigenen Connection-Task mehr.
pub struct WifiLink {
    controller: WifiController<'static>,
    stack: Stack<'static>,
}

impl WifiLink {
    pub fn new(controller: WifiController<'static>, stack: Stack<'static>) -> Self {
        Self { controller, stack }
    }

    pub fn stack(&self) -> Stack<'static> {
        self.stack
    }

    /// Konfiguriert und startet den Controller im Station-Modus (einmalig)
    async fn ensure_started(&mut self) -> Result<(), LinkError> {
        if matches!(self.controller.is_started(), Ok(true)) {
            return Ok(());
        }

        info!("WiFi: Configuring and starting...");
        let client_config = ModeConfig::Client(
            ClientConfig::default()
                .with_ssid(WIFI_SSID.into())
                .with_password(WIFI_PASSWORD.into()),
        );

        if let Err(e) = self.controller.set_config(&client_config) {
            error!("WiFi: Failed to set configuration: {}", Debug2Format(&e));
            return Err(LinkError::Driver);
        }
        if let Err(e) = self.controller.start_async().await {
            error!("WiFi: Failed to start: {}", Debug2Format(&e));
            return Err(LinkError::Driver);
        }

        info!("WiFi: Started successfully");
        Ok(())
    }

    fn is_associated(&self) -> bool {
        matches!(self.controller.is_connected(), Ok(true))
    }
}

impl Link for WifiLink {
    fn is_up(&self) -> bool {
        self.is_associated() && self.stack.is_link_up() && self.stack.config_v4().is_some()
    }

    async fn join(&mut self) -> Result<(), LinkError> {
        self.ensure_started().await?;

        if !self.is_associated() {
            info!("WiFi: Connecting to '{}'...", WIFI_SSID);
            if let Err(e) = self.controller.connect_async().await {
                warn!("WiFi: Connection failed: {}", Debug2Format(&e));
                return Err(LinkError::AssociationFailed);
            }
            info!("WiFi: Associated, waiting for IP address...");
        }

        // Ohne IP bleibt is_up() false, die Schleife versucht es erneut
        let dhcp = with_timeout(
            Duration::from_secs(DHCP_TIMEOUT_SECS),
            self.stack.wait_config_up(),
        )
        .await;
        match (dhcp, self.stack.config_v4()) {
            (Ok(()), Some(config)) => {
                info!("WiFi: Got IP address!");
                info!("  IP:      {}", Debug2Format(&config.address.address()));
                info!("  Gateway: {}", Debug2Format(&config.gateway));
            }
            _ => warn!("WiFi: No IP address after {}s", DHCP_TIMEOUT_SECS),
        }
        Ok(())
    }
}

/// Network Task
///
/// Überwacht den Netzwerk-Stack:
/// - Prozessiert Netzwerk-Pakete
/// - Managed TCP/IP Stack und DHCP
#[embassy_executor::task]
pub async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}
