// Broker-Client - ThingsBoard Device API über MQTT (rust-mqtt)
use defmt::{Debug2Format, debug, info, warn};
use embassy_net::{IpAddress, Stack, dns::DnsQueryType, tcp::TcpSocket};
use embassy_time::{Duration, Instant, with_timeout};

use rust_mqtt::client::client::MqttClient;
use rust_mqtt::client::client_config::{ClientConfig, MqttVersion};
use rust_mqtt::packet::v5::publish_packet::QualityOfService;
use rust_mqtt::packet::v5::reason_codes::ReasonCode;
use rust_mqtt::utils::rng_generator::CountingRng;
use rust_mqtt::utils::types::EncodedString;

use espresso_core::protocol::parse_rpc_request;
use espresso_core::{Broker, RpcRequest, Session, SessionError, SessionParams, SubscribeError};

use crate::config::*;

/// Maximale Anzahl MQTT v5 Properties pro Paket
const MAX_PROPERTIES: usize = 5;

type Client<'s> = MqttClient<'s, TcpSocket<'s>, MAX_PROPERTIES, CountingRng>;

/// Puffer für eine Session (TCP + MQTT)
///
/// Liegen statisch, damit die Session sie nur ausleihen muss.
pub struct SessionBuffers {
    tcp_rx: [u8; TCP_RX_BUFFER_SIZE],
    tcp_tx: [u8; TCP_TX_BUFFER_SIZE],
    mqtt_tx: [u8; MAX_MESSAGE_SIZE],
    mqtt_rx: [u8; MAX_MESSAGE_SIZE],
}

impl SessionBuffers {
    pub const fn new() -> Self {
        Self {
            tcp_rx: [0; TCP_RX_BUFFER_SIZE],
            tcp_tx: [0; TCP_TX_BUFFER_SIZE],
            mqtt_tx: [0; MAX_MESSAGE_SIZE],
            mqtt_rx: [0; MAX_MESSAGE_SIZE],
        }
    }
}

impl Default for SessionBuffers {
    fn default() -> Self {
        Self::new()
    }
}

/// Broker-Client: öffnet Sessions auf dem embassy-net Stack
pub struct TbBroker {
    stack: Stack<'static>,
    buffers: &'static mut SessionBuffers,
}

impl TbBroker {
    pub fn new(stack: Stack<'static>, buffers: &'static mut SessionBuffers) -> Self {
        Self { stack, buffers }
    }
}

impl Broker for TbBroker {
    type Session<'s>
        = TbSession<'s>
    where
        Self: 's;

    /// Verbindet mit dem Broker
    ///
    /// 1. DNS-Auflösung des Hostnames
    /// 2. TCP-Verbindung aufbauen
    /// 3. MQTT CONNECT mit dem Token als Username
    async fn open(
        &mut self,
        params: &SessionParams<'static>,
    ) -> Result<Self::Session<'_>, SessionError> {
        let stack = self.stack;
        let port = params.port_or_default();

        info!("Broker: Resolving '{}'...", params.server);
        let address = resolve_hostname(stack, params.server).await?;
        info!("Broker: Resolved to {}", Debug2Format(&address));

        let SessionBuffers {
            tcp_rx,
            tcp_tx,
            mqtt_tx,
            mqtt_rx,
        } = &mut *self.buffers;

        let mut socket = TcpSocket::new(stack, tcp_rx, tcp_tx);
        socket.set_timeout(Some(Duration::from_secs(TCP_TIMEOUT_SECS)));
        if let Err(e) = socket.connect((address, port)).await {
            warn!("Broker: TCP connect to port {} failed: {}", port, Debug2Format(&e));
            return Err(SessionError::Unreachable);
        }
        debug!("Broker: TCP connected");

        let mut config =
            ClientConfig::<MAX_PROPERTIES, _>::new(MqttVersion::MQTTv5, CountingRng(20000));
        config.client_id = EncodedString {
            string: TB_CLIENT_ID,
            len: TB_CLIENT_ID.len() as u16,
        };
        config.add_username(params.token);
        config.keep_alive = MQTT_KEEP_ALIVE_SECS;
        config.max_packet_size = MAX_MESSAGE_SIZE as u32;

        let mut client = MqttClient::<_, MAX_PROPERTIES, _>::new(
            socket,
            mqtt_tx,
            MAX_MESSAGE_SIZE,
            mqtt_rx,
            MAX_MESSAGE_SIZE,
            config,
        );

        match client.connect_to_broker().await {
            Ok(()) => Ok(TbSession {
                client,
                connected: true,
                last_sent: Instant::now(),
            }),
            Err(ReasonCode::NotAuthorized | ReasonCode::BadUserNameOrPassword) => {
                warn!("Broker: Token rejected");
                Err(SessionError::Rejected)
            }
            Err(e) => {
                warn!("Broker: CONNECT failed: {}", Debug2Format(&e));
                Err(SessionError::Protocol)
            }
        }
    }
}

/// Offene MQTT-Session
///
/// Leiht sich Socket- und MQTT-Puffer vom [`TbBroker`]. Nach einem
/// Verbindungsfehler meldet `is_connected()` dauerhaft `false`, die Schleife
/// verwirft die Session dann und öffnet eine neue.
pub struct TbSession<'s> {
    client: Client<'s>,
    connected: bool,
    last_sent: Instant,
}

impl TbSession<'_> {
    fn lost(&mut self, e: ReasonCode) -> SessionError {
        warn!("Broker: Connection lost: {}", Debug2Format(&e));
        self.connected = false;
        SessionError::Transport
    }

    /// PINGREQ wenn seit der halben Keep-Alive-Zeit nichts gesendet wurde
    ///
    /// Nur aufrufen, wenn der Empfangspuffer leer ist: `send_ping` wartet auf
    /// PINGRESP und verwirft alles, was vorher eintrifft.
    async fn keep_alive(&mut self) -> Result<(), SessionError> {
        let interval = Duration::from_secs(MQTT_KEEP_ALIVE_SECS as u64 / 2);
        if self.last_sent.elapsed() < interval {
            return Ok(());
        }
        match self.client.send_ping().await {
            Ok(()) => {
                self.last_sent = Instant::now();
                Ok(())
            }
            // Anderes Paket vor dem PINGRESP, die Verbindung steht noch
            Err(ReasonCode::ImplementationSpecificError) => {
                warn!("Broker: Packet arrived before PINGRESP, dropped");
                self.last_sent = Instant::now();
                Ok(())
            }
            Err(e) => Err(self.lost(e)),
        }
    }
}

impl Session for TbSession<'_> {
    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn subscribe(&mut self, filter: &str) -> Result<(), SubscribeError> {
        if !self.connected {
            return Err(SubscribeError::Session(SessionError::NotConnected));
        }
        match self.client.subscribe_to_topic(filter).await {
            Ok(()) => {
                self.last_sent = Instant::now();
                Ok(())
            }
            Err(ReasonCode::NetworkError) => {
                Err(SubscribeError::Session(self.lost(ReasonCode::NetworkError)))
            }
            Err(e) => {
                warn!("Broker: SUBSCRIBE '{}' rejected: {}", filter, Debug2Format(&e));
                Err(SubscribeError::Rejected)
            }
        }
    }

    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), SessionError> {
        if !self.connected {
            return Err(SessionError::NotConnected);
        }
        match self
            .client
            .send_message(topic, payload, QualityOfService::QoS0, false)
            .await
        {
            Ok(()) => {
                self.last_sent = Instant::now();
                Ok(())
            }
            Err(e) => Err(self.lost(e)),
        }
    }

    async fn poll(&mut self) -> Result<Option<RpcRequest>, SessionError> {
        if !self.connected {
            return Err(SessionError::NotConnected);
        }
        // Liest nur, wenn bereits Daten anliegen: ein abgebrochener Lesevorgang
        // mitten im Paket würde den MQTT-Stream zerstören
        let received = self
            .client
            .receive_message_if_ready()
            .await
            .map(|message| message.map(|(topic, payload)| parse_rpc_request(topic, payload)));

        match received {
            Ok(Some(Ok(request))) => Ok(Some(request)),
            Ok(Some(Err(e))) => {
                debug!("Broker: Ignoring message: {}", e);
                Ok(None)
            }
            Ok(None) => {
                self.keep_alive().await?;
                Ok(None)
            }
            // Verspätetes PINGRESP oder anderes Steuerpaket
            Err(ReasonCode::ImplementationSpecificError) => {
                debug!("Broker: Ignoring control packet");
                Ok(None)
            }
            Err(e) => Err(self.lost(e)),
        }
    }
}

/// Löst Hostname zu IPv4-Adresse auf
///
/// Nutzt embassy-net DNS-Stack mit konfigurierbarem Timeout.
async fn resolve_hostname(
    stack: Stack<'static>,
    hostname: &str,
) -> Result<embassy_net::Ipv4Address, SessionError> {
    let result = with_timeout(
        Duration::from_secs(DNS_TIMEOUT_SECS),
        stack.dns_query(hostname, DnsQueryType::A),
    )
    .await;

    match result {
        Ok(Ok(addrs)) => addrs
            .iter()
            .find_map(|addr| match addr {
                IpAddress::Ipv4(ipv4) => Some(*ipv4),
                #[allow(unreachable_patterns)]
                _ => None,
            })
            .ok_or(SessionError::Unreachable),
        Ok(Err(e)) => {
            warn!("Broker: DNS failed: {}", Debug2Format(&e));
            Err(SessionError::Unreachable)
        }
        Err(_) => {
            warn!("Broker: DNS timeout");
            Err(SessionError::Unreachable)
        }
    }
}
