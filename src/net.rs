//! WiFi link and ThingsBoard MQTT session on esp-radio + embassy-net.

use core::net::Ipv4Addr;

use embassy_net::{
    Config as NetConfig, IpAddress, Ipv4Address, Runner, Stack, StackResources,
    dns::DnsQueryType, tcp::TcpSocket,
};
use embassy_time::{Duration, Instant};
use embedded_io_async::{ErrorKind, ErrorType, Read, Write as IoWrite};
use esp_radio::wifi::{ClientConfig, ModeConfig, WifiController, WifiDevice};
use log::{error, info, warn};
use rust_mqtt::client::client::MqttClient;
use rust_mqtt::client::client_config::{ClientConfig as MqttConfig, MqttVersion};
use rust_mqtt::packet::v5::publish_packet::QualityOfService;
use rust_mqtt::packet::v5::reason_codes::ReasonCode;
use rust_mqtt::utils::rng_generator::CountingRng;

use crate::config::{
    BrokerEndpoint, MAX_MESSAGE_RECEIVE_SIZE, MAX_MESSAGE_SEND_SIZE, WifiCredentials,
};
use crate::error::Error;
use crate::thingsboard::{TELEMETRY_TOPIC, telemetry_payload};
use crate::traits::{Broker, Session, WifiLink};

const TCP_BUFFER_SIZE: usize = 1024;
const TCP_TIMEOUT_SECS: u64 = 10;
const MQTT_MAX_PROPERTIES: usize = 5;

// ----------------------------------------------------------------------------
// WiFi
// ----------------------------------------------------------------------------

/// Station-mode link. "Connected" means associated *and* holding a DHCP lease.
pub struct EspWifi {
    controller: WifiController<'static>,
    stack: Stack<'static>,
}

impl EspWifi {
    pub fn new(controller: WifiController<'static>, stack: Stack<'static>) -> Self {
        Self { controller, stack }
    }

    pub fn stack(&self) -> Stack<'static> {
        self.stack
    }
}

/// Bring up the radio in station mode and a DHCP network stack on top of it.
///
/// The returned runner must be spawned for the stack to make progress.
pub fn init_wifi(
    radio: &'static esp_radio::Controller<'static>,
    wifi: esp_hal::peripherals::WIFI<'static>,
    resources: &'static mut StackResources<3>,
    seed: u64,
) -> Result<(EspWifi, Runner<'static, WifiDevice<'static>>), Error> {
    let (controller, interfaces) =
        esp_radio::wifi::new(radio, wifi, esp_radio::wifi::Config::default()).map_err(|e| {
            error!("wifi: new() failed: {e:?}");
            Error::WifiStart
        })?;

    let (stack, runner) = embassy_net::new(
        interfaces.sta,
        NetConfig::dhcpv4(Default::default()),
        resources,
        seed,
    );
    info!("network: embassy-net stack initialized with DHCP");

    Ok((EspWifi::new(controller, stack), runner))
}

impl WifiLink for EspWifi {
    fn begin(&mut self, credentials: &WifiCredentials) -> Result<(), Error> {
        let client = ClientConfig::default()
            .with_ssid(credentials.ssid.into())
            .with_password(credentials.password.into());

        self.controller
            .set_config(&ModeConfig::Client(client))
            .map_err(|e| {
                error!("wifi: set_config failed: {e:?}");
                Error::WifiStart
            })?;
        self.controller.start().map_err(|e| {
            error!("wifi: start failed: {e:?}");
            Error::WifiStart
        })?;
        info!("wifi: started STA mode");

        self.controller.connect().map_err(|e| {
            error!("wifi: connect failed: {e:?}");
            Error::WifiConnect
        })
    }

    fn is_connected(&mut self) -> bool {
        self.controller.is_connected().unwrap_or(false) && self.stack.is_config_up()
    }

    fn reconnect(&mut self) -> Result<(), Error> {
        let _ = self.controller.disconnect();
        self.controller.connect().map_err(|e| {
            warn!("wifi: reconnect failed: {e:?}");
            Error::WifiConnect
        })
    }

    fn local_ip(&self) -> Option<Ipv4Addr> {
        self.stack.config_v4().map(|config| config.address.address())
    }
}

// ----------------------------------------------------------------------------
// rust-mqtt transport adapter
// ----------------------------------------------------------------------------

#[derive(Debug)]
pub struct TransportError(pub embassy_net::tcp::Error);

impl embedded_io_async::Error for TransportError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::ConnectionReset
    }
}

/// Wraps an embassy-net TCP socket for rust-mqtt.
pub struct EmbassyNetTransport<'a> {
    socket: TcpSocket<'a>,
}

impl<'a> EmbassyNetTransport<'a> {
    pub fn new(socket: TcpSocket<'a>) -> Self {
        Self { socket }
    }
}

impl ErrorType for EmbassyNetTransport<'_> {
    type Error = TransportError;
}

impl Read for EmbassyNetTransport<'_> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.socket.read(buf).await.map_err(TransportError)
    }
}

impl IoWrite for EmbassyNetTransport<'_> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.socket.write(buf).await.map_err(TransportError)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        self.socket.flush().await.map_err(TransportError)
    }
}

/// MQTT v5 CONNACK reason code byte.
pub fn connack_code(reason: &ReasonCode) -> u8 {
    match *reason {
        ReasonCode::Success => 0x00,
        ReasonCode::UnspecifiedError => 0x80,
        ReasonCode::MalformedPacket => 0x81,
        ReasonCode::ProtocolError => 0x82,
        ReasonCode::ImplementationSpecificError => 0x83,
        ReasonCode::UnsupportedProtocolVersion => 0x84,
        ReasonCode::ClientIdNotValid => 0x85,
        ReasonCode::BadUserNameOrPassword => 0x86,
        ReasonCode::NotAuthorized => 0x87,
        ReasonCode::ServerUnavailable => 0x88,
        ReasonCode::ServerBusy => 0x89,
        ReasonCode::Banned => 0x8A,
        ReasonCode::PacketTooLarge => 0x95,
        ReasonCode::QuotaExceeded => 0x97,
        ReasonCode::ConnectionRateExceeded => 0x9F,
        _ => 0x80,
    }
}

// ----------------------------------------------------------------------------
// ThingsBoard broker
// ----------------------------------------------------------------------------

/// Owns every buffer a session needs; a session borrows them for its
/// lifetime, so reconnecting reuses the same memory.
pub struct ThingsBoardBroker {
    stack: Stack<'static>,
    tcp_rx: [u8; TCP_BUFFER_SIZE],
    tcp_tx: [u8; TCP_BUFFER_SIZE],
    mqtt_rx: [u8; MAX_MESSAGE_RECEIVE_SIZE],
    mqtt_tx: [u8; MAX_MESSAGE_SEND_SIZE],
}

impl ThingsBoardBroker {
    pub const fn new(stack: Stack<'static>) -> Self {
        Self {
            stack,
            tcp_rx: [0; TCP_BUFFER_SIZE],
            tcp_tx: [0; TCP_BUFFER_SIZE],
            mqtt_rx: [0; MAX_MESSAGE_RECEIVE_SIZE],
            mqtt_tx: [0; MAX_MESSAGE_SEND_SIZE],
        }
    }
}

/// Resolve the broker host; literal IPv4 addresses skip DNS.
pub async fn resolve(stack: Stack<'static>, host: &str) -> Result<IpAddress, Error> {
    if let Ok(ip) = host.parse::<Ipv4Address>() {
        return Ok(IpAddress::Ipv4(ip));
    }

    let addrs = stack
        .dns_query(host, DnsQueryType::A)
        .await
        .map_err(|e| {
            error!("mqtt: DNS resolution of '{host}' failed: {e:?}");
            Error::Dns
        })?;
    addrs.first().copied().ok_or(Error::Dns)
}

impl Broker for ThingsBoardBroker {
    type Session<'a>
        = MqttSession<'a>
    where
        Self: 'a;

    async fn connect(&mut self, endpoint: &BrokerEndpoint) -> Result<MqttSession<'_>, Error> {
        let address = resolve(self.stack, endpoint.host).await?;

        let mut socket = TcpSocket::new(self.stack, &mut self.tcp_rx, &mut self.tcp_tx);
        socket.set_timeout(Some(Duration::from_secs(TCP_TIMEOUT_SECS)));
        info!("mqtt: connecting TCP to {}:{}", address, endpoint.port);
        socket.connect((address, endpoint.port)).await.map_err(|e| {
            error!("mqtt: TCP connection failed: {e:?}");
            Error::Tcp
        })?;

        // ThingsBoard authenticates with the device token as username and
        // no password.
        let mut config: MqttConfig<'_, MQTT_MAX_PROPERTIES, CountingRng> =
            MqttConfig::new(MqttVersion::MQTTv5, CountingRng(20_000));
        config.add_client_id(endpoint.client_id);
        config.add_username(endpoint.token);
        config.keep_alive = endpoint.keep_alive_secs;

        let mut client = MqttClient::<_, MQTT_MAX_PROPERTIES, _>::new(
            EmbassyNetTransport::new(socket),
            &mut self.mqtt_tx,
            MAX_MESSAGE_SEND_SIZE,
            &mut self.mqtt_rx,
            MAX_MESSAGE_RECEIVE_SIZE,
            config,
        );

        client.connect_to_broker().await.map_err(|reason| {
            error!("mqtt: CONNECT refused: {reason:?}");
            Error::MqttConnect(connack_code(&reason))
        })?;

        Ok(MqttSession {
            client,
            connected: true,
            last_activity: Instant::now(),
            keep_alive: Duration::from_secs(u64::from(endpoint.keep_alive_secs)),
        })
    }
}

pub struct MqttSession<'a> {
    client: MqttClient<'a, EmbassyNetTransport<'a>, MQTT_MAX_PROPERTIES, CountingRng>,
    connected: bool,
    last_activity: Instant,
    keep_alive: Duration,
}

impl Session for MqttSession<'_> {
    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn publish_telemetry(&mut self, key: &str, value: f32) -> Result<(), Error> {
        let payload = telemetry_payload(key, value)?;

        match self
            .client
            .send_message(
                TELEMETRY_TOPIC,
                payload.as_bytes(),
                QualityOfService::QoS0,
                false,
            )
            .await
        {
            // Published, nobody subscribed. Still a success for us.
            Ok(()) | Err(ReasonCode::NoMatchingSubscribers) => {
                self.last_activity = Instant::now();
                Ok(())
            }
            Err(e) => {
                error!("mqtt: publish of {key} failed: {e:?}");
                self.connected = false;
                Err(Error::Publish)
            }
        }
    }

    /// Sends a PINGREQ once half the keep-alive has passed without traffic.
    ///
    /// The socket is not read here, so a connection the broker closes is only
    /// noticed when the next publish or ping fails: within one telemetry
    /// interval while readings flow, or half the keep-alive (30 s) when idle.
    /// Until then `is_connected` stays true and readings are offered to a
    /// dead session; the failed publish drops it and the supervisor
    /// reconnects.
    async fn poll(&mut self) -> Result<(), Error> {
        if self.last_activity.elapsed() < self.keep_alive / 2 {
            return Ok(());
        }

        match self.client.send_ping().await {
            Ok(()) => {
                self.last_activity = Instant::now();
                Ok(())
            }
            Err(e) => {
                warn!("mqtt: keep-alive ping failed: {e:?}");
                self.connected = false;
                Err(Error::Disconnected)
            }
        }
    }
}
