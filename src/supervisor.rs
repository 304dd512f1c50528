//! Connectivity supervisor.
//!
//! Keeps the WiFi link and the broker session alive and publishes whatever
//! the telemetry task hands over. Each step returns the delay to wait before
//! the next one; the caller does the waiting, so the whole state machine can
//! be driven step by step without a clock.

use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;
use log::{error, info, warn};

use crate::config::{Config, delay_ms};
use crate::handoff::Handoff;
use crate::model::Reading;
use crate::traits::{Broker, Session, WifiLink};

/// Link states as seen by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No network association.
    Disconnected,
    /// Network up, no broker session.
    NetworkOnly,
    /// Network and broker session up.
    Online,
}

/// Result of one startup association poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Association {
    /// Not associated yet; poll again after the delay.
    Pending(Duration),
    Connected,
    /// Attempt budget spent. Startup carries on regardless.
    TimedOut,
}

pub struct Supervisor<'c> {
    config: &'c Config,
    state: LinkState,
    attempts: u8,
}

impl<'c> Supervisor<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self {
            config,
            state: LinkState::Disconnected,
            attempts: 0,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Start the one-off startup association. A failure here is logged and
    /// left for the polling and the steady-state loop to deal with.
    pub fn begin_association<W: WifiLink>(&mut self, wifi: &mut W) {
        info!("supervisor: connecting to WiFi '{}'", self.config.wifi.ssid);
        self.attempts = 0;
        if let Err(e) = wifi.begin(&self.config.wifi) {
            error!("supervisor: {e}");
        }
    }

    pub fn poll_association<W: WifiLink>(&mut self, wifi: &mut W) -> Association {
        if wifi.is_connected() {
            self.state = LinkState::NetworkOnly;
            match wifi.local_ip() {
                Some(ip) => info!("supervisor: connected to WiFi, IP address {ip}"),
                None => info!("supervisor: connected to WiFi"),
            }
            return Association::Connected;
        }

        let timing = &self.config.timing;
        if self.attempts >= timing.association_attempts {
            let waited = timing.association_poll * u32::from(timing.association_attempts);
            warn!(
                "supervisor: failed to connect to WiFi after {} s",
                waited.as_secs()
            );
            return Association::TimedOut;
        }

        self.attempts += 1;
        Association::Pending(timing.association_poll)
    }

    /// Bounded startup association. Returns whether the link came up.
    pub async fn associate<W, P>(&mut self, wifi: &mut W, delay: &mut P) -> bool
    where
        W: WifiLink,
        P: DelayNs,
    {
        self.begin_association(wifi);
        loop {
            match self.poll_association(wifi) {
                Association::Pending(wait) => wait_for(delay, wait).await,
                Association::Connected => return true,
                Association::TimedOut => return false,
            }
        }
    }

    /// One pass while no broker session exists.
    ///
    /// Returns the new session, or the delay before the next attempt. The
    /// broker is never tried while the network is down.
    pub async fn step_offline<'b, W, B>(
        &mut self,
        wifi: &mut W,
        broker: &'b mut B,
    ) -> Result<B::Session<'b>, Duration>
    where
        W: WifiLink,
        B: Broker,
    {
        if !wifi.is_connected() {
            warn!("supervisor: WiFi disconnected, attempting to reconnect");
            if let Err(e) = wifi.reconnect() {
                warn!("supervisor: {e}");
            }
            self.state = LinkState::Disconnected;
            return Err(self.config.timing.wifi_retry);
        }

        self.state = LinkState::NetworkOnly;
        let endpoint = &self.config.broker;
        info!(
            "supervisor: connecting to broker ({}:{}) with token ({})",
            endpoint.host, endpoint.port, endpoint.token
        );
        match broker.connect(endpoint).await {
            Ok(session) => {
                info!("supervisor: connected to broker");
                self.state = LinkState::Online;
                Ok(session)
            }
            Err(e) => {
                error!("supervisor: failed to connect to broker: {e}");
                Err(self.config.timing.broker_retry)
            }
        }
    }

    /// One pass with a session: publish the pending reading, then service
    /// the session once.
    ///
    /// Returns `None` once the session has gone away.
    pub async fn step_online<S: Session>(
        &mut self,
        session: &mut S,
        handoff: &Handoff,
    ) -> Option<Duration> {
        if !session.is_connected() {
            warn!("supervisor: broker session lost");
            self.state = LinkState::NetworkOnly;
            return None;
        }

        if let Some(reading) = handoff.take() {
            publish_reading(session, &reading).await;
        }

        if let Err(e) = session.poll().await {
            warn!("supervisor: broker loop: {e}");
        }
        Some(self.config.timing.service_period)
    }

    /// Connectivity task body, after association. Never returns.
    pub async fn run<W, B, P>(
        &mut self,
        wifi: &mut W,
        broker: &mut B,
        handoff: &Handoff,
        delay: &mut P,
    ) -> !
    where
        W: WifiLink,
        B: Broker,
        P: DelayNs,
    {
        loop {
            match self.step_offline(wifi, broker).await {
                Ok(mut session) => {
                    handoff.set_broker_up(true);
                    while let Some(wait) = self.step_online(&mut session, handoff).await {
                        wait_for(delay, wait).await;
                    }
                    handoff.set_broker_up(false);
                    handoff.discard();
                }
                Err(wait) => wait_for(delay, wait).await,
            }
        }
    }
}

/// Send both points of a reading independently. A failed point is logged
/// and not retried. Returns how many points went out.
pub async fn publish_reading<S: Session>(session: &mut S, reading: &Reading) -> usize {
    info!("supervisor: sending data to broker");
    let mut sent = 0;
    for (key, value) in reading.points() {
        match session.publish_telemetry(key, value).await {
            Ok(()) => {
                info!("supervisor: {key} sent");
                sent += 1;
            }
            Err(e) => warn!("supervisor: failed to send {key}: {e}"),
        }
    }
    sent
}

async fn wait_for<P: DelayNs>(delay: &mut P, wait: Duration) {
    delay.delay_ms(delay_ms(wait)).await;
}
