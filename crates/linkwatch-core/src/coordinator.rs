//! Coordinator application state machine
//!
//! Sequences network bring-up, the one-shot post-bring-up report and the idle
//! loop that feeds inbound link-quality samples into tracking and dispatches
//! button events to user actions.
//!
//! Everything runs in a single task. [`Coordinator::step`] performs one
//! scheduling pass; [`Coordinator::run`] repeats it forever.

use embassy_time::Duration;
use embedded_hal::digital::InputPin;
use embedded_hal_async::delay::DelayNs;
use log::{Level, debug, error, info, log_enabled, warn};

use crate::app_state::{AppRunState, IngestOutcome, MonitorContext};
use crate::button::{ButtonEvents, Debouncer};
use crate::config::{ConfigError, MonitorConfig, NetworkConfig};
use crate::indicators::{ConnectivityIndicator, Indicators};
use crate::radio::{DecodedMessage, InfoMessage, Radio};

/// Pause between idle passes of [`Coordinator::run`].
const IDLE_POLL_MS: u32 = 2;

fn delay_ms(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}

pub struct Coordinator<'a, R, D, P, I> {
    run_state: AppRunState,
    context: MonitorContext,
    radio: R,
    delay: D,
    button: Debouncer<P>,
    indicators: I,
    button_events: &'a ButtonEvents,
    network: NetworkConfig,
    startup_retry: Duration,
    press_window: Duration,
    hold_window: Duration,
    bringup_attempts: u32,
}

impl<'a, R, D, P, I> Coordinator<'a, R, D, P, I>
where
    R: Radio,
    D: DelayNs,
    P: InputPin,
    I: Indicators,
{
    pub fn new(
        config: &MonitorConfig,
        radio: R,
        delay: D,
        button_pin: P,
        indicators: I,
        button_events: &'a ButtonEvents,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            run_state: AppRunState::Startup,
            context: MonitorContext::new(config)?,
            radio,
            delay,
            button: Debouncer::new(button_pin, config.button_poll_ms),
            indicators,
            button_events,
            network: config.network,
            startup_retry: config.startup_retry(),
            press_window: config.press_window(),
            hold_window: config.hold_window(),
            bringup_attempts: 0,
        })
    }

    /// Run the coordinator forever.
    pub async fn run(&mut self) -> ! {
        loop {
            self.step().await;
            if self.run_state == AppRunState::Idle {
                self.delay.delay_ms(IDLE_POLL_MS).await;
            }
        }
    }

    /// One scheduling pass of the state machine.
    pub async fn step(&mut self) {
        match self.run_state {
            AppRunState::Startup => {
                self.bring_up().await;
                self.run_state = AppRunState::DisplayInfo;
            }
            AppRunState::DisplayInfo => {
                self.display_info().await;
                self.run_state = AppRunState::Idle;
            }
            AppRunState::Idle => {
                self.service_inbound();
                self.service_button().await;
            }
        }

        self.indicators
            .set_alarm_indicator(self.context.alarm().is_annunciating());
    }

    /// Start the network, retrying with a fixed backoff until it comes up.
    async fn bring_up(&mut self) {
        info!("Starting network module");
        loop {
            self.bringup_attempts += 1;
            match self.radio.start_network(&self.network).await {
                Ok(()) => break,
                Err(e) => {
                    warn!(
                        "Network start attempt {} failed: {}. Retrying in {} ms",
                        self.bringup_attempts,
                        e,
                        self.startup_retry.as_millis()
                    );
                    self.delay.delay_ms(delay_ms(self.startup_retry)).await;
                }
            }
        }

        info!(
            "Network online after {} attempt(s)",
            self.bringup_attempts
        );
        self.context.set_network_online(true);
    }

    async fn display_info(&mut self) {
        match self.radio.network_info().await {
            Ok(net) => info!(
                "Network: PAN 0x{:04X}, extended PAN 0x{:016X}, channel {}",
                net.pan_id, net.extended_pan_id, net.channel
            ),
            Err(e) => error!("Network information unavailable: {}", e),
        }

        match self.radio.device_info().await {
            Ok(dev) => info!(
                "Coordinator {}: short address 0x{:04X}, parent 0x{:04X}, state {}",
                dev.identifier, dev.short_address, dev.parent_address, dev.device_state
            ),
            Err(e) => error!("Device information unavailable: {}", e),
        }

        if let Err(e) = self.radio.configure_outputs().await {
            error!("Failed to configure module outputs: {}", e);
        }

        info!(
            "Tracking {} device(s), alarm below LQI 0x{:02X}",
            self.context.registry().len(),
            self.context.threshold()
        );
        for (i, device) in self.context.registry().iter().enumerate() {
            info!("  [{}] {}", i, device.identifier());
        }
        info!("Displaying messages received");

        self.indicators
            .set_connectivity_indicator(ConnectivityIndicator::AllConnected);
    }

    /// Drain one inbound frame, if any, and feed it to tracking.
    fn service_inbound(&mut self) {
        if !self.context.network_online() || !self.radio.message_waiting() {
            return;
        }

        let message = match self.radio.receive_message() {
            Ok(message) => message,
            Err(e) => {
                debug!("Dropping frame: {}", e);
                return;
            }
        };

        if !self.context.monitoring_enabled() {
            debug!("Monitoring paused, discarding frame");
            return;
        }

        match message {
            DecodedMessage::Info(msg) => self.handle_info(&msg),
            DecodedMessage::DeviceAnnounce {
                identifier,
                short_address,
            } => info!(
                "Device announce: {} at short address 0x{:04X}",
                identifier, short_address
            ),
            DecodedMessage::Unrecognized { cluster, length } => {
                debug!("Ignoring frame for cluster 0x{:04X} ({} bytes)", cluster, length)
            }
        }
    }

    fn handle_info(&mut self, msg: &InfoMessage) {
        self.indicators.message_activity(true);

        info!(
            "From: {}, LQI={:02X}, {} KVPs received",
            msg.sender,
            msg.lqi,
            msg.observations.len()
        );
        for kvp in &msg.observations {
            debug!("    0x{:02X} = {}", kvp.key, kvp.value);
        }

        if let IngestOutcome::Tracked { update, .. } = self.context.ingest(&msg.sender, msg.lqi) {
            if let Some(mode) = update.indicator {
                self.indicators.set_connectivity_indicator(mode);
            }
            self.log_registry();
        }

        self.indicators.message_activity(false);
    }

    fn log_registry(&self) {
        if !log_enabled!(Level::Debug) {
            return;
        }
        for (i, device) in self.context.registry().iter().enumerate() {
            debug!(
                "[{}] {}: last {:02X}, window {:02X?}, average {:02X}, {:?}",
                i,
                device.identifier(),
                device.last_sample(),
                device.window().samples(),
                device.average(),
                device.state()
            );
        }
    }

    /// Debounce a pending button event into a press and/or a hold.
    async fn service_button(&mut self) {
        if !self.button_events.take_pending() {
            return;
        }

        if self
            .button
            .sample(&mut self.delay, delay_ms(self.press_window))
            .await
        {
            self.on_press();
        }
        if self
            .button
            .sample(&mut self.delay, delay_ms(self.hold_window))
            .await
        {
            self.on_hold();
        }
    }

    fn on_press(&mut self) {
        debug!("Button press");
        if let Some(mode) = self.context.silence() {
            self.indicators.set_connectivity_indicator(mode);
        }
    }

    fn on_hold(&mut self) {
        debug!("Button hold");
        let mode = if self.context.toggle_monitoring() {
            ConnectivityIndicator::MonitoringResumed
        } else {
            ConnectivityIndicator::MonitoringPaused
        };
        self.indicators.set_connectivity_indicator(mode);
    }

    pub fn run_state(&self) -> AppRunState {
        self.run_state
    }

    pub fn context(&self) -> &MonitorContext {
        &self.context
    }

    /// Bring-up attempts made so far, including the successful one.
    pub fn bringup_attempts(&self) -> u32 {
        self.bringup_attempts
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    pub fn delay(&self) -> &D {
        &self.delay
    }

    pub fn indicators(&self) -> &I {
        &self.indicators
    }
}
