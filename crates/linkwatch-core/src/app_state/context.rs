use log::{debug, info};

use crate::alarm::{AlarmMachine, AlarmUpdate, GlobalAlarm};
use crate::config::{ConfigError, MonitorConfig};
use crate::indicators::ConnectivityIndicator;
use crate::link_quality::AveragingMode;
use crate::registry::{DeviceId, DeviceRegistry};

/// What happened to one reported LQI sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Sender is not provisioned; sample dropped.
    UnknownSender,
    /// Known sender but LQI 0, i.e. no measurement; not tracked.
    NoMeasurement { index: usize },
    /// Sample accepted and the alarm machine re-evaluated.
    Tracked { index: usize, update: AlarmUpdate },
}

/// Mutable monitoring state owned by the coordinator.
///
/// Holds the device registry, the alarm machine with its global flags and
/// the monitoring/network switches. Nothing here is shared; the coordinator
/// loop is the only writer.
#[derive(Debug, Clone)]
pub struct MonitorContext {
    registry: DeviceRegistry,
    alarm: AlarmMachine,
    averaging: AveragingMode,
    monitoring_enabled: bool,
    network_online: bool,
}

impl MonitorContext {
    pub fn new(config: &MonitorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            registry: DeviceRegistry::new(&config.devices)?,
            alarm: AlarmMachine::new(config.lqi_threshold),
            averaging: config.averaging,
            monitoring_enabled: true,
            network_online: false,
        })
    }

    /// Route one LQI sample from `sender` through tracking and the alarm machine.
    pub fn ingest(&mut self, sender: &DeviceId, lqi: u8) -> IngestOutcome {
        let Some(index) = self.registry.find_by_identifier(sender) else {
            debug!("Ignoring sample from unprovisioned device {}", sender);
            return IngestOutcome::UnknownSender;
        };

        if !self.registry.get_mut(index).observe(lqi, self.averaging) {
            debug!("Device {} reported no LQI measurement", sender);
            return IngestOutcome::NoMeasurement { index };
        }

        let update = self.alarm.evaluate(&mut self.registry, index);
        IngestOutcome::Tracked { index, update }
    }

    /// User "silence" action; see [`AlarmMachine::silence`].
    pub fn silence(&mut self) -> Option<ConnectivityIndicator> {
        self.alarm.silence()
    }

    /// Flip the monitoring switch and return the new setting.
    pub fn toggle_monitoring(&mut self) -> bool {
        self.monitoring_enabled = !self.monitoring_enabled;
        info!(
            "Monitoring {}",
            if self.monitoring_enabled {
                "resumed"
            } else {
                "paused"
            }
        );
        self.monitoring_enabled
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn alarm(&self) -> &GlobalAlarm {
        self.alarm.global()
    }

    pub fn threshold(&self) -> u8 {
        self.alarm.threshold()
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring_enabled
    }

    pub fn network_online(&self) -> bool {
        self.network_online
    }

    pub fn set_network_online(&mut self, online: bool) {
        self.network_online = online;
    }
}
