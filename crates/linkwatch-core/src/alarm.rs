//! Per-device connectivity alarm
//!
//! Each device is classified `Connected` or `Lost` from its averaged LQI.
//! A device is only declared lost once its averaging window is full, and it
//! only recovers when the average rises strictly above the threshold, so a
//! device sitting exactly on the threshold keeps whatever state it is in.
//!
//! The system-wide alarm sounds while any device is lost and clears once every
//! provisioned device is connected again. Silencing suppresses annunciation
//! without touching per-device state.

use log::{debug, info, warn};

use crate::indicators::ConnectivityIndicator;
use crate::registry::DeviceRegistry;

/// Default alarm threshold on the 0-255 LQI scale.
pub const DEFAULT_LQI_THRESHOLD: u8 = 0x50;

/// Connectivity classification of a single device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    #[default]
    Connected,
    Lost,
}

/// Cross-device alarm flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlobalAlarm {
    sounding: bool,
    silenced: bool,
}

impl GlobalAlarm {
    pub fn is_sounding(&self) -> bool {
        self.sounding
    }

    pub fn is_silenced(&self) -> bool {
        self.silenced
    }

    /// Whether the annunciator should currently be active.
    pub fn is_annunciating(&self) -> bool {
        self.sounding && !self.silenced
    }
}

/// Result of evaluating one device after it accepted a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmUpdate {
    pub previous: TrackState,
    pub current: TrackState,
    /// Indicator mode to show, if the evaluation calls for one.
    pub indicator: Option<ConnectivityIndicator>,
}

impl AlarmUpdate {
    pub fn transitioned(&self) -> bool {
        self.previous != self.current
    }
}

/// Alarm state machine over a device registry.
#[derive(Debug, Clone)]
pub struct AlarmMachine {
    threshold: u8,
    global: GlobalAlarm,
}

impl AlarmMachine {
    pub const fn new(threshold: u8) -> Self {
        Self {
            threshold,
            global: GlobalAlarm {
                sounding: false,
                silenced: false,
            },
        }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn global(&self) -> &GlobalAlarm {
        &self.global
    }

    /// Re-evaluate the device at `index` after it accepted a sample.
    ///
    /// Aggregation always looks at the whole registry: a recovering device
    /// only clears the alarm when no other device is still lost.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range for `registry`.
    pub fn evaluate(&mut self, registry: &mut DeviceRegistry, index: usize) -> AlarmUpdate {
        let device = registry.get_mut(index);
        let previous = device.state;
        let average = device.average();

        let current = match previous {
            TrackState::Connected if average < self.threshold && device.is_initialized() => {
                TrackState::Lost
            }
            TrackState::Lost if average > self.threshold => TrackState::Connected,
            state => state,
        };
        device.state = current;

        if current != previous {
            let id = device.identifier();
            match current {
                TrackState::Lost => warn!(
                    "Device {} (index {}) lost: average LQI {:02X} below {:02X}",
                    id, index, average, self.threshold
                ),
                TrackState::Connected => info!(
                    "Device {} (index {}) reconnected: average LQI {:02X}",
                    id, index, average
                ),
            }
        }

        let mut indicator = None;
        match current {
            TrackState::Lost => {
                if !self.global.sounding {
                    warn!("Alarm sounding ({} device(s) lost)", registry.lost_count());
                    self.global.sounding = true;
                    indicator = Some(ConnectivityIndicator::Alarm);
                }
            }
            TrackState::Connected => {
                let all_connected = registry.all_connected();
                if self.global.sounding && all_connected {
                    info!("All devices connected, alarm cleared");
                    self.global.sounding = false;
                }
                if !self.global.sounding {
                    self.global.silenced = false;
                    if all_connected {
                        debug!("All devices connected");
                    }
                    indicator = Some(ConnectivityIndicator::AllConnected);
                }
            }
        }

        AlarmUpdate {
            previous,
            current,
            indicator,
        }
    }

    /// User "silence" action. Only effective while the alarm is sounding.
    pub fn silence(&mut self) -> Option<ConnectivityIndicator> {
        if !self.global.sounding {
            debug!("Silence requested with no alarm sounding");
            return None;
        }
        info!("Alarm silenced");
        self.global.silenced = true;
        Some(ConnectivityIndicator::Silenced)
    }
}

impl Default for AlarmMachine {
    fn default() -> Self {
        Self::new(DEFAULT_LQI_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link_quality::{AveragingMode, LQI_WINDOW_LEN};
    use crate::registry::DeviceId;

    const TAG_A: DeviceId = DeviceId::new([1, 0, 0, 0, 0, 0, 0, 0]);
    const TAG_B: DeviceId = DeviceId::new([2, 0, 0, 0, 0, 0, 0, 0]);

    fn feed(
        machine: &mut AlarmMachine,
        registry: &mut DeviceRegistry,
        index: usize,
        lqi: u8,
        times: usize,
    ) -> AlarmUpdate {
        let mut last = None;
        for _ in 0..times {
            assert!(registry.get_mut(index).observe(lqi, AveragingMode::FullWindow));
            last = Some(machine.evaluate(registry, index));
        }
        last.unwrap()
    }

    #[test]
    fn test_single_device_lost_then_recovers() {
        let mut registry = DeviceRegistry::new(&[TAG_A]).unwrap();
        let mut machine = AlarmMachine::default();

        let update = feed(&mut machine, &mut registry, 0, 0x10, LQI_WINDOW_LEN);
        let device = registry.get(0);
        assert!(device.is_initialized());
        assert_eq!(device.average(), 0x10);
        assert_eq!(device.state(), TrackState::Lost);
        assert!(update.transitioned());
        assert_eq!(update.indicator, Some(ConnectivityIndicator::Alarm));
        assert!(machine.global().is_sounding());

        feed(&mut machine, &mut registry, 0, 0x90, LQI_WINDOW_LEN);
        let device = registry.get(0);
        assert_eq!(device.average(), 0x90);
        assert_eq!(device.state(), TrackState::Connected);
        assert!(!machine.global().is_sounding());
    }

    #[test]
    fn test_recovery_happens_once_average_exceeds_threshold() {
        let mut registry = DeviceRegistry::new(&[TAG_A]).unwrap();
        let mut machine = AlarmMachine::default();
        feed(&mut machine, &mut registry, 0, 0x10, LQI_WINDOW_LEN);

        // (2 * 0x10 + 4 * 0x90) / 6 = 0x65 crosses after the fourth good sample
        for _ in 0..3 {
            let update = feed(&mut machine, &mut registry, 0, 0x90, 1);
            assert_eq!(update.current, TrackState::Lost);
        }
        let update = feed(&mut machine, &mut registry, 0, 0x90, 1);
        assert_eq!(update.previous, TrackState::Lost);
        assert_eq!(update.current, TrackState::Connected);
        assert_eq!(update.indicator, Some(ConnectivityIndicator::AllConnected));
    }

    #[test]
    fn test_not_lost_before_window_is_full() {
        let mut registry = DeviceRegistry::new(&[TAG_A]).unwrap();
        let mut machine = AlarmMachine::default();

        let update = feed(&mut machine, &mut registry, 0, 0x01, LQI_WINDOW_LEN - 1);
        assert!(!registry.get(0).is_initialized());
        assert_eq!(update.current, TrackState::Connected);
        assert!(!machine.global().is_sounding());

        let update = feed(&mut machine, &mut registry, 0, 0x01, 1);
        assert_eq!(update.current, TrackState::Lost);
    }

    #[test]
    fn test_average_at_threshold_holds_state() {
        let mut registry = DeviceRegistry::new(&[TAG_A, TAG_B]).unwrap();
        let mut machine = AlarmMachine::default();

        // Connected device sitting exactly on the threshold stays connected
        let update = feed(&mut machine, &mut registry, 0, 0x50, 3 * LQI_WINDOW_LEN);
        assert_eq!(update.current, TrackState::Connected);

        // Lost device sitting exactly on the threshold stays lost
        feed(&mut machine, &mut registry, 1, 0x10, LQI_WINDOW_LEN);
        let update = feed(&mut machine, &mut registry, 1, 0x50, 3 * LQI_WINDOW_LEN);
        assert_eq!(registry.get(1).average(), 0x50);
        assert_eq!(update.current, TrackState::Lost);
        assert!(machine.global().is_sounding());
    }

    #[test]
    fn test_alarm_holds_until_every_device_recovers() {
        let mut registry = DeviceRegistry::new(&[TAG_A, TAG_B]).unwrap();
        let mut machine = AlarmMachine::default();

        feed(&mut machine, &mut registry, 0, 0x10, LQI_WINDOW_LEN);
        feed(&mut machine, &mut registry, 1, 0x10, LQI_WINDOW_LEN);
        assert_eq!(registry.lost_count(), 2);

        feed(&mut machine, &mut registry, 0, 0x90, LQI_WINDOW_LEN);
        assert_eq!(registry.get(0).state(), TrackState::Connected);
        assert!(machine.global().is_sounding());

        feed(&mut machine, &mut registry, 1, 0x90, LQI_WINDOW_LEN);
        assert!(registry.all_connected());
        assert!(!machine.global().is_sounding());
    }

    #[test]
    fn test_healthy_device_does_not_clear_alarm_for_lost_peer() {
        let mut registry = DeviceRegistry::new(&[TAG_A, TAG_B]).unwrap();
        let mut machine = AlarmMachine::default();

        feed(&mut machine, &mut registry, 0, 0x10, LQI_WINDOW_LEN);
        let update = feed(&mut machine, &mut registry, 1, 0xC0, 2 * LQI_WINDOW_LEN);
        assert_eq!(update.current, TrackState::Connected);
        assert_eq!(update.indicator, None);
        assert!(machine.global().is_sounding());
    }

    #[test]
    fn test_silence_only_while_sounding() {
        let mut registry = DeviceRegistry::new(&[TAG_A, TAG_B]).unwrap();
        let mut machine = AlarmMachine::default();

        assert_eq!(machine.silence(), None);
        assert!(!machine.global().is_silenced());

        feed(&mut machine, &mut registry, 0, 0x10, LQI_WINDOW_LEN);
        assert!(machine.global().is_annunciating());
        assert_eq!(machine.silence(), Some(ConnectivityIndicator::Silenced));
        assert!(machine.global().is_sounding());
        assert!(machine.global().is_silenced());
        assert!(!machine.global().is_annunciating());
        assert_eq!(registry.get(0).state(), TrackState::Lost);
    }

    #[test]
    fn test_silence_survives_healthy_reports_and_clears_on_recovery() {
        let mut registry = DeviceRegistry::new(&[TAG_A, TAG_B]).unwrap();
        let mut machine = AlarmMachine::default();

        feed(&mut machine, &mut registry, 0, 0x10, LQI_WINDOW_LEN);
        machine.silence();

        // A healthy peer reporting while the alarm sounds leaves the silence alone
        feed(&mut machine, &mut registry, 1, 0xA0, LQI_WINDOW_LEN);
        assert!(machine.global().is_silenced());

        // The lost device returning clears both flags
        feed(&mut machine, &mut registry, 0, 0x90, LQI_WINDOW_LEN);
        assert!(!machine.global().is_sounding());
        assert!(!machine.global().is_silenced());
    }
}
