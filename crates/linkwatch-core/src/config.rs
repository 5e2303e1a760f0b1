//! Coordinator configuration
//!
//! Everything the deployment fixes up front: the provisioned device table,
//! the alarm threshold, button and bring-up timings and the network start
//! parameters. The whole structure can be stored as a postcard blob.

extern crate alloc;
use alloc::vec::Vec;

use embassy_time::Duration;
use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::alarm::DEFAULT_LQI_THRESHOLD;
use crate::link_quality::AveragingMode;
use crate::registry::{DeviceId, MAX_DEVICES};

/// Wait between failed network bring-up attempts.
pub const STARTUP_RETRY_MS: u32 = 5000;
/// Short debounce window deciding a press.
pub const PRESS_WINDOW_MS: u32 = 150;
/// Long debounce window deciding a hold.
pub const HOLD_WINDOW_MS: u32 = 5000;
/// Interval between button polls inside a debounce window.
pub const BUTTON_POLL_MS: u32 = 5;

/// Devices provisioned in the reference deployment.
pub const PROVISIONED_DEVICES: [DeviceId; 2] = [
    DeviceId::new([0x5E, 0xD2, 0x5D, 0x02, 0x00, 0x4B, 0x12, 0x00]),
    DeviceId::new([0xD3, 0xD3, 0x5D, 0x02, 0x00, 0x4B, 0x12, 0x00]),
];

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("More than {max} devices provisioned")]
    TooManyDevices { max: usize },
    #[error("Device {0} provisioned more than once")]
    DuplicateIdentifier(DeviceId),
    #[error("Button poll interval must be non-zero")]
    InvalidTiming,
    #[error("Configuration blob could not be decoded")]
    Decode,
    #[error("Configuration could not be encoded")]
    Encode,
}

/// Role the module takes when starting the network.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceRole {
    #[default]
    Coordinator,
    Router,
    EndDevice,
}

/// Opaque bring-up parameters handed to [`Radio::start_network`](crate::radio::Radio::start_network).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkConfig {
    pub role: DeviceRole,
    /// PAN to form or join; `ANY_PAN` lets the module choose.
    pub pan_id: u16,
    /// Bit per 2.4 GHz channel (bit 11 = channel 11).
    pub channel_mask: u32,
}

impl NetworkConfig {
    pub const ANY_PAN: u16 = 0xFFFF;
    pub const ALL_CHANNELS: u32 = 0x07FF_F800;
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            role: DeviceRole::Coordinator,
            pan_id: Self::ANY_PAN,
            channel_mask: Self::ALL_CHANNELS,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    pub devices: heapless::Vec<DeviceId, MAX_DEVICES>,
    pub lqi_threshold: u8,
    pub averaging: AveragingMode,
    pub startup_retry_ms: u32,
    pub press_window_ms: u32,
    pub hold_window_ms: u32,
    pub button_poll_ms: u32,
    pub network: NetworkConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        let mut devices = heapless::Vec::new();
        devices.extend(PROVISIONED_DEVICES);
        Self {
            devices,
            lqi_threshold: DEFAULT_LQI_THRESHOLD,
            averaging: AveragingMode::FullWindow,
            startup_retry_ms: STARTUP_RETRY_MS,
            press_window_ms: PRESS_WINDOW_MS,
            hold_window_ms: HOLD_WINDOW_MS,
            button_poll_ms: BUTTON_POLL_MS,
            network: NetworkConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Default configuration tracking `devices` instead of the reference set.
    pub fn with_devices(devices: &[DeviceId]) -> Result<Self, ConfigError> {
        let devices = heapless::Vec::from_slice(devices)
            .map_err(|_| ConfigError::TooManyDevices { max: MAX_DEVICES })?;
        let config = Self {
            devices,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, id) in self.devices.iter().enumerate() {
            if self.devices[..i].contains(id) {
                return Err(ConfigError::DuplicateIdentifier(*id));
            }
        }
        if self.button_poll_ms == 0 {
            return Err(ConfigError::InvalidTiming);
        }
        Ok(())
    }

    /// Decode and validate a stored configuration.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Decode)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ConfigError> {
        postcard::to_allocvec(self).map_err(|_| ConfigError::Encode)
    }

    pub fn startup_retry(&self) -> Duration {
        Duration::from_millis(self.startup_retry_ms.into())
    }

    pub fn press_window(&self) -> Duration {
        Duration::from_millis(self.press_window_ms.into())
    }

    pub fn hold_window(&self) -> Duration {
        Duration::from_millis(self.hold_window_ms.into())
    }
}
