//! Pre-provisioned device table
//!
//! The coordinator only tracks devices whose hardware identifiers were
//! provisioned up front. The table is fixed-capacity and never grows or
//! shrinks during a run; indices handed out by [`DeviceRegistry::find_by_identifier`]
//! stay valid for the lifetime of the registry.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::alarm::TrackState;
use crate::config::ConfigError;
use crate::link_quality::{AveragingMode, LQI_WINDOW_LEN, LinkQualityWindow};

/// Maximum number of devices a coordinator can track.
pub const MAX_DEVICES: usize = 10;

/// Length of a hardware (IEEE) identifier in bytes.
pub const DEVICE_ID_LEN: usize = 8;

/// Stable hardware identifier of a tracked device.
///
/// Stored least significant byte first, as it arrives over the air.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DeviceId(pub [u8; DEVICE_ID_LEN]);

impl DeviceId {
    pub const fn new(bytes: [u8; DEVICE_ID_LEN]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; DEVICE_ID_LEN] {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    /// Most significant byte first, the way identifiers are printed on labels.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter().rev() {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

/// Tracking record for one provisioned device.
#[derive(Debug, Clone)]
pub struct DeviceRecord {
    identifier: DeviceId,
    /// Most recent LQI reported for this device; 0 until the first report.
    last_sample: u8,
    window: LinkQualityWindow<LQI_WINDOW_LEN>,
    pub(crate) state: TrackState,
}

impl DeviceRecord {
    pub const fn new(identifier: DeviceId) -> Self {
        Self {
            identifier,
            last_sample: 0,
            window: LinkQualityWindow::new(),
            state: TrackState::Connected,
        }
    }

    /// Note the LQI carried by a message from this device.
    ///
    /// The value is always remembered as the last sample, but a zero LQI is
    /// "no measurement" and does not enter the averaging window. Returns
    /// whether the sample was accepted into the window.
    pub fn observe(&mut self, lqi: u8, mode: AveragingMode) -> bool {
        self.last_sample = lqi;
        if lqi == 0 {
            return false;
        }
        self.window.record(lqi, mode);
        true
    }

    pub fn identifier(&self) -> DeviceId {
        self.identifier
    }

    pub fn last_sample(&self) -> u8 {
        self.last_sample
    }

    pub fn window(&self) -> &LinkQualityWindow<LQI_WINDOW_LEN> {
        &self.window
    }

    pub fn average(&self) -> u8 {
        self.window.average()
    }

    pub fn is_initialized(&self) -> bool {
        self.window.is_initialized()
    }

    pub fn state(&self) -> TrackState {
        self.state
    }
}

/// Fixed-capacity table of provisioned devices.
#[derive(Debug, Clone)]
pub struct DeviceRegistry {
    devices: heapless::Vec<DeviceRecord, MAX_DEVICES>,
}

impl DeviceRegistry {
    /// Build the table from the provisioned identifiers.
    ///
    /// Duplicate identifiers are rejected: lookups are first-match, so a
    /// second record with the same identifier would never receive samples.
    pub fn new(identifiers: &[DeviceId]) -> Result<Self, ConfigError> {
        let mut devices = heapless::Vec::new();
        for (i, id) in identifiers.iter().enumerate() {
            if identifiers[..i].contains(id) {
                return Err(ConfigError::DuplicateIdentifier(*id));
            }
            devices
                .push(DeviceRecord::new(*id))
                .map_err(|_| ConfigError::TooManyDevices { max: MAX_DEVICES })?;
        }
        Ok(Self { devices })
    }

    /// Linear scan for the first record with the given identifier.
    pub fn find_by_identifier(&self, identifier: &DeviceId) -> Option<usize> {
        self.devices
            .iter()
            .position(|device| device.identifier == *identifier)
    }

    /// # Panics
    ///
    /// Panics if `index` is out of range. Indices only come from
    /// [`find_by_identifier`](Self::find_by_identifier) or iteration, so an
    /// out-of-range index is a logic error.
    pub fn get(&self, index: usize) -> &DeviceRecord {
        &self.devices[index]
    }

    /// # Panics
    ///
    /// Panics if `index` is out of range, see [`get`](Self::get).
    pub fn get_mut(&mut self, index: usize) -> &mut DeviceRecord {
        &mut self.devices[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceRecord> {
        self.devices.iter()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Whether every provisioned device is currently connected.
    pub fn all_connected(&self) -> bool {
        self.devices
            .iter()
            .all(|device| device.state == TrackState::Connected)
    }

    /// Number of devices currently classified as lost.
    pub fn lost_count(&self) -> usize {
        self.devices
            .iter()
            .filter(|device| device.state == TrackState::Lost)
            .count()
    }
}
