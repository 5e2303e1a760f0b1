//! Interface to the network module
//!
//! Module bring-up and frame decoding are the board's business. The core sees
//! an opaque start call, a "message waiting" level and already-decoded
//! messages.

use thiserror_no_std::Error;

use crate::config::NetworkConfig;
use crate::registry::DeviceId;

/// Maximum key/value observations carried by one info message.
pub const MAX_OBSERVATIONS: usize = 8;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Module start failed with status 0x{0:02X}")]
    StartFailed(u8),
    #[error("Module did not respond")]
    NoResponse,
    #[error("Module command failed with status 0x{0:02X}")]
    Command(u8),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveError {
    #[error("No frame available")]
    Empty,
    #[error("Malformed frame: {0}")]
    Malformed(&'static str),
}

/// One key/value pair reported by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub key: u8,
    pub value: i16,
}

/// Application message from a tracked device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoMessage {
    pub sender: DeviceId,
    /// Link quality the coordinator measured for this frame (0-255).
    pub lqi: u8,
    pub observations: heapless::Vec<Observation, MAX_OBSERVATIONS>,
}

impl InfoMessage {
    pub fn new(sender: DeviceId, lqi: u8) -> Self {
        Self {
            sender,
            lqi,
            observations: heapless::Vec::new(),
        }
    }
}

/// Frame received from the module, decoded by the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedMessage {
    Info(InfoMessage),
    /// A device joined or rejoined the network.
    DeviceAnnounce {
        identifier: DeviceId,
        short_address: u16,
    },
    /// Any other frame; ignored by tracking.
    Unrecognized { cluster: u16, length: usize },
}

/// Parameters of the network the module formed or joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo {
    pub pan_id: u16,
    pub extended_pan_id: u64,
    pub channel: u8,
}

/// Identity of the coordinator's own module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    pub identifier: DeviceId,
    pub short_address: u16,
    pub parent_address: u16,
    pub device_state: u8,
}

/// Network module driven by the coordinator.
pub trait Radio {
    /// Reset the module and bring the network up. Safe to retry.
    fn start_network(
        &mut self,
        config: &NetworkConfig,
    ) -> impl Future<Output = Result<(), NetworkError>>;

    /// Whether an inbound frame is ready to be read.
    fn message_waiting(&mut self) -> bool;

    /// Read and decode the pending frame.
    fn receive_message(&mut self) -> Result<DecodedMessage, ReceiveError>;

    fn network_info(&mut self) -> impl Future<Output = Result<NetworkInfo, NetworkError>>;

    fn device_info(&mut self) -> impl Future<Output = Result<DeviceInfo, NetworkError>>;

    /// Configure the module's GPIOs as indicator outputs.
    fn configure_outputs(&mut self) -> impl Future<Output = Result<(), NetworkError>>;
}
