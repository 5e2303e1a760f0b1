//! Indicator sink for alarm and connectivity state
//!
//! Rendering (LED colours, buzzer drive) belongs to the board; the core only
//! says which mode to show.

/// Connectivity mode shown on the status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityIndicator {
    /// No device lost
    AllConnected,
    /// At least one device lost and the alarm is sounding
    Alarm,
    /// Alarm sounding but silenced by the user
    Silenced,
    /// Tracking paused by a button hold
    MonitoringPaused,
    /// Tracking resumed by a button hold
    MonitoringResumed,
}

impl ConnectivityIndicator {
    pub const fn label(self) -> &'static str {
        match self {
            Self::AllConnected => "all connected",
            Self::Alarm => "alarm",
            Self::Silenced => "silenced",
            Self::MonitoringPaused => "monitoring paused",
            Self::MonitoringResumed => "monitoring resumed",
        }
    }
}

pub trait Indicators {
    /// Drive the audible/visual alarm annunciator.
    fn set_alarm_indicator(&mut self, on: bool);

    fn set_connectivity_indicator(&mut self, mode: ConnectivityIndicator);

    /// Blink while an inbound message is being processed.
    fn message_activity(&mut self, _active: bool) {}
}
