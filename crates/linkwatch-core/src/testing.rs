//! Scripted collaborators for unit tests

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin};
use embedded_hal_async::delay::DelayNs;

use crate::config::NetworkConfig;
use crate::indicators::{ConnectivityIndicator, Indicators};
use crate::radio::{
    DecodedMessage, DeviceInfo, InfoMessage, NetworkError, NetworkInfo, Radio, ReceiveError,
};
use crate::registry::DeviceId;

/// Delay that returns immediately and records every requested wait in ms.
#[derive(Debug, Default)]
pub struct MockDelay {
    pub calls: Vec<u32>,
}

impl MockDelay {
    pub fn total_ms(&self) -> u64 {
        self.calls.iter().map(|&ms| u64::from(ms)).sum()
    }
}

impl DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.calls.push(ns / 1_000_000);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.calls.push(ms);
    }
}

/// Active-low button pin replaying a fixed sequence of pressed/released reads.
#[derive(Debug, Default)]
pub struct ScriptedPin {
    script: VecDeque<bool>,
    /// Level reported once the script runs out
    idle_pressed: bool,
    pub reads: usize,
}

impl ScriptedPin {
    pub fn held(pressed: bool) -> Self {
        Self {
            script: VecDeque::new(),
            idle_pressed: pressed,
            reads: 0,
        }
    }

    /// Pressed for the first `reads` polls, then `then_pressed`.
    pub fn pressed_for(reads: usize, then_pressed: bool) -> Self {
        Self {
            script: core::iter::repeat_n(true, reads).collect(),
            idle_pressed: then_pressed,
            reads: 0,
        }
    }

    fn next_pressed(&mut self) -> bool {
        self.reads += 1;
        self.script.pop_front().unwrap_or(self.idle_pressed)
    }
}

impl ErrorType for ScriptedPin {
    type Error = Infallible;
}

impl InputPin for ScriptedPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.next_pressed())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.next_pressed())
    }
}

/// Radio whose bring-up results and inbox are queued by the test.
#[derive(Debug, Default)]
pub struct MockRadio {
    /// Results for successive bring-up attempts; success once exhausted.
    pub start_results: VecDeque<Result<(), NetworkError>>,
    pub start_attempts: u32,
    pub inbox: VecDeque<Result<DecodedMessage, ReceiveError>>,
    pub outputs_result: Option<NetworkError>,
    pub outputs_configured: bool,
}

impl MockRadio {
    pub fn failing_starts(failures: usize) -> Self {
        Self {
            start_results: core::iter::repeat_n(Err(NetworkError::StartFailed(0x01)), failures)
                .collect(),
            ..Self::default()
        }
    }

    pub fn push_info(&mut self, sender: DeviceId, lqi: u8) {
        self.inbox
            .push_back(Ok(DecodedMessage::Info(InfoMessage::new(sender, lqi))));
    }
}

impl Radio for MockRadio {
    async fn start_network(&mut self, _config: &NetworkConfig) -> Result<(), NetworkError> {
        self.start_attempts += 1;
        self.start_results.pop_front().unwrap_or(Ok(()))
    }

    fn message_waiting(&mut self) -> bool {
        !self.inbox.is_empty()
    }

    fn receive_message(&mut self) -> Result<DecodedMessage, ReceiveError> {
        self.inbox.pop_front().unwrap_or(Err(ReceiveError::Empty))
    }

    async fn network_info(&mut self) -> Result<NetworkInfo, NetworkError> {
        Ok(NetworkInfo {
            pan_id: 0x1A2B,
            extended_pan_id: 0x0012_4B00_025D_D25E,
            channel: 17,
        })
    }

    async fn device_info(&mut self) -> Result<DeviceInfo, NetworkError> {
        Err(NetworkError::NoResponse)
    }

    async fn configure_outputs(&mut self) -> Result<(), NetworkError> {
        match self.outputs_result {
            Some(err) => Err(err),
            None => {
                self.outputs_configured = true;
                Ok(())
            }
        }
    }
}

/// Indicator sink that records what it was told.
#[derive(Debug, Default)]
pub struct RecordingIndicators {
    pub alarm_on: bool,
    pub connectivity: Vec<ConnectivityIndicator>,
    pub activity_blinks: usize,
}

impl RecordingIndicators {
    pub fn last_connectivity(&self) -> Option<ConnectivityIndicator> {
        self.connectivity.last().copied()
    }
}

impl Indicators for RecordingIndicators {
    fn set_alarm_indicator(&mut self, on: bool) {
        self.alarm_on = on;
    }

    fn set_connectivity_indicator(&mut self, mode: ConnectivityIndicator) {
        self.connectivity.push(mode);
    }

    fn message_activity(&mut self, active: bool) {
        if active {
            self.activity_blinks += 1;
        }
    }
}
