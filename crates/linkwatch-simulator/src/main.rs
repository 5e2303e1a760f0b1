//! Desktop simulator for the linkwatch coordinator.
//!
//! Runs the linkwatch-core coordinator against a synthetic network module
//! whose devices report scripted link-quality trajectories, a simulated
//! push-button and a console indicator sink.
//!
//! # Key bindings (type the key, then Enter)
//!
//! | Key | Action                                   |
//! |-----|------------------------------------------|
//! | s   | Short press (silence a sounding alarm)   |
//! | h   | Hold for 6 s (pause/resume monitoring)   |
//! | q   | Quit                                     |
//!
//! Logging is controlled with `RUST_LOG` (default `info`; use `debug` to see
//! the per-device window dump after every sample).

use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use embedded_hal::digital::{ErrorType, InputPin};
use embedded_hal_async::delay::DelayNs;
use log::{error, info};

use linkwatch_core::button::BUTTON_EVENTS;
use linkwatch_core::config::{MonitorConfig, NetworkConfig};
use linkwatch_core::coordinator::Coordinator;
use linkwatch_core::indicators::{ConnectivityIndicator, Indicators};
use linkwatch_core::radio::{
    DecodedMessage, DeviceInfo, InfoMessage, NetworkError, NetworkInfo, Observation, Radio,
    ReceiveError,
};
use linkwatch_core::registry::DeviceId;

// ---------------------------------------------------------------------------
// Simulation constants
// ---------------------------------------------------------------------------

/// Interval between synthetic frames (round-robin over all senders).
const FRAME_INTERVAL: Duration = Duration::from_millis(250);

/// Number of bring-up attempts that fail before the network comes up.
const FAILED_STARTS: u32 = 2;

/// Length of one walk-away/return cycle, in frames per sender.
const WANDER_PERIOD: u32 = 120;

/// How long a short press holds the button down.
const PRESS_DURATION: Duration = Duration::from_millis(300);

/// How long a hold keeps the button down.
const HOLD_DURATION: Duration = Duration::from_secs(6);

/// Observation key for the reported temperature.
const OID_TEMPERATURE: u8 = 0x21;

/// Observation key for the supply voltage.
const OID_SUPPLY_MV: u8 = 0x43;

const TAG_DESK: DeviceId = DeviceId::new([0x5E, 0xD2, 0x5D, 0x02, 0x00, 0x4B, 0x12, 0x00]);
const TAG_BAG: DeviceId = DeviceId::new([0xD3, 0xD3, 0x5D, 0x02, 0x00, 0x4B, 0x12, 0x00]);
const TAG_KEYS: DeviceId = DeviceId::new([0x17, 0x0A, 0x5E, 0x02, 0x00, 0x4B, 0x12, 0x00]);
/// Not provisioned: its frames are received but never tracked.
const TAG_STRANGER: DeviceId = DeviceId::new([0x99, 0x88, 0x77, 0x66, 0x00, 0x4B, 0x12, 0x00]);

// ---------------------------------------------------------------------------
// Synthetic network module
// ---------------------------------------------------------------------------

/// How a simulated sender's link quality evolves.
#[derive(Clone, Copy)]
enum Trajectory {
    /// Stays close to a base LQI.
    Steady(u8),
    /// Walks out of range and back once per [`WANDER_PERIOD`] frames.
    Wander { near: u8, far: u8 },
}

struct SimSender {
    id: DeviceId,
    trajectory: Trajectory,
    frames_sent: u32,
}

impl SimSender {
    fn new(id: DeviceId, trajectory: Trajectory) -> Self {
        Self {
            id,
            trajectory,
            frames_sent: 0,
        }
    }

    fn next_lqi(&mut self, noise: i16) -> u8 {
        let base = match self.trajectory {
            Trajectory::Steady(lqi) => lqi,
            Trajectory::Wander { near, far } => {
                // Triangle wave: near → far over the first half, back over the second
                let phase = self.frames_sent % WANDER_PERIOD;
                let half = WANDER_PERIOD / 2;
                let distance = if phase < half { phase } else { WANDER_PERIOD - phase };
                let span = i32::from(near) - i32::from(far);
                (i32::from(near) - span * distance as i32 / half as i32) as u8
            }
        };
        self.frames_sent += 1;
        // Zero means "no measurement"; keep real readings at 1 or above
        (i16::from(base) + noise).clamp(1, 255) as u8
    }
}

/// Network module that fails its first few starts, then emits frames from a
/// fixed set of senders at a steady rate.
struct SimRadio {
    senders: Vec<SimSender>,
    next_sender: usize,
    start_attempts: u32,
    online: bool,
    last_frame: Instant,
    announced: bool,
    rng_state: u32,
}

impl SimRadio {
    fn new(senders: Vec<SimSender>) -> Self {
        Self {
            senders,
            next_sender: 0,
            start_attempts: 0,
            online: false,
            last_frame: Instant::now(),
            announced: false,
            rng_state: 0x1234_5678,
        }
    }

    /// Small LQI jitter in -6..=6.
    fn noise(&mut self) -> i16 {
        self.rng_state = self
            .rng_state
            .wrapping_mul(1_664_525)
            .wrapping_add(1_013_904_223);
        ((self.rng_state >> 16) % 13) as i16 - 6
    }
}

impl Radio for SimRadio {
    async fn start_network(&mut self, config: &NetworkConfig) -> Result<(), NetworkError> {
        self.start_attempts += 1;
        if self.start_attempts <= FAILED_STARTS {
            return Err(NetworkError::StartFailed(0xC2));
        }
        info!(
            "Simulated module started as {:?} (PAN 0x{:04X}, channels 0x{:08X})",
            config.role, config.pan_id, config.channel_mask
        );
        self.online = true;
        self.last_frame = Instant::now();
        Ok(())
    }

    fn message_waiting(&mut self) -> bool {
        self.online && (!self.announced || self.last_frame.elapsed() >= FRAME_INTERVAL)
    }

    fn receive_message(&mut self) -> Result<DecodedMessage, ReceiveError> {
        if !self.message_waiting() {
            return Err(ReceiveError::Empty);
        }

        if !self.announced {
            self.announced = true;
            return Ok(DecodedMessage::DeviceAnnounce {
                identifier: TAG_KEYS,
                short_address: 0x2F1C,
            });
        }

        self.last_frame = Instant::now();
        let noise = self.noise();
        let index = self.next_sender;
        self.next_sender = (self.next_sender + 1) % self.senders.len();

        let sender = &mut self.senders[index];
        let lqi = sender.next_lqi(noise);
        let mut message = InfoMessage::new(sender.id, lqi);
        let _ = message.observations.push(Observation {
            key: OID_TEMPERATURE,
            value: 215 + noise,
        });
        let _ = message.observations.push(Observation {
            key: OID_SUPPLY_MV,
            value: 3010 - (sender.frames_sent % 50) as i16,
        });

        Ok(DecodedMessage::Info(message))
    }

    async fn network_info(&mut self) -> Result<NetworkInfo, NetworkError> {
        Ok(NetworkInfo {
            pan_id: 0x1A2B,
            extended_pan_id: 0x0012_4B00_025D_0001,
            channel: 17,
        })
    }

    async fn device_info(&mut self) -> Result<DeviceInfo, NetworkError> {
        Ok(DeviceInfo {
            identifier: DeviceId::new([0x01, 0x00, 0x5D, 0x02, 0x00, 0x4B, 0x12, 0x00]),
            short_address: 0x0000,
            parent_address: 0xFFFE,
            device_state: 9,
        })
    }

    async fn configure_outputs(&mut self) -> Result<(), NetworkError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Board stand-ins
// ---------------------------------------------------------------------------

/// Delay backed by the host clock.
struct StdDelay;

impl DelayNs for StdDelay {
    async fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(ns.into()));
    }

    async fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms.into()));
    }
}

/// Active-low button whose level is set by the keyboard thread.
struct SimButton {
    pressed: Arc<AtomicBool>,
}

impl ErrorType for SimButton {
    type Error = core::convert::Infallible;
}

impl InputPin for SimButton {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.pressed.load(Ordering::Relaxed))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.pressed.load(Ordering::Relaxed))
    }
}

/// Logs indicator changes to the console.
#[derive(Default)]
struct ConsoleIndicators {
    alarm_on: bool,
    mode: Option<ConnectivityIndicator>,
}

impl Indicators for ConsoleIndicators {
    fn set_alarm_indicator(&mut self, on: bool) {
        if on != self.alarm_on {
            info!("[indicator] annunciator {}", if on { "ON" } else { "off" });
            self.alarm_on = on;
        }
    }

    fn set_connectivity_indicator(&mut self, mode: ConnectivityIndicator) {
        if self.mode != Some(mode) {
            info!("[indicator] status: {}", mode.label());
            self.mode = Some(mode);
        }
    }
}

/// Read key commands from stdin and drive the simulated button.
fn spawn_keyboard(pressed: Arc<AtomicBool>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let hold_for = match line.trim() {
                "s" => PRESS_DURATION,
                "h" => HOLD_DURATION,
                "q" => {
                    info!("Simulator exiting");
                    std::process::exit(0);
                }
                "" => continue,
                other => {
                    info!("Unknown key {:?} (s = press, h = hold, q = quit)", other);
                    continue;
                }
            };

            pressed.store(true, Ordering::Relaxed);
            BUTTON_EVENTS.notify();
            std::thread::sleep(hold_for);
            pressed.store(false, Ordering::Relaxed);
        }
    });
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Starting linkwatch simulator");
    info!("Keys: s=press (silence)  h=hold (toggle monitoring)  q=quit");

    let config = match MonitorConfig::with_devices(&[TAG_DESK, TAG_BAG, TAG_KEYS]) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let radio = SimRadio::new(vec![
        SimSender::new(TAG_DESK, Trajectory::Steady(0xB4)),
        SimSender::new(TAG_BAG, Trajectory::Wander { near: 0xA8, far: 0x18 }),
        SimSender::new(TAG_KEYS, Trajectory::Steady(0x96)),
        SimSender::new(TAG_STRANGER, Trajectory::Steady(0x40)),
    ]);

    let pressed = Arc::new(AtomicBool::new(false));
    spawn_keyboard(pressed.clone());

    let mut coordinator = match Coordinator::new(
        &config,
        radio,
        StdDelay,
        SimButton { pressed },
        ConsoleIndicators::default(),
        &BUTTON_EVENTS,
    ) {
        Ok(coordinator) => coordinator,
        Err(e) => {
            error!("Failed to create coordinator: {}", e);
            std::process::exit(1);
        }
    };

    embassy_futures::block_on(coordinator.run())
}
