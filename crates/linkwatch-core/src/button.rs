//! User button handling
//!
//! The button interrupt only raises a pending flag through [`ButtonEvents`];
//! the coordinator loop later takes the flag and debounces the physical pin
//! with [`Debouncer`]. Debouncing blocks the loop for the whole window, so no
//! messages are serviced while the button is being sampled.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embedded_hal::digital::InputPin;
use embedded_hal_async::delay::DelayNs;

/// Pending-press flag shared between the button interrupt and the main loop.
///
/// One producer calls [`notify`](Self::notify) (interrupt handler or another
/// thread); one consumer calls [`take_pending`](Self::take_pending). Repeated
/// notifications before the consumer runs collapse into one event.
pub struct ButtonEvents {
    signal: Signal<CriticalSectionRawMutex, ()>,
}

impl ButtonEvents {
    pub const fn new() -> Self {
        Self {
            signal: Signal::new(),
        }
    }

    /// Raise the pending flag. Safe to call from interrupt context.
    pub fn notify(&self) {
        self.signal.signal(());
    }

    /// Test-and-clear the pending flag.
    pub fn take_pending(&self) -> bool {
        self.signal.try_take().is_some()
    }

    /// Check the flag without clearing it.
    pub fn is_pending(&self) -> bool {
        self.signal.signaled()
    }
}

impl Default for ButtonEvents {
    fn default() -> Self {
        Self::new()
    }
}

/// Button event flag for the board's interrupt handler.
pub static BUTTON_EVENTS: ButtonEvents = ButtonEvents::new();

/// Majority-vote debouncer for an active-low push button.
///
/// Polls the pin every `poll_interval_ms` across a window and reports the
/// button pressed when it read pressed more often than released.
pub struct Debouncer<P> {
    pin: P,
    poll_interval_ms: u32,
}

impl<P: InputPin> Debouncer<P> {
    pub fn new(pin: P, poll_interval_ms: u32) -> Self {
        Self {
            pin,
            poll_interval_ms: poll_interval_ms.max(1),
        }
    }

    /// Sample the button across `window_ms` and return the majority state.
    pub async fn sample<D: DelayNs>(&mut self, delay: &mut D, window_ms: u32) -> bool {
        let mut elapsed = 0;
        let mut on_count = 0u32;
        let mut off_count = 0u32;

        while elapsed < window_ms {
            if self.is_pressed() {
                on_count += 1;
            } else {
                off_count += 1;
            }
            elapsed += self.poll_interval_ms;
            delay.delay_ms(self.poll_interval_ms).await;
        }

        on_count > off_count
    }

    /// Unreadable pins count as released.
    fn is_pressed(&mut self) -> bool {
        self.pin.is_low().unwrap_or(false)
    }

    pub fn pin_mut(&mut self) -> &mut P {
        &mut self.pin
    }
}
