//! Hardware-independent core library for linkwatch
//!
//! This crate contains all platform-agnostic logic of the linkwatch
//! coordinator: the provisioned device registry, trailing-window LQI
//! averaging, the per-device connectivity alarm, button debouncing and the
//! application state machine that ties them to the network module.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets and desktop hosts (for the simulator and tests).

#![no_std]

extern crate alloc;

pub mod alarm;
pub mod app_state;
pub mod button;
pub mod config;
pub mod coordinator;
pub mod indicators;
pub mod link_quality;
pub mod radio;
pub mod registry;

#[cfg(test)]
mod testing;
