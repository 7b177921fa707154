//! DHT11 Sensor Driver for Embedded Rust
//!
//! This crate provides a platform-agnostic, bit-banged driver for the DHT11
//! temperature and humidity sensor, built on top of the [`embedded-hal`] traits.
//!
//! The whole single-wire protocol runs in software: the driver pulls the data
//! line low to wake the sensor, then busy-polls it with 1us resolution to time
//! the handshake and the 40 data bits. A read blocks the calling thread for
//! roughly 21ms, so run it from a dedicated task rather than a latency
//! sensitive path, and leave at least [`MIN_READ_INTERVAL_MS`] between reads.
//!
//! # Features
//! - Blocking synchronous API using `embedded-hal` traits
//! - Designed for `no_std` environments
//! - [`LatestReading`], a lock-free cell for sharing the last good reading
//! - Optional logging support via `defmt`
//!
//! # Dependencies
//! This driver depends on the following `embedded-hal` traits:
//! - [`InputPin`] and [`OutputPin`] for GPIO access, plus [`DataLine`] for
//!   switching the pin between output and input
//! - [`DelayNs`] for accurate timing
//!
//! # Optional Features
//! - `defmt`: Implements `defmt::Format` and logs failed reads
//! - `critical-section`: Captures the sensor response with interrupts disabled
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal
//! [`InputPin`]: embedded_hal::digital::InputPin
//! [`OutputPin`]: embedded_hal::digital::OutputPin
//! [`DelayNs`]: embedded_hal::delay::DelayNs

#![cfg_attr(not(test), no_std)]

mod fmt;

pub mod cache;
pub mod dht11;
pub mod error;
mod frame;
pub mod line;

#[cfg(test)]
mod sim;

pub use cache::LatestReading;
pub use dht11::{Dht11, LineState, MIN_READ_INTERVAL_MS, Reading};
pub use error::DhtError;
pub use frame::FRAME_LEN;
pub use line::{DataLine, OpenDrain};
