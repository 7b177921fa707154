use core::sync::atomic::{AtomicU32, Ordering};

use crate::dht11::Reading;

const VALID: u32 = 1 << 16;

/// Most recent successful reading, shareable between tasks.
///
/// Humidity and temperature are packed into a single atomic word, so an
/// observer always sees both values from the same read. Only successful
/// reads update it, through [`Dht11::read_and_publish`].
///
/// [`Dht11::read_and_publish`]: crate::Dht11::read_and_publish
#[derive(Debug, Default)]
pub struct LatestReading {
    packed: AtomicU32,
}

impl LatestReading {
    /// Creates an empty cell. Usable in a `static`.
    pub const fn new() -> Self {
        LatestReading {
            packed: AtomicU32::new(0),
        }
    }

    pub(crate) fn store(&self, humidity: u8, temperature: u8) {
        let packed = VALID | (u32::from(temperature) << 8) | u32::from(humidity);
        self.packed.store(packed, Ordering::Release);
    }

    /// The last successful reading, or `None` if there has not been one yet.
    pub fn get(&self) -> Option<Reading> {
        let packed = self.packed.load(Ordering::Acquire);
        if packed & VALID == 0 {
            return None;
        }
        Some(Reading {
            humidity: f32::from(packed as u8),
            temperature: f32::from((packed >> 8) as u8),
        })
    }

    /// Last temperature in degrees Celsius, `0.0` before the first success.
    pub fn temperature(&self) -> f32 {
        self.get().map_or(0.0, |r| r.temperature)
    }

    /// Last relative humidity in percent, `0.0` before the first success.
    pub fn humidity(&self) -> f32 {
        self.get().map_or(0.0, |r| r.humidity)
    }
}
