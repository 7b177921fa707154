use crate::dht11::Reading;

/// Number of bits the sensor sends per measurement.
pub(crate) const FRAME_BITS: usize = 40;

/// Number of bytes in a frame, checksum included.
pub const FRAME_LEN: usize = FRAME_BITS / 8;

/// High pulses longer than this (in microseconds) carry a `1`.
///
/// Midpoint between the ~28us "zero" pulse and the ~70us "one" pulse.
pub(crate) const BIT_THRESHOLD_US: u32 = 40;

/// Decodes a data bit from the width of its high pulse.
pub(crate) fn classify_bit(width_us: u32) -> bool {
    width_us > BIT_THRESHOLD_US
}

/// Raw 5-byte frame as it comes off the wire:
/// humidity integer, humidity fraction, temperature integer,
/// temperature fraction, checksum.
///
/// The fraction bytes are always zero on the DHT11 and only take part in
/// the checksum.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Frame {
    bytes: [u8; FRAME_LEN],
}

impl Frame {
    /// Records bit `index` of the stream. Bits arrive MSB first.
    pub(crate) fn push_bit(&mut self, index: usize, bit: bool) {
        if bit {
            self.bytes[index / 8] |= 1 << (7 - index % 8);
        }
    }

    /// Sum of the four data bytes, modulo 256.
    pub(crate) fn checksum(&self) -> u8 {
        self.bytes[..4]
            .iter()
            .fold(0u8, |sum, v| sum.wrapping_add(*v))
    }

    /// Checksum byte as sent by the sensor.
    pub(crate) fn received_checksum(&self) -> u8 {
        self.bytes[4]
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.checksum() == self.received_checksum()
    }

    pub(crate) fn humidity(&self) -> u8 {
        self.bytes[0]
    }

    pub(crate) fn temperature(&self) -> u8 {
        self.bytes[2]
    }

    pub(crate) fn bytes(&self) -> &[u8; FRAME_LEN] {
        &self.bytes
    }

    /// Converts a frame into a [`Reading`], or `None` if the checksum fails.
    pub(crate) fn decode(&self) -> Option<Reading> {
        if !self.is_valid() {
            return None;
        }
        Some(Reading {
            temperature: f32::from(self.temperature()),
            humidity: f32::from(self.humidity()),
        })
    }
}

#[cfg(test)]
impl From<[u8; FRAME_LEN]> for Frame {
    fn from(bytes: [u8; FRAME_LEN]) -> Self {
        Frame { bytes }
    }
}
