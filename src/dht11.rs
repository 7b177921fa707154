use embedded_hal::{delay::DelayNs, digital::PinState};

use crate::cache::LatestReading;
use crate::error::DhtError;
use crate::frame::{FRAME_BITS, FRAME_LEN, Frame, classify_bit};
use crate::line::DataLine;

/// Maximum time to wait (in microseconds) for the pin to change state.
///
/// Shared by every handshake edge, every bit start and every high-pulse
/// measurement. A pulse of exactly 100us still measures.
const TIMEOUT_US: u32 = 100;

/// Idle-high hold before the start signal.
const STABILIZE_MS: u32 = 1;

/// Start signal low time. The sensor needs at least 18ms.
const START_LOW_MS: u32 = 20;

/// Host high time after the start signal, before releasing the line.
const START_HIGH_US: u32 = 40;

/// Settling time before sampling an idle line.
const LINE_SETTLE_MS: u32 = 10;

/// Minimum spacing between two reads of the same sensor, in milliseconds.
///
/// The driver does not track this; callers scheduling reads must.
pub const MIN_READ_INTERVAL_MS: u32 = 2000;

/// Driver for the DHT11 temperature and humidity sensor.
pub struct Dht11<PIN, D> {
    pin: PIN,
    delay: D,
}

/// Reading returned by the DHT11 sensor.
///
/// The DHT11 reports whole units only.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    /// Temperature in degrees Celsius.
    pub temperature: f32,
    /// Relative humidity in percent.
    pub humidity: f32,
}

/// Idle level of the data line, as seen with the host released.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineState {
    /// Pulled high, ready for a start signal.
    Idle,
    /// Held low: missing pull-up, unpowered sensor or a short to ground.
    StuckLow,
}

impl<PIN, DELAY, E> Dht11<PIN, DELAY>
where
    PIN: DataLine<Error = E>,
    DELAY: DelayNs,
{
    /// Creates a new instance of the DHT11 driver.
    ///
    /// # Arguments
    ///
    /// * `pin` - The data line. Passing `&mut pin` keeps ownership with the caller.
    /// * `delay` - A delay provider with at least microsecond resolution.
    pub fn new(pin: PIN, delay: DELAY) -> Self {
        Dht11 { pin, delay }
    }

    /// Gives back the pin and the delay provider.
    pub fn release(self) -> (PIN, DELAY) {
        (self.pin, self.delay)
    }

    /// Reads a temperature and humidity measurement from the DHT11 sensor.
    ///
    /// Blocks for the whole exchange (about 21ms). The pin is left in input
    /// mode whatever the outcome.
    ///
    /// # Returns
    ///
    /// * `Ok(Reading)` if the read is successful and the checksum is valid.
    /// * `Err(DhtError::Timeout)` if the sensor missed a timing window.
    /// * `Err(DhtError::ChecksumMismatch)` if the frame was corrupted.
    pub fn read(&mut self) -> Result<Reading, DhtError<E>> {
        self.acquire().map(|(_, reading)| reading)
    }

    /// Reads the sensor and, on success only, stores the result in `latest`.
    ///
    /// A failed read leaves `latest` untouched.
    pub fn read_and_publish(&mut self, latest: &LatestReading) -> Result<Reading, DhtError<E>> {
        let (frame, reading) = self.acquire()?;
        latest.store(frame.humidity(), frame.temperature());
        Ok(reading)
    }

    /// Reads the sensor and copies the validated raw frame into `frame`.
    ///
    /// `frame` must hold at least [`FRAME_LEN`] bytes; a shorter buffer is
    /// rejected with `DhtError::InvalidArgument` before the pin is touched.
    /// Nothing is written unless the checksum is valid.
    pub fn read_frame(&mut self, frame: &mut [u8]) -> Result<Reading, DhtError<E>> {
        if frame.len() < FRAME_LEN {
            return Err(DhtError::InvalidArgument);
        }
        let (raw, reading) = self.acquire()?;
        frame[..FRAME_LEN].copy_from_slice(raw.bytes());
        Ok(reading)
    }

    /// Releases the line and reports whether the pull-up brings it high.
    ///
    /// Useful for telling wiring faults apart from protocol timeouts.
    pub fn check_line(&mut self) -> Result<LineState, DhtError<E>> {
        self.pin.set_input()?;
        self.delay.delay_ms(LINE_SETTLE_MS);
        if self.pin.is_high()? {
            Ok(LineState::Idle)
        } else {
            warn!("dht11: data line stuck low");
            Ok(LineState::StuckLow)
        }
    }

    /// Runs one complete exchange and validates the frame.
    fn acquire(&mut self) -> Result<(Frame, Reading), DhtError<E>> {
        self.start()?;
        let frame = self.capture()?;

        match frame.decode() {
            Some(reading) => {
                debug!(
                    "dht11: {}C {}%",
                    frame.temperature(),
                    frame.humidity()
                );
                Ok((frame, reading))
            }
            None => {
                warn!(
                    "dht11: checksum error, calculated {=u8:#x}, received {=u8:#x}",
                    frame.checksum(),
                    frame.received_checksum()
                );
                Err(DhtError::ChecksumMismatch)
            }
        }
    }

    /// Sends the start signal and hands the line over to the sensor.
    ///
    /// The pin is switched to input even if driving it failed.
    fn start(&mut self) -> Result<(), DhtError<E>> {
        let sent = self.send_start_signal();
        let released = self.pin.set_input();
        sent?;
        released?;
        Ok(())
    }

    fn send_start_signal(&mut self) -> Result<(), DhtError<E>> {
        self.pin.set_output()?;
        self.pin.set_high()?;
        self.delay.delay_ms(STABILIZE_MS);

        // MCU sends start request
        self.pin.set_low()?;
        self.delay.delay_ms(START_LOW_MS);
        self.pin.set_high()?;
        self.delay.delay_us(START_HIGH_US);
        Ok(())
    }

    /// Receives the handshake and the 40 data bits.
    #[cfg(feature = "critical-section")]
    fn capture(&mut self) -> Result<Frame, DhtError<E>> {
        critical_section::with(|_| self.receive())
    }

    /// Receives the handshake and the 40 data bits.
    #[cfg(not(feature = "critical-section"))]
    fn capture(&mut self) -> Result<Frame, DhtError<E>> {
        self.receive()
    }

    fn receive(&mut self) -> Result<Frame, DhtError<E>> {
        // Waiting for DHT11 Response
        self.wait_for_level(PinState::Low, TIMEOUT_US)
            .inspect_err(|_| warn!("dht11: no response low"))?; // 80us
        self.wait_for_level(PinState::High, TIMEOUT_US)
            .inspect_err(|_| warn!("dht11: no response high"))?; // 80us
        self.wait_for_level(PinState::Low, TIMEOUT_US)
            .inspect_err(|_| warn!("dht11: no data start"))?;

        let mut frame = Frame::default();
        for i in 0..FRAME_BITS {
            let width = self.read_bit_width(i)?;
            frame.push_bit(i, classify_bit(width));
        }
        Ok(frame)
    }

    /// Waits out the 50us low that opens bit `index` and returns the width
    /// of the high pulse that follows.
    fn read_bit_width(&mut self, index: usize) -> Result<u32, DhtError<E>> {
        self.wait_for_level(PinState::High, TIMEOUT_US)
            .inspect_err(|_| warn!("dht11: bit {} start lost", index))?;
        self.measure_pulse(PinState::High, TIMEOUT_US)
            .inspect_err(|_| warn!("dht11: bit {} pulse too long", index))
    }

    /// Waits until the data line reads `level` or `timeout_us` elapses.
    fn wait_for_level(&mut self, level: PinState, timeout_us: u32) -> Result<(), DhtError<E>> {
        self.poll_while(!level, timeout_us).map(|_| ())
    }

    /// Returns how long, in microseconds, the data line keeps reading `level`.
    fn measure_pulse(&mut self, level: PinState, timeout_us: u32) -> Result<u32, DhtError<E>> {
        self.poll_while(level, timeout_us)
    }

    /// Polls the line once per microsecond while it reads `level`.
    ///
    /// # Errors
    ///
    /// Returns `DhtError::Timeout` if the level has not changed after
    /// `timeout_us` microseconds.
    fn poll_while(&mut self, level: PinState, timeout_us: u32) -> Result<u32, DhtError<E>> {
        let mut elapsed = 0;
        while PinState::from(self.pin.is_high()?) == level {
            if elapsed >= timeout_us {
                return Err(DhtError::Timeout);
            }
            self.delay.delay_us(1);
            elapsed += 1;
        }
        Ok(elapsed)
    }
}
