//! Virtual-time DHT11 used by the driver tests.
//!
//! The pin and the delay share one clock: delays advance it, pin reads sample
//! the sensor's waveform at the current instant. Polling itself costs no
//! time, so measured pulse widths are exact.

use core::cell::RefCell;
use core::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::frame::{FRAME_BITS, FRAME_LEN};
use crate::line::DataLine;

/// Shortest start pulse the sensor reacts to.
const MIN_START_LOW_NS: u64 = 18_000_000;

pub const ZERO_US: u32 = 26;
pub const ONE_US: u32 = 70;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Output,
    Input,
}

/// One stretch of constant level, `(high, duration_us)`.
pub type Segment = (bool, u32);

struct Bus {
    now_ns: u64,
    mode: Mode,
    driven_high: bool,
    stuck_low: bool,
    low_since: Option<u64>,
    armed: bool,
    response: Vec<Segment>,
    response_start: Option<u64>,
    pin_ops: usize,
}

impl Bus {
    fn level(&self) -> bool {
        if self.stuck_low {
            return false;
        }
        let Some(start) = self.response_start else {
            return true;
        };
        let mut offset = (self.now_ns - start) / 1000;
        for &(high, duration) in &self.response {
            if offset < u64::from(duration) {
                return high;
            }
            offset -= u64::from(duration);
        }
        // pull-up once the sensor lets go
        true
    }
}

#[derive(Clone)]
pub struct Sim {
    bus: Rc<RefCell<Bus>>,
}

impl Sim {
    /// A sensor that answers every valid start signal with `response`.
    pub fn new(response: Vec<Segment>) -> Self {
        Sim {
            bus: Rc::new(RefCell::new(Bus {
                now_ns: 0,
                mode: Mode::Input,
                driven_high: true,
                stuck_low: false,
                low_since: None,
                armed: false,
                response,
                response_start: None,
                pin_ops: 0,
            })),
        }
    }

    /// A sensor transmitting `bytes` with nominal timings.
    pub fn responding(bytes: [u8; FRAME_LEN]) -> Self {
        Self::new(waveform(&widths_for(bytes)))
    }

    /// Nothing attached, the pull-up keeps the line high.
    pub fn silent() -> Self {
        Self::new(Vec::new())
    }

    /// Line shorted to ground.
    pub fn stuck_low() -> Self {
        let sim = Self::silent();
        sim.bus.borrow_mut().stuck_low = true;
        sim
    }

    pub fn pin(&self) -> SimPin {
        SimPin {
            bus: self.bus.clone(),
        }
    }

    pub fn delay(&self) -> SimDelay {
        SimDelay {
            bus: self.bus.clone(),
        }
    }

    pub fn now_us(&self) -> u64 {
        self.bus.borrow().now_ns / 1000
    }

    pub fn mode(&self) -> Mode {
        self.bus.borrow().mode
    }

    pub fn pin_ops(&self) -> usize {
        self.bus.borrow().pin_ops
    }
}

/// High-pulse widths encoding `bytes` MSB first.
pub fn widths_for(bytes: [u8; FRAME_LEN]) -> [u32; FRAME_BITS] {
    let mut widths = [ZERO_US; FRAME_BITS];
    for (i, width) in widths.iter_mut().enumerate() {
        if (bytes[i / 8] >> (7 - i % 8)) & 1 == 1 {
            *width = ONE_US;
        }
    }
    widths
}

/// Sensor response: ack pair, then a 50us low before each high data pulse,
/// then a trailing 50us low.
pub fn waveform(widths: &[u32]) -> Vec<Segment> {
    let mut segments = vec![(true, 20), (false, 80), (true, 80)];
    for &width in widths {
        segments.push((false, 50));
        segments.push((true, width));
    }
    segments.push((false, 50));
    segments
}

pub struct SimPin {
    bus: Rc<RefCell<Bus>>,
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let mut bus = self.bus.borrow_mut();
        assert_eq!(bus.mode, Mode::Input, "line sampled while driving it");
        bus.pin_ops += 1;
        Ok(bus.level())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        let mut bus = self.bus.borrow_mut();
        assert_eq!(bus.mode, Mode::Output, "level set in input mode");
        bus.pin_ops += 1;
        bus.driven_high = false;
        bus.low_since = Some(bus.now_ns);
        bus.armed = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let mut bus = self.bus.borrow_mut();
        assert_eq!(bus.mode, Mode::Output, "level set in input mode");
        bus.pin_ops += 1;
        if let Some(since) = bus.low_since.take() {
            bus.armed = bus.now_ns - since >= MIN_START_LOW_NS;
        }
        bus.driven_high = true;
        Ok(())
    }
}

impl DataLine for SimPin {
    fn set_output(&mut self) -> Result<(), Self::Error> {
        let mut bus = self.bus.borrow_mut();
        bus.pin_ops += 1;
        bus.mode = Mode::Output;
        bus.response_start = None;
        Ok(())
    }

    fn set_input(&mut self) -> Result<(), Self::Error> {
        let mut bus = self.bus.borrow_mut();
        bus.pin_ops += 1;
        bus.mode = Mode::Input;
        if bus.armed && bus.driven_high {
            bus.armed = false;
            bus.response_start = Some(bus.now_ns);
        }
        Ok(())
    }
}

pub struct SimDelay {
    bus: Rc<RefCell<Bus>>,
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.bus.borrow_mut().now_ns += u64::from(ns);
    }
}
