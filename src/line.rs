//! Single-wire data line abstraction.
//!
//! `embedded-hal` has no notion of pin direction, so the driver asks for a
//! [`DataLine`]: an input/output pin that can be switched between driving the
//! bus (open-drain output) and listening to it (input).

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

/// A bidirectional pin the sensor's data wire is attached to.
pub trait DataLine: InputPin + OutputPin {
    /// Switch the pin to open-drain output so the host can drive the bus.
    fn set_output(&mut self) -> Result<(), Self::Error>;

    /// Switch the pin to input and stop driving the bus.
    fn set_input(&mut self) -> Result<(), Self::Error>;
}

impl<T: DataLine + ?Sized> DataLine for &mut T {
    #[inline]
    fn set_output(&mut self) -> Result<(), Self::Error> {
        T::set_output(self)
    }

    #[inline]
    fn set_input(&mut self) -> Result<(), Self::Error> {
        T::set_input(self)
    }
}

/// Adapter for HAL pins that are permanently configured as open-drain
/// outputs with their input buffer enabled.
///
/// Such a pin never needs reconfiguring: driving it high releases the bus to
/// the pull-up, which is exactly what "input" means for a single-wire bus.
pub struct OpenDrain<P> {
    pin: P,
}

impl<P> OpenDrain<P>
where
    P: InputPin + OutputPin,
{
    /// Wraps an open-drain pin.
    pub fn new(pin: P) -> Self {
        OpenDrain { pin }
    }

    /// Returns the wrapped pin.
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: ErrorType> ErrorType for OpenDrain<P> {
    type Error = P::Error;
}

impl<P: InputPin> InputPin for OpenDrain<P> {
    #[inline]
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.pin.is_high()
    }

    #[inline]
    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.pin.is_low()
    }
}

impl<P: OutputPin> OutputPin for OpenDrain<P> {
    #[inline]
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.pin.set_low()
    }

    #[inline]
    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.pin.set_high()
    }
}

impl<P> DataLine for OpenDrain<P>
where
    P: InputPin + OutputPin,
{
    fn set_output(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_input(&mut self) -> Result<(), Self::Error> {
        // release
        self.pin.set_high()
    }
}
