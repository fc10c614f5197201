//! The occupancy-sensor boundary.
//!
//! A sensor node decides occupancy from a time-of-flight rangefinder
//! (VL6180X-class) mounted above the parking space. The protocol only ever
//! consumes the driver's ternary read outcome; raw range telemetry never
//! crosses this boundary.

/// Outcome of one range reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum RangeStatus {
    /// The measurement converged on a target in range.
    Converged,
    /// The measurement found nothing to converge on.
    NoConverge,
    /// Any other sensor error.
    Fault,
}

/// The capability set the sensor role requires from a rangefinder driver.
pub trait OccupancySensor {
    /// Powers up the sensor. `false` is a fatal configuration failure.
    fn begin(&mut self) -> bool;

    /// Starts a range measurement.
    fn trigger_reading(&mut self);

    /// Reads the status of the last triggered measurement.
    fn read_status(&mut self) -> RangeStatus;
}

/// A parking space's occupancy as tracked by a sensor node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum OccupancyStatus {
    /// No valid reading has been mapped yet.
    #[default]
    Unknown,
    /// A vehicle is parked in the space.
    Occupied,
    /// The space is empty.
    Vacant,
}
