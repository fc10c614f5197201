//! The transceiver boundary.
//!
//! The protocol treats the radio as an unreliable, half-duplex link that
//! can hold exactly one `{channel, pipe}` configuration at a time. This
//! module defines the capability set the protocol needs from it; any
//! implementation honoring the contract is substitutable, whether a real
//! nRF24L01 driver or a scripted mock, which is what makes the
//! arbitration state machine unit-testable without hardware.

use crate::addressing::{RadioAddress, RadioChannel};

/// Transmit power level, in the nRF24L01's four steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum PaLevel {
    /// -18 dBm.
    Min,
    /// -12 dBm.
    Low,
    /// -6 dBm.
    High,
    /// 0 dBm.
    #[default]
    Max,
}

/// Hardware auto-retransmit policy, applied once at init.
///
/// The link layer relies on this for single-attempt reliability and never
/// re-implements retries itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct RetryPolicy {
    /// Minimum spacing between attempts, in 250 us units.
    pub delay: u8,
    /// Maximum number of attempts.
    pub count: u8,
}

/// Everything [`Transceiver::configure`] establishes at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct RadioConfig {
    /// The node's own resting channel.
    pub channel: RadioChannel,
    /// Address width in bytes.
    pub address_width: u8,
    /// Transmit power.
    pub pa_level: PaLevel,
    /// Auto-retransmit policy.
    pub retries: RetryPolicy,
    /// Whether received frames are acknowledged automatically.
    pub auto_ack: bool,
}

/// The capability set the protocol requires from a radio driver.
///
/// Fallible operations report plain success/failure the way the underlying
/// hardware drivers do; the link layer converts them into typed errors.
pub trait Transceiver {
    /// Powers up the radio. `false` is a fatal configuration failure.
    fn begin(&mut self) -> bool;

    /// Applies the start-up configuration. Called once, after
    /// [`begin`](Transceiver::begin).
    fn configure(&mut self, config: &RadioConfig);

    /// Tunes the radio to `channel`.
    fn set_channel(&mut self, channel: RadioChannel);

    /// Opens reading pipe `pipe` on `address`.
    fn open_read_pipe(&mut self, pipe: u8, address: RadioAddress);

    /// Closes reading pipe `pipe`.
    fn close_read_pipe(&mut self, pipe: u8);

    /// Directs subsequent sends at `address`.
    fn open_write_pipe(&mut self, address: RadioAddress);

    /// Enters receive mode on the current channel and open pipes.
    fn start_listening(&mut self);

    /// Leaves receive mode so the radio can transmit.
    fn stop_listening(&mut self);

    /// Whether a carrier is currently present on the tuned channel.
    fn sense_carrier(&mut self) -> bool;

    /// Blocking send with acknowledgment.
    ///
    /// Applies the configured [`RetryPolicy`] internally; a `false` return
    /// means the frame went unacknowledged after every attempt.
    fn send(&mut self, frame: &[u8]) -> bool;

    /// Whether a received frame is waiting to be read.
    fn available(&mut self) -> bool;

    /// Reads the waiting frame into `buf`.
    fn read(&mut self, buf: &mut [u8]);
}
