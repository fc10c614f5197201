//! Constants used across the mesh coordination protocol.
//!
//! This module defines the protocol-wide constants for addressing, channel
//! layout, medium arbitration and frame sizing. The defaults mirror the
//! values the original parking-lot deployment shipped with; everything that
//! a test may want to vary is also carried by [`crate::config::LinkConfig`]
//! so edge values can be exercised without recompilation.
//!
//! ## Key Concepts
//!
//! - **Node ids**: id 0 is always the base station; ids 1..N are sensor
//!   nodes. Addresses and channels are computed from the id, never
//!   negotiated.
//! - **Channel spacing**: consecutive ids are spaced several channels apart
//!   so that no two node channels are adjacent (adjacent-channel
//!   interference guard).
//! - **Arbitration bounds**: every wait in the protocol is bounded by an
//!   attempt count, never by a wall-clock deadline.

/// Node id reserved for the base station.
pub const BASE_STATION_ID: u8 = 0;

/// Fixed radio address of the base station.
///
/// The general derivation formula would map id 0 to the all-zero address,
/// which nRF24L01-class transceivers treat as invalid, so the base station
/// gets a reserved sentinel that the formula can never produce.
pub const BASE_STATION_ADDRESS: u32 = 0xBAD1_DEA5;

/// Width of a radio address in bytes.
pub const ADDRESS_WIDTH: u8 = 4;

/// Pipe index used for the node's own reading pipe.
pub const READ_PIPE: u8 = 1;

/// Default number of channels between consecutive node channels.
///
/// Must be at least 2 to keep distinct node channels non-adjacent.
pub const CHANNEL_SPACING: u8 = 5;

/// Highest channel the transceiver can legally be tuned to.
pub const MAX_CHANNEL: u8 = 125;

/// Largest sensor-node population any configuration can address.
///
/// With the default spacing the top channel is `25 * 5 = 125`, exactly the
/// legal limit. Sizes the base station's registry storage.
pub const MAX_SENSOR_NODES: usize = 25;

/// Maximum number of hardware-level send attempts per [`send`] call.
///
/// Applied by the transceiver's internal auto-retransmit machinery, not by
/// the link layer.
///
/// [`send`]: crate::radio::Transceiver::send
pub const MAX_SEND_ATTEMPTS: u8 = 15;

/// Minimum spacing between hardware send attempts, in 250 us units.
pub const FAILED_SEND_DELAY: u8 = 15;

/// Number of carrier probes before a transmit attempt is abandoned.
pub const CHANNEL_CHECKS_MAX: u8 = 10;

/// Lower bound of the randomized busy-channel backoff, in milliseconds.
pub const CHANNEL_BUSY_DELAY_MIN_MS: u32 = 25;

/// Upper bound of the randomized busy-channel backoff, in milliseconds.
pub const CHANNEL_BUSY_DELAY_MAX_MS: u32 = 100;

/// Largest frame the transceiver can carry in one transmission.
///
/// nRF24L01-class parts have a 32 byte TX/RX FIFO.
pub const MAX_PAYLOAD_LEN: usize = 32;
