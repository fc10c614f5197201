//! # parkmesh
//!
//! A portable, no_std coordination protocol for small parking-occupancy
//! sensor meshes built on nRF24L01-class 2.4 GHz transceivers.
//!
//! Battery-powered sensor nodes watch one parking space each and report
//! occupancy changes to a base station over a shared half-duplex radio
//! medium, with no central scheduler. The crate implements the parts of
//! that system that have real protocol content:
//!
//! - deterministic per-node radio **addressing and channel assignment**
//!   derived from a compact node id ([`addressing`])
//! - the **carrier-sense / randomized-backoff transmit arbitration** that
//!   visits a peer's channel, senses for contention, sends, and always
//!   restores the node's own listening configuration ([`link`])
//! - fixed-layout **status message framing** shared by both roles
//!   ([`message`])
//! - the two device roles layered on top: [`node::SensorNode`] and
//!   [`station::BaseStation`]
//!
//! Hardware access is abstracted behind two narrow traits,
//! [`radio::Transceiver`] and [`sensor::OccupancySensor`], so the whole
//! protocol runs deterministically against scripted mocks in tests.
//!
//! ## Crate features
//! | Feature     | Description |
//! |-------------|-------------|
//! | `std`       | Disables `#![no_std]` support |
//! | `defmt-0-3` | Derives `defmt::Format` on public types |
//! | `log`       | Emits protocol events through the `log` crate |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use parkmesh::addressing::NodeId;
//! use parkmesh::config::LinkConfig;
//! use parkmesh::node::SensorNode;
//!
//! let mut node = SensorNode::new(radio, sensor, delay, rng, NodeId::new(2), LinkConfig::default())?;
//! node.init()?;
//! loop {
//!     // One sense -> decide -> act step; sends an update on every
//!     // occupancy change.
//!     let _ = node.service();
//!     delay_ms(500);
//! }
//! ```
//!
//! ## Integration Notes
//!
//! - One logical polling loop per device; no interrupt reentrancy. The
//!   transceiver is the single exclusive resource and only the transmit
//!   protocol may move it off its resting configuration.
//! - Both ends must agree on the [`config::LinkConfig`] channel spacing,
//!   or they will derive different channels for the same id.
//! - The wire format is a raw fixed-byte layout with no endianness
//!   negotiation; see [`message`].
//!
//! --
//! Designed for `#![no_std]` use in resource-constrained embedded environments.

#![deny(
    bad_style,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces
)]
#![cfg_attr(not(feature = "std"), no_std)]

pub use heapless;

pub mod addressing;
pub mod config;
pub mod consts;
pub mod link;
pub mod message;
pub mod node;
pub mod radio;
pub mod sensor;
pub mod station;

#[cfg(test)]
pub(crate) mod testutil;

use thiserror::Error;

/// Fatal device start-up failures.
///
/// Initialization failures are not retried at this layer; the operator or
/// supervising firmware is expected to restart the device.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum InitError {
    /// The radio transceiver failed to start.
    #[error("radio transceiver failed to start")]
    Radio,
    /// The occupancy sensor failed to start.
    #[error("occupancy sensor failed to start")]
    Sensor,
}
