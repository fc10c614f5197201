//! Node identity and radio address derivation.
//!
//! Every device in the mesh is identified by a compact [`NodeId`]: id 0 is
//! the base station, ids 1..N are sensor nodes. The node's radio address
//! (and, together with the configured spacing, its channel) is a pure
//! function of that id, so the topology is fixed and computed rather than
//! discovered.
//!
//! The address formula repeats the id byte across all four address bytes.
//! Id 0 would produce the all-zero address, which nRF24L01-class parts
//! reject, so the base station carries the reserved sentinel
//! [`BASE_STATION_ADDRESS`](crate::consts::BASE_STATION_ADDRESS) instead.
//! Both mappings are injective over the full id range.

use crate::consts::{BASE_STATION_ADDRESS, BASE_STATION_ID};

/// A 32-bit over-the-air radio address.
pub type RadioAddress = u32;

/// A transceiver channel number (0-125).
pub type RadioChannel = u8;

/// Identity of one device in the mesh.
///
/// Ids are trusted bytes at this layer; whether an id belongs to the known
/// sensor population is decided one layer up, by
/// [`BaseStation::is_valid_sensor_node`](crate::station::BaseStation::is_valid_sensor_node).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct NodeId(u8);

impl NodeId {
    /// The base station's id.
    pub const BASE_STATION: NodeId = NodeId(BASE_STATION_ID);

    /// Wraps a raw id byte.
    pub const fn new(id: u8) -> Self {
        NodeId(id)
    }

    /// The raw id byte.
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Whether this id is the base station's.
    pub const fn is_base_station(self) -> bool {
        self.0 == BASE_STATION_ID
    }

    /// Derives the node's unique radio address.
    ///
    /// The base station maps to the reserved sentinel; every other id maps
    /// to its id byte repeated across all four address bytes. Pure and
    /// total, with no failure path.
    pub const fn radio_address(self) -> RadioAddress {
        if self.is_base_station() {
            return BASE_STATION_ADDRESS;
        }
        u32::from_le_bytes([self.0, self.0, self.0, self.0])
    }
}
