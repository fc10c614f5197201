//! The base-station role.
//!
//! The base station rests on channel 0 under its reserved sentinel
//! address and never initiates traffic: it listens for status updates
//! from the fixed sensor population and keeps the authoritative vacancy
//! registry. Every registry entry point is gated on
//! [`is_valid_sensor_node`](BaseStation::is_valid_sensor_node), so an
//! out-of-range id from the air can never index out of bounds.

use heapless::Vec;

use crate::InitError;
use crate::addressing::NodeId;
use crate::config::{ConfigError, LinkConfig};
use crate::consts::{MAX_PAYLOAD_LEN, MAX_SENSOR_NODES};
use crate::link::RadioLink;
use crate::message::{Header, MessageKind, UpdateMessage};
use crate::radio::Transceiver;

/// The mesh's single collector of occupancy state.
#[derive(Debug)]
pub struct BaseStation<R: Transceiver> {
    link: RadioLink<R>,
    /// Vacancy per sensor node; slot `i` holds node id `i + 1`.
    registry: Vec<bool, MAX_SENSOR_NODES>,
}

impl<R: Transceiver> BaseStation<R> {
    /// Builds a base station tracking sensor node ids `1..=population`.
    ///
    /// Every registry entry starts as occupied: a space is only reported
    /// free once its node has said so.
    pub fn new(radio: R, population: usize, config: LinkConfig) -> Result<Self, ConfigError> {
        config.check_population(population)?;
        let mut registry = Vec::new();
        for _ in 0..population {
            // Capacity was just validated.
            let _ = registry.push(false);
        }
        Ok(Self {
            link: RadioLink::new(radio, NodeId::BASE_STATION, config)?,
            registry,
        })
    }

    /// Starts the radio and begins listening on the station's own
    /// channel and sentinel address.
    pub fn init(&mut self) -> Result<(), InitError> {
        self.link.init()
    }

    /// The station's id (always 0).
    pub fn id(&self) -> NodeId {
        self.link.id()
    }

    /// Number of sensor nodes the registry tracks.
    pub fn population(&self) -> usize {
        self.registry.len()
    }

    /// Whether `id` names a sensor node in the known population.
    pub fn is_valid_sensor_node(&self, id: NodeId) -> bool {
        let raw = usize::from(id.raw());
        raw >= 1 && raw <= self.registry.len()
    }

    /// Overwrites the vacancy flag for `id`.
    ///
    /// Returns whether the write happened; an id outside the population
    /// leaves the registry untouched.
    pub fn update_node_status(&mut self, id: NodeId, is_vacant: bool) -> bool {
        if !self.is_valid_sensor_node(id) {
            return false;
        }
        self.registry[usize::from(id.raw()) - 1] = is_vacant;
        true
    }

    /// The stored vacancy flag for `id`, or `None` for an id outside the
    /// population.
    pub fn get_node_status(&self, id: NodeId) -> Option<bool> {
        if !self.is_valid_sensor_node(id) {
            return None;
        }
        Some(self.registry[usize::from(id.raw()) - 1])
    }

    /// Counts the spaces currently marked vacant.
    ///
    /// Recomputed from the authoritative registry on every call; with the
    /// small fixed population there is nothing to gain from an
    /// incremental counter that could drift.
    pub fn num_vacant(&self) -> usize {
        self.registry.iter().filter(|vacant| **vacant).count()
    }

    /// One step of the receive-driven update loop.
    ///
    /// Probes for a waiting frame, parses the header, branches on the
    /// kind and applies a status update to the registry. Returns the
    /// applied update, or `None` when nothing was waiting or the frame
    /// was dropped because it was malformed or its sender is outside the
    /// population; both cases are logged, neither escalated.
    pub fn poll(&mut self) -> Option<UpdateMessage> {
        let mut buf = [0u8; MAX_PAYLOAD_LEN];
        if !self.link.read_frame(&mut buf) {
            return None;
        }

        let header = match Header::from_bytes(&buf) {
            Ok(header) => header,
            Err(_err) => {
                #[cfg(feature = "log")]
                log::warn!("dropping malformed frame: {}", _err);
                return None;
            }
        };

        match header.kind() {
            MessageKind::StatusUpdate => {
                let msg = match UpdateMessage::from_bytes(&buf) {
                    Ok(msg) => msg,
                    Err(_err) => {
                        #[cfg(feature = "log")]
                        log::warn!("dropping malformed status update: {}", _err);
                        return None;
                    }
                };
                if !self.update_node_status(msg.header.tx_id, msg.is_vacant) {
                    #[cfg(feature = "log")]
                    log::warn!(
                        "dropping status update from unknown node {}",
                        msg.header.tx_id.raw()
                    );
                    return None;
                }
                Some(msg)
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn link_mut(&mut self) -> &mut RadioLink<R> {
        &mut self.link
    }
}
