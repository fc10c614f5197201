//! The sensor-node role.
//!
//! A sensor node watches one parking space with a time-of-flight
//! rangefinder and reports every occupancy change to the base station over
//! the arbitrated link. One [`service`](SensorNode::service) call is one
//! step of the device's polling loop: sense, detect a change, send.
//!
//! ## Status mapping
//!
//! The rangefinder's outcome maps to occupancy as the original deployment
//! defined it:
//!
//! | [`RangeStatus`]  | Mapped status |
//! |------------------|---------------|
//! | `Converged`      | Occupied      |
//! | `NoConverge`     | Vacant        |
//! | `Fault`          | no change     |
//!
//! Note the domain assumption baked into the second row: a measurement
//! that fails to converge is taken as a definitive "nothing parked here",
//! not as an ambiguous reading. That holds for a sensor aimed down at a
//! parking space from short range, but it does conflate a failed reading
//! with an intentional out-of-range result.

use embedded_hal::delay::DelayNs;
use rand_core::RngCore;

use crate::InitError;
use crate::addressing::NodeId;
use crate::config::{ConfigError, LinkConfig};
use crate::link::{LinkError, RadioLink};
use crate::message::UpdateMessage;
use crate::radio::Transceiver;
use crate::sensor::{OccupancySensor, OccupancyStatus, RangeStatus};

/// One battery-powered parking-space sensor.
#[derive(Debug)]
pub struct SensorNode<R, S, D, G>
where
    R: Transceiver,
    S: OccupancySensor,
    D: DelayNs,
    G: RngCore,
{
    link: RadioLink<R>,
    sensor: S,
    delay: D,
    rng: G,
    status: OccupancyStatus,
}

impl<R, S, D, G> SensorNode<R, S, D, G>
where
    R: Transceiver,
    S: OccupancySensor,
    D: DelayNs,
    G: RngCore,
{
    /// Builds a sensor node with the given id.
    ///
    /// Id 0 belongs to the base station and is rejected, as is any id
    /// whose derived channel falls outside the legal range.
    pub fn new(
        radio: R,
        sensor: S,
        delay: D,
        rng: G,
        id: NodeId,
        config: LinkConfig,
    ) -> Result<Self, ConfigError> {
        if id.is_base_station() {
            return Err(ConfigError::ReservedNodeId);
        }
        Ok(Self {
            link: RadioLink::new(radio, id, config)?,
            sensor,
            delay,
            rng,
            status: OccupancyStatus::Unknown,
        })
    }

    /// Starts the sensor and the radio.
    ///
    /// Either failing is fatal to the device; no retry happens here.
    pub fn init(&mut self) -> Result<(), InitError> {
        if !self.sensor.begin() {
            return Err(InitError::Sensor);
        }
        self.link.init()
    }

    /// This node's id.
    pub fn id(&self) -> NodeId {
        self.link.id()
    }

    /// The currently stored occupancy status.
    pub fn status(&self) -> OccupancyStatus {
        self.status
    }

    /// Takes one reading and folds it into the stored status.
    ///
    /// Returns whether the stored status changed. Sensor faults are logged
    /// and reported as "no change"; the stored status is only overwritten
    /// when a recognized reading differs from it.
    pub fn poll_and_detect_change(&mut self) -> bool {
        self.sensor.trigger_reading();
        let mapped = match self.sensor.read_status() {
            RangeStatus::Converged => OccupancyStatus::Occupied,
            RangeStatus::NoConverge => OccupancyStatus::Vacant,
            RangeStatus::Fault => {
                #[cfg(feature = "log")]
                log::warn!("range sensor read error");
                return false;
            }
        };

        if mapped == self.status {
            return false;
        }

        #[cfg(feature = "log")]
        {
            if mapped == OccupancyStatus::Vacant {
                log::info!("parking space is now vacant");
            } else {
                log::info!("parking space is now occupied");
            }
        }
        self.status = mapped;
        true
    }

    /// Sends the current occupancy status to `to` over the arbitrated
    /// link.
    pub fn transmit_update(&mut self, to: NodeId) -> Result<(), LinkError> {
        let is_vacant = self.status == OccupancyStatus::Vacant;
        let msg = UpdateMessage::new(to, self.link.id(), is_vacant);
        self.link
            .transmit(&mut self.delay, &mut self.rng, to, &msg.to_bytes())
    }

    /// One step of the device's control loop: poll the sensor and, on a
    /// change, send an update to the base station.
    ///
    /// Returns whether a change was detected. A failed send is reported
    /// but not re-queued; the next detected change (or the caller's next
    /// retry) is the natural recovery point.
    pub fn service(&mut self) -> Result<bool, LinkError> {
        if !self.poll_and_detect_change() {
            return Ok(false);
        }
        self.transmit_update(NodeId::BASE_STATION)?;
        Ok(true)
    }

    /// Non-blocking probe for a frame addressed to this node.
    pub fn available(&mut self) -> bool {
        self.link.available()
    }

    /// Reads a waiting frame into `buf`. Returns `false` if nothing was
    /// waiting.
    pub fn read_frame(&mut self, buf: &mut [u8]) -> bool {
        self.link.read_frame(buf)
    }

    /// Runs the polling loop forever, one [`service`](SensorNode::service)
    /// step every `poll_interval_ms`.
    ///
    /// Intended for single-purpose polling firmware; send failures are
    /// absorbed and retried on later cycles.
    pub fn run_polling_loop(&mut self, poll_interval_ms: u32) -> ! {
        loop {
            let _ = self.service();
            self.delay.delay_ms(poll_interval_ms);
        }
    }

    #[cfg(test)]
    pub(crate) fn link_mut(&mut self) -> &mut RadioLink<R> {
        &mut self.link
    }
}
