//! Link arbitration and the transmit protocol.
//!
//! This module implements the collision-avoidance state machine at the
//! heart of the mesh. Each node rests on its own derived channel,
//! listening. To talk to a peer, [`RadioLink::transmit`] briefly "visits"
//! the peer's channel: it retunes, senses the medium, backs off a random
//! interval while the channel is busy, performs one acknowledged send, and
//! then restores its own listening configuration.
//!
//! Channel-per-node (rather than one shared channel with address-only
//! separation) keeps unrelated node pairs from interfering with each
//! other, at the cost of an explicit retune on every transmit. That is
//! why the protocol's core safety invariant is that **every** exit path,
//! success or failure, leaves the radio back on the node's own channel
//! with its reading pipe open.
//!
//! Both waits in the protocol are bounded by attempt counts, never by
//! wall-clock deadlines: the carrier-sense loop runs at most
//! `channel_checks_max` probes, and the acknowledged send applies the
//! hardware's bounded retry policy.

use embedded_hal::delay::DelayNs;
use rand_core::RngCore;
use thiserror::Error;

use crate::InitError;
use crate::addressing::{NodeId, RadioAddress, RadioChannel};
use crate::config::{ConfigError, LinkConfig};
use crate::consts::{ADDRESS_WIDTH, MAX_PAYLOAD_LEN, READ_PIPE};
use crate::radio::{RadioConfig, Transceiver};

/// A transmit attempt that did not deliver its frame.
///
/// Both variants leave the radio restored to its resting configuration.
/// Neither is escalated here: the caller's next poll cycle is the natural
/// retry point.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum LinkError {
    /// The peer's channel stayed busy through every carrier probe; the
    /// send was never attempted.
    #[error("peer channel busy after every carrier probe")]
    ChannelBusy,
    /// The carrier was clear but the acknowledged send failed after the
    /// hardware's internal retries.
    #[error("send went unacknowledged after hardware retries")]
    SendFailed,
    /// The frame exceeds the transceiver's payload width. Rejected before
    /// any radio state is touched.
    #[error("frame of {len} bytes exceeds the transceiver payload width")]
    FrameTooLong {
        /// Length of the rejected frame.
        len: usize,
    },
}

/// Where the link currently is in the transmit sequence.
///
/// At rest the link is always [`Idle`](LinkState::Idle); the other states
/// exist only inside a [`RadioLink::transmit`] call and are exposed for
/// inspection and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum LinkState {
    /// Listening on the node's own channel.
    #[default]
    Idle,
    /// Tuned to a peer's channel, sensing for contention.
    Switching,
    /// Performing the acknowledged send.
    Sending,
    /// Re-establishing the node's own listening configuration.
    Restoring,
}

/// The node's half of the shared medium.
///
/// Owns the transceiver exclusively: nothing else may retune the radio
/// away from the resting configuration, and in the single-threaded polling
/// model the retune/arbitrate/send/restore sequence always runs to
/// completion before any other logic touches the radio.
#[derive(Debug)]
pub struct RadioLink<R: Transceiver> {
    radio: R,
    id: NodeId,
    address: RadioAddress,
    channel: RadioChannel,
    config: LinkConfig,
    state: LinkState,
}

impl<R: Transceiver> RadioLink<R> {
    /// Builds a link for `id`, validating the channel plan.
    pub fn new(radio: R, id: NodeId, config: LinkConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let channel = config.check_channel(id)?;
        Ok(Self {
            radio,
            id,
            address: id.radio_address(),
            channel,
            config,
            state: LinkState::Idle,
        })
    }

    /// Starts the radio and establishes the resting configuration: own
    /// channel, own reading pipe open, listening.
    pub fn init(&mut self) -> Result<(), InitError> {
        if !self.radio.begin() {
            return Err(InitError::Radio);
        }
        self.radio.configure(&RadioConfig {
            channel: self.channel,
            address_width: ADDRESS_WIDTH,
            pa_level: self.config.pa_level,
            retries: self.config.retries,
            auto_ack: self.config.auto_ack,
        });
        self.radio.open_read_pipe(READ_PIPE, self.address);
        self.radio.start_listening();
        self.state = LinkState::Idle;
        Ok(())
    }

    /// This node's id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// This node's resting channel.
    pub fn channel(&self) -> RadioChannel {
        self.channel
    }

    /// This node's radio address.
    pub fn address(&self) -> RadioAddress {
        self.address
    }

    /// Where the link is in the transmit sequence.
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// The active configuration.
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Arbitrates for the peer's channel and performs one acknowledged
    /// send of `frame`.
    ///
    /// The sequence: retune to the peer's channel, probe the carrier up to
    /// `channel_checks_max` times (sleeping a uniform random
    /// `busy_delay_min_ms..=busy_delay_max_ms` between busy probes, so
    /// nodes waking simultaneously fall out of lockstep), then stop
    /// listening, open a write pipe to the peer, copy the frame into a
    /// fixed send buffer and send once. The transceiver's configured retry
    /// policy provides single-attempt reliability; this layer never
    /// re-sends.
    ///
    /// On every exit (delivered, channel busy, or unacknowledged) the
    /// radio is restored to the node's own channel with its reading pipe
    /// open and listening resumed before this returns.
    pub fn transmit<D: DelayNs, G: RngCore>(
        &mut self,
        delay: &mut D,
        rng: &mut G,
        to: NodeId,
        frame: &[u8],
    ) -> Result<(), LinkError> {
        if frame.len() > MAX_PAYLOAD_LEN {
            return Err(LinkError::FrameTooLong { len: frame.len() });
        }

        let peer_address = to.radio_address();
        let peer_channel = self.config.channel_for(to);

        // Visit the peer's channel. The reading pipe stays untouched until
        // the carrier is known to be clear.
        self.state = LinkState::Switching;
        self.radio.set_channel(peer_channel);

        if !self.wait_for_clear_channel(delay, rng, peer_channel) {
            // Too much traffic. The radio never left listen mode, so
            // restoring means retuning and reopening the pipe.
            self.state = LinkState::Restoring;
            self.radio.set_channel(self.channel);
            self.radio.open_read_pipe(READ_PIPE, self.address);
            self.state = LinkState::Idle;
            return Err(LinkError::ChannelBusy);
        }

        self.state = LinkState::Sending;
        self.radio.stop_listening();
        self.radio.close_read_pipe(READ_PIPE);
        self.radio.open_write_pipe(peer_address);

        // Defensive copy: the frame on the air must not alias a buffer the
        // caller could still mutate.
        let mut buf = [0u8; MAX_PAYLOAD_LEN];
        buf[..frame.len()].copy_from_slice(frame);
        let sent = self.radio.send(&buf[..frame.len()]);

        self.state = LinkState::Restoring;
        self.radio.set_channel(self.channel);
        self.radio.open_read_pipe(READ_PIPE, self.address);
        self.radio.start_listening();
        self.state = LinkState::Idle;

        if sent {
            Ok(())
        } else {
            #[cfg(feature = "log")]
            log::warn!(
                "send to node {} on channel {} went unacknowledged",
                to.raw(),
                peer_channel
            );
            Err(LinkError::SendFailed)
        }
    }

    /// Probes the tuned channel until it is clear or the probe budget runs
    /// out. Returns whether the channel came up clear.
    fn wait_for_clear_channel<D: DelayNs, G: RngCore>(
        &mut self,
        delay: &mut D,
        rng: &mut G,
        peer_channel: RadioChannel,
    ) -> bool {
        for attempt in 0..self.config.channel_checks_max {
            if !self.radio.sense_carrier() {
                return true;
            }
            // Skip the sleep after the final probe; the attempt budget is
            // already spent.
            if attempt + 1 == self.config.channel_checks_max {
                break;
            }
            let backoff = self.backoff_ms(rng);
            #[cfg(feature = "log")]
            log::info!("channel {} is busy, waiting {} ms", peer_channel, backoff);
            #[cfg(not(feature = "log"))]
            let _ = peer_channel;
            delay.delay_ms(backoff);
        }
        false
    }

    /// Draws a backoff uniformly from the configured window, inclusive.
    fn backoff_ms<G: RngCore>(&self, rng: &mut G) -> u32 {
        let min = self.config.busy_delay_min_ms;
        let max = self.config.busy_delay_max_ms;
        if min >= max {
            return min;
        }
        min + rng.next_u32() % (max - min + 1)
    }

    /// Non-blocking probe for a waiting frame on the node's own channel
    /// and address.
    pub fn available(&mut self) -> bool {
        self.radio.available()
    }

    /// Reads a waiting frame into `buf`. Returns `false` if nothing was
    /// waiting.
    ///
    /// There is no queueing at this layer; a frame not read before the
    /// next arrives is the driver's concern.
    pub fn read_frame(&mut self, buf: &mut [u8]) -> bool {
        if !self.radio.available() {
            return false;
        }
        self.radio.read(buf);
        true
    }

    /// Releases the transceiver.
    pub fn release(self) -> R {
        self.radio
    }

    #[cfg(test)]
    pub(crate) fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::CHANNEL_CHECKS_MAX;
    use crate::testutil::{FixedRng, MockTransceiver, Op, RecordingDelay};
    use embedded_hal_mock::eh1::delay::NoopDelay;

    fn link(radio: MockTransceiver) -> RadioLink<MockTransceiver> {
        let mut link = RadioLink::new(radio, NodeId::new(2), LinkConfig::default()).unwrap();
        link.init().unwrap();
        link
    }

    #[test]
    fn test_init_establishes_resting_configuration() {
        let link = link(MockTransceiver::new());
        let radio = link.release();
        assert_eq!(radio.channel, 10);
        assert_eq!(radio.read_pipe, Some((READ_PIPE, NodeId::new(2).radio_address())));
        assert!(radio.listening);
        let config = radio.config.unwrap();
        assert_eq!(config.address_width, ADDRESS_WIDTH);
        assert!(config.auto_ack);
        assert_eq!(config.retries.count, 15);
    }

    #[test]
    fn test_init_failure_is_fatal() {
        let mut radio = MockTransceiver::new();
        radio.begin_ok = false;
        let mut link = RadioLink::new(radio, NodeId::new(2), LinkConfig::default()).unwrap();
        assert_eq!(link.init(), Err(InitError::Radio));
    }

    #[test]
    fn test_transmit_success_visits_peer_and_restores() {
        let mut link = link(MockTransceiver::new());
        link.radio_mut().ops.clear();

        let frame = [0u8, 2, 1, 1];
        let result = link.transmit(
            &mut NoopDelay::new(),
            &mut FixedRng::new(&[0]),
            NodeId::BASE_STATION,
            &frame,
        );
        assert_eq!(result, Ok(()));
        assert_eq!(link.state(), LinkState::Idle);

        let radio = link.release();
        assert_eq!(
            radio.ops,
            vec![
                Op::SetChannel(0),
                Op::SenseCarrier,
                Op::StopListening,
                Op::CloseReadPipe(READ_PIPE),
                Op::OpenWritePipe(0xBAD1_DEA5),
                Op::Send,
                Op::SetChannel(10),
                Op::OpenReadPipe(READ_PIPE, 0x02020202),
                Op::StartListening,
            ]
        );
        assert_eq!(radio.sent, vec![(0xBAD1_DEA5, frame.to_vec())]);
        // Resting configuration restored.
        assert_eq!(radio.channel, 10);
        assert!(radio.listening);
        assert_eq!(radio.read_pipe, Some((READ_PIPE, 0x02020202)));
    }

    #[test]
    fn test_busy_channel_aborts_without_sending() {
        let mut radio = MockTransceiver::new();
        radio.carrier_busy = true;
        let mut link = link(radio);
        link.radio_mut().ops.clear();

        let mut delay = RecordingDelay::new();
        let result = link.transmit(
            &mut delay,
            &mut FixedRng::new(&[3, 17, 50]),
            NodeId::BASE_STATION,
            &[0, 2, 1, 1],
        );
        assert_eq!(result, Err(LinkError::ChannelBusy));
        assert_eq!(link.state(), LinkState::Idle);

        let radio = link.release();
        // All probes spent, send never invoked, listen never interrupted.
        assert_eq!(
            radio.ops.iter().filter(|op| **op == Op::SenseCarrier).count(),
            usize::from(CHANNEL_CHECKS_MAX)
        );
        assert!(!radio.ops.contains(&Op::Send));
        assert!(!radio.ops.contains(&Op::StopListening));
        assert!(radio.sent.is_empty());
        // Resting configuration restored.
        assert_eq!(radio.channel, 10);
        assert!(radio.listening);
        assert_eq!(radio.read_pipe, Some((READ_PIPE, 0x02020202)));
        // One backoff sleep between each pair of probes.
        assert_eq!(delay.sleeps_ms().len(), usize::from(CHANNEL_CHECKS_MAX) - 1);
    }

    #[test]
    fn test_backoff_stays_within_window() {
        use rand::SeedableRng;
        use rand::rngs::SmallRng;

        let mut radio = MockTransceiver::new();
        radio.carrier_busy = true;
        let mut link = link(radio);
        let mut delay = RecordingDelay::new();
        let mut rng = SmallRng::seed_from_u64(0xC0FFEE);

        let _ = link.transmit(&mut delay, &mut rng, NodeId::BASE_STATION, &[0, 2, 1, 0]);
        let sleeps = delay.sleeps_ms();
        assert!(!sleeps.is_empty());
        for ms in sleeps {
            assert!((25..=100).contains(&ms), "backoff {ms} ms outside window");
        }
    }

    #[test]
    fn test_unacknowledged_send_reports_failure_and_restores() {
        let mut radio = MockTransceiver::new();
        radio.send_ok = false;
        let mut link = link(radio);

        let result = link.transmit(
            &mut NoopDelay::new(),
            &mut FixedRng::new(&[0]),
            NodeId::BASE_STATION,
            &[0, 2, 1, 0],
        );
        assert_eq!(result, Err(LinkError::SendFailed));
        assert_eq!(link.state(), LinkState::Idle);

        let radio = link.release();
        // The attempt was made, then the resting configuration came back.
        assert_eq!(radio.ops.iter().filter(|op| **op == Op::Send).count(), 1);
        assert_eq!(radio.channel, 10);
        assert!(radio.listening);
        assert_eq!(radio.read_pipe, Some((READ_PIPE, 0x02020202)));
    }

    #[test]
    fn test_oversized_frame_rejected_before_radio_is_touched() {
        let mut link = link(MockTransceiver::new());
        link.radio_mut().ops.clear();

        let frame = [0u8; MAX_PAYLOAD_LEN + 1];
        let result = link.transmit(
            &mut NoopDelay::new(),
            &mut FixedRng::new(&[0]),
            NodeId::BASE_STATION,
            &frame,
        );
        assert_eq!(result, Err(LinkError::FrameTooLong { len: 33 }));
        assert!(link.release().ops.is_empty());
    }

    #[test]
    fn test_read_frame_is_non_blocking() {
        let mut link = link(MockTransceiver::new());
        let mut buf = [0u8; 4];
        assert!(!link.available());
        assert!(!link.read_frame(&mut buf));

        link.radio_mut().rx_frames.push_back(vec![0, 2, 1, 1]);
        assert!(link.available());
        assert!(link.read_frame(&mut buf));
        assert_eq!(buf, [0, 2, 1, 1]);
        assert!(!link.available());
    }

    #[test]
    fn test_channel_plan_rejected_at_construction() {
        let config = LinkConfig::default();
        assert!(matches!(
            RadioLink::new(MockTransceiver::new(), NodeId::new(26), config),
            Err(ConfigError::ChannelOutOfRange { .. })
        ));
    }
}
