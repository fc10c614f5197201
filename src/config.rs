//! Per-device link configuration.
//!
//! All protocol tunables live in one explicit [`LinkConfig`] passed to the
//! role constructors, rather than in process-wide constants, so tests can
//! exercise edge values (e.g. spacing 1 to probe the adjacent-channel
//! invariant) without recompilation. The defaults come from
//! [`crate::consts`] and match the original deployment.

use thiserror::Error;

use crate::addressing::{NodeId, RadioChannel};
use crate::consts::{
    CHANNEL_BUSY_DELAY_MAX_MS, CHANNEL_BUSY_DELAY_MIN_MS, CHANNEL_CHECKS_MAX, CHANNEL_SPACING,
    FAILED_SEND_DELAY, MAX_CHANNEL, MAX_SEND_ATTEMPTS, MAX_SENSOR_NODES,
};
use crate::radio::{PaLevel, RetryPolicy};

/// A configuration rejected at construction time.
///
/// These are deployment mistakes, not runtime faults: the device refuses to
/// start rather than operate on an illegal channel plan.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum ConfigError {
    /// The id's derived channel exceeds the transceiver's legal range.
    #[error("channel {channel} for node id {id} exceeds the legal maximum")]
    ChannelOutOfRange {
        /// The offending node id.
        id: u8,
        /// The channel the derivation produced.
        channel: u16,
    },
    /// The busy-backoff window is inverted (min > max).
    #[error("busy backoff window is inverted (min {min_ms} ms > max {max_ms} ms)")]
    InvalidBackoffWindow {
        /// Configured lower bound in milliseconds.
        min_ms: u32,
        /// Configured upper bound in milliseconds.
        max_ms: u32,
    },
    /// A sensor role was given the id reserved for the base station.
    #[error("node id 0 is reserved for the base station")]
    ReservedNodeId,
    /// More sensor nodes than the registry can hold.
    #[error("population {population} exceeds the supported maximum")]
    PopulationTooLarge {
        /// The requested sensor-node population.
        population: usize,
    },
}

/// Tunables for medium arbitration and channel layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct LinkConfig {
    /// Channels between consecutive node ids. Keep at 2 or more so distinct
    /// node channels are never adjacent.
    pub channel_spacing: u8,
    /// Carrier probes before a transmit attempt is abandoned.
    pub channel_checks_max: u8,
    /// Lower bound of the randomized busy backoff, milliseconds.
    pub busy_delay_min_ms: u32,
    /// Upper bound of the randomized busy backoff, milliseconds.
    pub busy_delay_max_ms: u32,
    /// Hardware auto-retransmit policy applied once at init.
    pub retries: RetryPolicy,
    /// Transmit power level.
    pub pa_level: PaLevel,
    /// Whether the transceiver acknowledges received frames automatically.
    pub auto_ack: bool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            channel_spacing: CHANNEL_SPACING,
            channel_checks_max: CHANNEL_CHECKS_MAX,
            busy_delay_min_ms: CHANNEL_BUSY_DELAY_MIN_MS,
            busy_delay_max_ms: CHANNEL_BUSY_DELAY_MAX_MS,
            retries: RetryPolicy {
                delay: FAILED_SEND_DELAY,
                count: MAX_SEND_ATTEMPTS,
            },
            pa_level: PaLevel::Max,
            auto_ack: true,
        }
    }
}

impl LinkConfig {
    /// Derives the channel for a node id: `id * channel_spacing`.
    ///
    /// Pure and total; range checking is the constructor's job via
    /// [`check_channel`](LinkConfig::check_channel).
    pub fn channel_for(&self, id: NodeId) -> RadioChannel {
        (u16::from(id.raw()) * u16::from(self.channel_spacing)) as RadioChannel
    }

    /// Derives the channel for `id`, rejecting results outside the legal
    /// channel range.
    pub fn check_channel(&self, id: NodeId) -> Result<RadioChannel, ConfigError> {
        let channel = u16::from(id.raw()) * u16::from(self.channel_spacing);
        if channel > u16::from(MAX_CHANNEL) {
            return Err(ConfigError::ChannelOutOfRange {
                id: id.raw(),
                channel,
            });
        }
        Ok(channel as RadioChannel)
    }

    /// The largest node id whose channel stays legal under this spacing.
    pub fn max_node_id(&self) -> u8 {
        if self.channel_spacing == 0 {
            return u8::MAX;
        }
        MAX_CHANNEL / self.channel_spacing
    }

    /// Validates the arbitration tunables.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.busy_delay_min_ms > self.busy_delay_max_ms {
            return Err(ConfigError::InvalidBackoffWindow {
                min_ms: self.busy_delay_min_ms,
                max_ms: self.busy_delay_max_ms,
            });
        }
        Ok(())
    }

    /// Validates a sensor-node population against the registry capacity and
    /// the channel plan.
    pub fn check_population(&self, population: usize) -> Result<(), ConfigError> {
        if population > MAX_SENSOR_NODES {
            return Err(ConfigError::PopulationTooLarge { population });
        }
        if population > 0 {
            let _ = self.check_channel(NodeId::new(population as u8))?;
        }
        Ok(())
    }
}
