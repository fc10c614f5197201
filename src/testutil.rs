//! Scripted test doubles for the hardware boundaries.
//!
//! The protocol is specified against the [`Transceiver`] and
//! [`OccupancySensor`] contracts, so the whole state machine runs against
//! these mocks deterministically. [`MockTransceiver`] journals every
//! driver call and tracks the live `{channel, pipe, listening}` state so
//! tests can assert the resting-configuration invariant directly, in the
//! spirit of `embedded-hal-mock`'s transaction expectations.

use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;
use rand_core::RngCore;

use crate::addressing::{RadioAddress, RadioChannel};
use crate::radio::{RadioConfig, Transceiver};
use crate::sensor::{OccupancySensor, RangeStatus};

/// One journaled driver call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Begin,
    Configure,
    SetChannel(RadioChannel),
    OpenReadPipe(u8, RadioAddress),
    CloseReadPipe(u8),
    OpenWritePipe(RadioAddress),
    StartListening,
    StopListening,
    SenseCarrier,
    Send,
    Available,
    Read,
}

/// A scripted radio that journals calls and mirrors the driver state.
#[derive(Debug, Default)]
pub struct MockTransceiver {
    /// Whether `begin` succeeds.
    pub begin_ok: bool,
    /// Whether `sense_carrier` reports a busy medium.
    pub carrier_busy: bool,
    /// Whether `send` is acknowledged.
    pub send_ok: bool,
    /// Every `(write address, frame)` handed to `send`.
    pub sent: Vec<(RadioAddress, Vec<u8>)>,
    /// Frames waiting to be read.
    pub rx_frames: VecDeque<Vec<u8>>,
    /// The call journal.
    pub ops: Vec<Op>,

    /// Currently tuned channel.
    pub channel: RadioChannel,
    /// Whether the radio is in receive mode.
    pub listening: bool,
    /// The open reading pipe, if any.
    pub read_pipe: Option<(u8, RadioAddress)>,
    /// The open writing pipe, if any.
    pub write_pipe: Option<RadioAddress>,
    /// The start-up configuration, once applied.
    pub config: Option<RadioConfig>,
}

impl MockTransceiver {
    pub fn new() -> Self {
        Self {
            begin_ok: true,
            send_ok: true,
            ..Self::default()
        }
    }
}

impl Transceiver for MockTransceiver {
    fn begin(&mut self) -> bool {
        self.ops.push(Op::Begin);
        self.begin_ok
    }

    fn configure(&mut self, config: &RadioConfig) {
        self.ops.push(Op::Configure);
        self.channel = config.channel;
        self.config = Some(*config);
    }

    fn set_channel(&mut self, channel: RadioChannel) {
        self.ops.push(Op::SetChannel(channel));
        self.channel = channel;
    }

    fn open_read_pipe(&mut self, pipe: u8, address: RadioAddress) {
        self.ops.push(Op::OpenReadPipe(pipe, address));
        self.read_pipe = Some((pipe, address));
    }

    fn close_read_pipe(&mut self, pipe: u8) {
        self.ops.push(Op::CloseReadPipe(pipe));
        if self.read_pipe.map(|(open, _)| open) == Some(pipe) {
            self.read_pipe = None;
        }
    }

    fn open_write_pipe(&mut self, address: RadioAddress) {
        self.ops.push(Op::OpenWritePipe(address));
        self.write_pipe = Some(address);
    }

    fn start_listening(&mut self) {
        self.ops.push(Op::StartListening);
        self.listening = true;
    }

    fn stop_listening(&mut self) {
        self.ops.push(Op::StopListening);
        self.listening = false;
    }

    fn sense_carrier(&mut self) -> bool {
        self.ops.push(Op::SenseCarrier);
        self.carrier_busy
    }

    fn send(&mut self, frame: &[u8]) -> bool {
        self.ops.push(Op::Send);
        assert!(
            !self.listening,
            "send while still in receive mode"
        );
        let address = self.write_pipe.expect("send without an open write pipe");
        self.sent.push((address, frame.to_vec()));
        self.send_ok
    }

    fn available(&mut self) -> bool {
        self.ops.push(Op::Available);
        !self.rx_frames.is_empty()
    }

    fn read(&mut self, buf: &mut [u8]) {
        self.ops.push(Op::Read);
        if let Some(frame) = self.rx_frames.pop_front() {
            let len = usize::min(frame.len(), buf.len());
            buf[..len].copy_from_slice(&frame[..len]);
        }
    }
}

/// A rangefinder that replays a fixed script of read outcomes.
#[derive(Debug)]
pub struct MockSensor {
    /// Whether `begin` succeeds.
    pub begin_ok: bool,
    /// Number of `trigger_reading` calls seen.
    pub triggered: usize,
    script: VecDeque<RangeStatus>,
}

impl MockSensor {
    pub fn new(script: &[RangeStatus]) -> Self {
        Self {
            begin_ok: true,
            triggered: 0,
            script: script.iter().copied().collect(),
        }
    }
}

impl OccupancySensor for MockSensor {
    fn begin(&mut self) -> bool {
        self.begin_ok
    }

    fn trigger_reading(&mut self) {
        self.triggered += 1;
    }

    fn read_status(&mut self) -> RangeStatus {
        // An exhausted script reads as a fault, which the node treats as
        // a non-event.
        self.script.pop_front().unwrap_or(RangeStatus::Fault)
    }
}

/// A deterministic jitter source cycling through a fixed sequence.
#[derive(Debug)]
pub struct FixedRng {
    seq: Vec<u32>,
    next: usize,
}

impl FixedRng {
    pub fn new(seq: &[u32]) -> Self {
        assert!(!seq.is_empty());
        Self {
            seq: seq.to_vec(),
            next: 0,
        }
    }
}

impl RngCore for FixedRng {
    fn next_u32(&mut self) -> u32 {
        let value = self.seq[self.next % self.seq.len()];
        self.next += 1;
        value
    }

    fn next_u64(&mut self) -> u64 {
        u64::from(self.next_u32()) << 32 | u64::from(self.next_u32())
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

/// A delay provider that journals every sleep instead of sleeping.
#[derive(Debug, Default)]
pub struct RecordingDelay {
    ns: Vec<u64>,
}

impl RecordingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded sleeps, in whole milliseconds.
    pub fn sleeps_ms(&self) -> Vec<u32> {
        self.ns.iter().map(|ns| (ns / 1_000_000) as u32).collect()
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.ns.push(u64::from(ns));
    }
}
