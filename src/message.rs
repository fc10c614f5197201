//! Fixed-layout frames exchanged over the link.
//!
//! Every frame starts with the same 3-byte header (receiver id, sender id,
//! message kind) followed by kind-specific payload bytes. Receivers parse
//! the header first, branch on the kind, and only then interpret the rest
//! of the buffer. There is no length prefix, checksum or endianness
//! negotiation at this layer: both ends must agree on the layout, and frame
//! integrity is the transceiver's concern (CRC and auto-ack in hardware).
//!
//! Only one kind is currently defined, [`MessageKind::StatusUpdate`]; the
//! kind byte exists so new frame types can be added without breaking the
//! framing.
//!
//! ## Wire Layout
//!
//! ```text
//! [rx_id, tx_id, kind]             header, 3 bytes
//! [rx_id, tx_id, 0x01, is_vacant]  status update, 4 bytes
//! ```

use thiserror::Error;

use crate::addressing::NodeId;

/// Length in bytes of the frame header.
pub const HEADER_LEN: usize = 3;

/// Length in bytes of a status-update frame.
pub const UPDATE_MESSAGE_LEN: usize = HEADER_LEN + 1;

/// A frame that failed to parse.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum FrameError {
    /// The buffer is shorter than the layout it claims to carry.
    #[error("frame truncated: got {got} bytes, need {need}")]
    Truncated {
        /// Bytes available.
        got: usize,
        /// Bytes the layout requires.
        need: usize,
    },
    /// The kind byte does not name a known message kind.
    #[error("unknown message kind {0:#04x}")]
    UnknownKind(u8),
    /// A boolean payload byte was neither 0 nor 1.
    #[error("invalid boolean payload byte {0:#04x}")]
    BadBool(u8),
}

/// Discriminates the payload that follows the frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[repr(u8)]
pub enum MessageKind {
    /// A sensor node reporting its occupancy status.
    StatusUpdate = 0x01,
}

impl TryFrom<u8> for MessageKind {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self, FrameError> {
        match value {
            0x01 => Ok(MessageKind::StatusUpdate),
            other => Err(FrameError::UnknownKind(other)),
        }
    }
}

/// The addressed header every frame begins with.
///
/// Construction validates nothing beyond field assignment; ids are trusted
/// bytes here and range-checked at the role layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Header {
    /// Intended receiver of the frame.
    pub rx_id: NodeId,
    /// Sender of the frame.
    pub tx_id: NodeId,
    kind: MessageKind,
}

impl Header {
    /// Builds a header.
    pub const fn new(rx_id: NodeId, tx_id: NodeId, kind: MessageKind) -> Self {
        Self { rx_id, tx_id, kind }
    }

    /// The stored message kind.
    pub const fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Serializes the header into its 3-byte wire layout.
    pub const fn to_bytes(&self) -> [u8; HEADER_LEN] {
        [self.rx_id.raw(), self.tx_id.raw(), self.kind as u8]
    }

    /// Parses a header from the first [`HEADER_LEN`] bytes of `buf`.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, FrameError> {
        if buf.len() < HEADER_LEN {
            return Err(FrameError::Truncated {
                got: buf.len(),
                need: HEADER_LEN,
            });
        }
        Ok(Self {
            rx_id: NodeId::new(buf[0]),
            tx_id: NodeId::new(buf[1]),
            kind: MessageKind::try_from(buf[2])?,
        })
    }
}

/// A sensor node's occupancy report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct UpdateMessage {
    /// The addressed header, with kind [`MessageKind::StatusUpdate`].
    pub header: Header,
    /// Whether the sender's parking space is vacant.
    pub is_vacant: bool,
}

impl UpdateMessage {
    /// Builds a status update from `tx_id` addressed to `rx_id`.
    pub const fn new(rx_id: NodeId, tx_id: NodeId, is_vacant: bool) -> Self {
        Self {
            header: Header::new(rx_id, tx_id, MessageKind::StatusUpdate),
            is_vacant,
        }
    }

    /// Serializes the frame into its 4-byte wire layout.
    pub const fn to_bytes(&self) -> [u8; UPDATE_MESSAGE_LEN] {
        let header = self.header.to_bytes();
        [header[0], header[1], header[2], self.is_vacant as u8]
    }

    /// Parses a status update, header included, from `buf`.
    ///
    /// Callers that have already parsed the header and branched on its kind
    /// may still pass the full buffer here; the header is re-read from the
    /// same bytes.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, FrameError> {
        let header = Header::from_bytes(buf)?;
        if buf.len() < UPDATE_MESSAGE_LEN {
            return Err(FrameError::Truncated {
                got: buf.len(),
                need: UPDATE_MESSAGE_LEN,
            });
        }
        let is_vacant = match buf[HEADER_LEN] {
            0 => false,
            1 => true,
            other => return Err(FrameError::BadBool(other)),
        };
        Ok(Self { header, is_vacant })
    }
}
