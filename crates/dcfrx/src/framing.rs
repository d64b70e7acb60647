//! Minute framing

#[cfg(not(test))]
use log::{debug, warn};

#[cfg(test)]
use std::println as debug;
#[cfg(test)]
use std::println as warn;

use crate::classifier::Symbol;
use crate::decoder::FrameDecoder;
use crate::layout::FRAME_LENGTH;
use crate::message::{DecodeErr, TimeRecord};

/// Framing event
///
/// Events are emitted by the [`DcfReceiver`](crate::DcfReceiver)
/// as it processes samples. Ordinary high-carrier gaps between
/// pulses do not produce events.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameOut {
    /// A minute sync gap was detected
    ///
    /// Any partial frame has been discarded, and the next bit
    /// starts a new frame.
    Synchronized,

    /// A bit was accepted
    ///
    /// Reports the number of bits now held, including this one.
    Reading(usize),

    /// The frame grew past its full length
    ///
    /// The sync gap which should have ended the last frame was
    /// missed. Bits continue to accumulate, but no decode will be
    /// attempted until the next sync gap. Reported once per
    /// overrun with the number of bits held.
    Overrun(usize),

    /// A complete frame was decoded
    ///
    /// Contains either the [`TimeRecord`] or the reason the frame
    /// could not be decoded.
    Ready(Result<TimeRecord, DecodeErr>),
}

impl FrameOut {
    /// The decoded time, if this event carries one
    pub fn record(&self) -> Option<&TimeRecord> {
        match self {
            FrameOut::Ready(Ok(rec)) => Some(rec),
            _ => None,
        }
    }
}

/// Bit buffer for one minute frame
///
/// The accumulator holds bits in transmission order. It has no
/// length cap: a frame which is never reset keeps growing, and
/// [`is_complete()`](#method.is_complete) stays false once it has
/// grown past [`FRAME_LENGTH`].
///
/// ```
/// use dcfrx::{FrameAccumulator, FRAME_LENGTH};
///
/// let mut acc = FrameAccumulator::new();
/// for _ in 0..FRAME_LENGTH - 1 {
///     assert!(!acc.append(0));
/// }
/// assert!(acc.append(1));
/// assert!(acc.is_complete());
/// assert_eq!(acc.snapshot().len(), FRAME_LENGTH);
///
/// assert!(!acc.append(0));
/// assert!(!acc.is_complete());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameAccumulator {
    bits: Vec<u8>,
}

impl FrameAccumulator {
    /// Empty accumulator
    pub fn new() -> Self {
        Self {
            bits: Vec::with_capacity(FRAME_LENGTH + 1),
        }
    }

    /// Append one bit
    ///
    /// Returns `true` if this bit brought the frame to exactly
    /// [`FRAME_LENGTH`]. This happens at most once between resets.
    pub fn append(&mut self, bit: u8) -> bool {
        self.bits.push(bit);
        self.is_complete()
    }

    /// Discard all bits
    pub fn reset(&mut self) {
        self.bits.clear();
    }

    /// True if exactly one full frame is held
    pub fn is_complete(&self) -> bool {
        self.bits.len() == FRAME_LENGTH
    }

    /// Current bits, oldest first
    pub fn snapshot(&self) -> &[u8] {
        &self.bits
    }

    /// Number of bits held
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// True if no bits are held
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
}

/// Minute framer
///
/// Accepts [`Symbol`]s from the classifier and builds them into
/// frames. Sync gaps reset the frame. Every bit which completes a
/// frame triggers one decode attempt.
///
/// Bits received before the first sync gap are accumulated too.
/// If the receiver happened to start at the top of a minute, the
/// first frame decodes normally. If not, the frame will either
/// fail parity or overrun, and the next sync gap repairs it.
#[derive(Clone, Debug)]
pub struct Framer {
    accumulator: FrameAccumulator,
    decoder: FrameDecoder,

    // discard the frame when it fails to decode
    reset_on_error: bool,
}

impl Framer {
    /// New framer
    ///
    /// If `reset_on_error` is set, a frame which fails to decode
    /// is discarded immediately instead of waiting for the next
    /// sync gap.
    pub fn new(decoder: FrameDecoder, reset_on_error: bool) -> Self {
        Self {
            accumulator: FrameAccumulator::new(),
            decoder,
            reset_on_error,
        }
    }

    /// Reset to zero initial conditions
    pub fn reset(&mut self) {
        self.accumulator.reset();
    }

    /// The frame in progress
    pub fn accumulator(&self) -> &FrameAccumulator {
        &self.accumulator
    }

    /// Handle one classified symbol
    ///
    /// Returns an event if the framing state changed. See
    /// [`FrameOut`].
    pub fn input(&mut self, symbol: Symbol) -> Option<FrameOut> {
        match symbol {
            Symbol::Marker => None,
            Symbol::Sync => {
                let held = self.accumulator.len();
                if held > 0 && held < FRAME_LENGTH {
                    debug!("framer: sync: discarding partial frame of {} bits", held);
                } else {
                    debug!("framer: sync");
                }
                self.accumulator.reset();
                Some(FrameOut::Synchronized)
            }
            Symbol::Bit(bit) => Some(self.append(bit)),
        }
    }

    fn append(&mut self, bit: u8) -> FrameOut {
        if self.accumulator.append(bit) {
            let res = self.decoder.decode(self.accumulator.snapshot());
            if res.is_err() && self.reset_on_error {
                self.accumulator.reset();
            }
            return FrameOut::Ready(res);
        }

        let held = self.accumulator.len();
        if held == FRAME_LENGTH + 1 {
            warn!(
                "framer: frame overrun: no sync gap after {} bits; waiting for next sync",
                FRAME_LENGTH
            );
            FrameOut::Overrun(held)
        } else {
            FrameOut::Reading(held)
        }
    }
}
