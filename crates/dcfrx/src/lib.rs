//! # dcfrx: DCF77 Time Signal Decoding
//!
//! This crate decodes the [DCF77](https://en.wikipedia.org/wiki/DCF77)
//! longwave time signal, which broadcasts German civil time from
//! Mainflingen on 77.5 kHz. It converts a stream of binary carrier
//! samples into a validated date, time, and timezone once per minute.
//!
//! ## Disclaimer
//!
//! This crate is dual-licensed MIT and Apache 2.0. Read these licenses
//! carefully as they may affect your rights.
//!
//! This crate has not been certified for any purpose. Do not use it
//! as the sole time reference for anything that matters.
//!
//! ## Example
//!
//! You will first need a DCF77 receiver module or a software-defined
//! radio which reports the state of the carrier. Sample its output at
//! a fixed rate, one byte per sample:
//!
//! * `0` while the carrier is reduced, during each second's pulse
//! * anything else while the carrier is at full strength
//!
//! Obtaining the samples is beyond the scope of this crate. Many
//! receiver modules expose a single output pin which you can poll.
//! If your module pulls its pin high during each pulse, enable
//! [inverted input](DcfReceiverBuilder::with_inverted_input).
//!
//! ```
//! use dcfrx::{DcfReceiverBuilder, FrameOut};
//!
//! # let some_sample_source_iterator = || std::iter::once(1u8);
//! #
//! // create a DcfReceiver with your sampling rate
//! let mut rx = DcfReceiverBuilder::new(100)
//!     .with_bit_threshold(0.15)   // pulses longer than this are ones
//!     .with_range_check(true)     // reject impossible minutes and hours
//!     .build();
//!
//! // let samplesrc be an iterator which outputs samples, such as
//! // a BufReader bound to stdin, at the sampling rate (here 100 Hz)
//! let samplesrc = some_sample_source_iterator();
//! for evt in rx.iter(samplesrc) {
//!     match evt {
//!         FrameOut::Ready(Ok(time)) => println!("{}", time),
//!         FrameOut::Ready(Err(err)) => eprintln!("minute lost: {}", err),
//!         _ => {}
//!     }
//! }
//! ```
//!
//! The digital receiver is created via a
//! [builder](struct.DcfReceiverBuilder.html).
//!
//! The [`DcfReceiver`](struct.DcfReceiver.html) binds by iterator to any
//! source of `u8` samples. If you already have your samples in
//! buffers, [`process()`](DcfReceiver::process) accepts them a batch
//! at a time.
//!
//! Each minute's frame describes the time at the *start of the
//! following minute*. A [`TimeRecord`] is therefore reported just
//! before the instant it names, and becomes exact when the next
//! pulse begins.
//!
//! ## Background
//!
//! DCF77 reduces its carrier amplitude at the start of every second
//! except the last one in each minute. A 100 ms reduction is a `0`
//! bit, and a 200 ms reduction is a `1` bit. The missing pulse in
//! second 59 marks the start of the next minute. Every minute thus
//! carries one 59-bit frame.
//!
//! The frame encodes the minute, hour, day of month, day of week,
//! month, and year as two-digit decimal numbers, along with
//! flags for standard or summer time. Three even-parity bits
//! protect the time and date. See [`layout`] for the complete
//! table of fields.
//!
//! Decoding proceeds in four stages:
//!
//! 1. A [`RunLengthSegmenter`] turns samples into runs of constant
//!    level.
//! 2. A [`BitClassifier`] sorts runs into bits, sync gaps, and
//!    markers by their duration.
//! 3. A [`FrameAccumulator`] collects the bits of each minute.
//! 4. The [`decode()`] function checks parity and extracts the
//!    fields of each complete frame.
//!
//! Failed minutes are reported as [`DecodeErr`]s. The receiver
//! keeps listening and will try again at the next minute.
//!
//! ## Crate features
//!
//! * `chrono`: Convert decoded times to chrono
//!   [datetimes](struct.TimeRecord.html#method.to_datetime).
//!   If enabled, `chrono` becomes part of this crate's public API.

mod builder;
mod classifier;
mod decoder;
mod framing;
mod message;
mod receiver;
mod segmenter;
mod waveform;

pub mod layout;

pub use builder::DcfReceiverBuilder;
pub use classifier::{BitClassifier, Symbol};
pub use decoder::{decode, FrameDecoder};
pub use framing::{FrameAccumulator, FrameOut, Framer};
pub use layout::{Field, ParityGroup, FRAME_LENGTH};
pub use message::{DecodeErr, Month, TimeRecord, Timezone, Weekday};
pub use receiver::{DcfReceiver, SourceIter};
pub use segmenter::{Level, Run, RunLengthSegmenter};
pub use waveform::{encode_frame, modulate_frame};
