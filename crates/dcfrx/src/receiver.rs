//! Full receiver chain

#[cfg(not(test))]
use log::{info, trace, warn};

#[cfg(test)]
use std::println as trace;
#[cfg(test)]
use std::println as info;
#[cfg(test)]
use std::println as warn;

use std::collections::VecDeque;
use std::convert::From;
use std::iter::{IntoIterator, Iterator};

use crate::builder::DcfReceiverBuilder;
use crate::classifier::BitClassifier;
use crate::decoder::FrameDecoder;
use crate::framing::{FrameOut, Framer};
use crate::segmenter::{Run, RunLengthSegmenter};

/// A complete DCF77 receiver chain
///
/// The receive chain takes binary amplitude samples, one byte
/// per sample, and performs the following operations:
///
/// 1. Run-length segmentation into spans of high and low carrier
/// 2. Classification of each span into a data bit, a minute
///    sync gap, or an ordinary marker
/// 3. Accumulation of data bits into minute frames
/// 4. Parity checking and decoding of complete frames
///
/// To create the receiver, first create its Builder:
///
/// ```
/// use dcfrx::DcfReceiverBuilder;
///
/// let mut builder = DcfReceiverBuilder::default();
/// let receiver = builder.build();
/// assert_eq!(receiver.input_rate(), 100);
/// ```
///
/// See [module documentation](index.html) for details.
#[derive(Clone, Debug)]
pub struct DcfReceiver {
    segmenter: RunLengthSegmenter,
    classifier: BitClassifier,
    framer: Framer,
    input_rate: u32,
    input_sample_counter: u64,

    // scratch space for completed runs
    runs: Vec<Run>,
}

impl DcfReceiver {
    /// Process a batch of samples
    ///
    /// Accepts any number of `samples`, one byte per sample. A
    /// zero byte is low carrier and anything else is high
    /// carrier, unless the receiver was built with inverted
    /// input. Every [`FrameOut`] event which results is appended
    /// to `events`.
    ///
    /// Returns the number of samples consumed from the front of
    /// `samples`. The remainder belongs to a run which has not
    /// ended yet. You **must** retain the unconsumed samples and
    /// present them again, at the front of the next batch. A
    /// return value of zero is normal: it just means that more
    /// samples are needed.
    ///
    /// ```
    /// use dcfrx::{DcfReceiverBuilder, FrameOut};
    ///
    /// let mut rx = DcfReceiverBuilder::new(100).build();
    /// let mut events: Vec<FrameOut> = vec![];
    ///
    /// // a sync gap, then the start of a 100 ms pulse
    /// let mut samples = vec![1u8; 150];
    /// samples.extend_from_slice(&[0, 0, 0]);
    /// let consumed = rx.process(&samples, &mut events);
    ///
    /// assert_eq!(consumed, 150);
    /// assert_eq!(events, vec![FrameOut::Synchronized]);
    ///
    /// // the pulse has not ended yet; send its samples again
    /// let mut samples = samples.split_off(consumed);
    /// samples.extend_from_slice(&[0; 7]);
    /// samples.push(1);
    /// assert_eq!(rx.process(&samples, &mut events), 10);
    /// assert_eq!(events[1], FrameOut::Reading(1));
    /// ```
    pub fn process<E>(&mut self, samples: &[u8], events: &mut E) -> usize
    where
        E: Extend<FrameOut>,
    {
        self.runs.clear();
        let consumed = self.segmenter.segment(samples, &mut self.runs);

        let mut runs = std::mem::take(&mut self.runs);
        for run in runs.drain(..) {
            self.input_run(run, events);
        }
        self.runs = runs;

        consumed
    }

    /// Receive DCF77 frames from a source of samples
    ///
    /// Bind an iterator which will consume the `input` and
    /// produce [`FrameOut`](enum.FrameOut.html) events,
    /// which include:
    ///
    /// * sync gaps, which start each minute;
    /// * every accepted bit; and
    /// * decoded minutes, or the reason they could not be decoded
    ///
    /// The `input` must be one byte per sample at the
    /// [`input_rate()`](#method.input_rate) for this receiver.
    ///
    /// The iterator will consume as many samples of `input`
    /// that are required to produce the next event. It will
    /// return `None` if the input is exhausted and there are no
    /// new events. The receiver counts the samples of an
    /// unfinished run, without storing them, and the next call to
    /// `iter()` picks up where this one left off. Do not mix
    /// `iter()` and [`process()`](#method.process) on the same
    /// stream without a [`reset()`](#method.reset) in between.
    #[must_use = "iterators are lazy and do nothing unless consumed"]
    pub fn iter<'rx, I, T>(&'rx mut self, input: I) -> SourceIter<'rx, T>
    where
        I: IntoIterator<Item = u8> + IntoIterator<IntoIter = T>,
        T: Iterator<Item = u8>,
    {
        SourceIter {
            source: input.into_iter(),
            receiver: self,
            events: VecDeque::new(),
        }
    }

    /// Input sampling rate
    ///
    /// Returns sampling rate expected by the
    /// [`process()`](#method.process) method.
    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    /// Lifetime total input sample counter
    ///
    /// Reports the lifetime total of input samples which have
    /// been consumed. Samples which are still waiting for their
    /// run to end are not counted.
    pub fn input_sample_counter(&self) -> u64 {
        self.input_sample_counter
    }

    /// Number of bits in the frame in progress
    pub fn frame_len(&self) -> usize {
        self.framer.accumulator().len()
    }

    /// Clear all states and reset to zero initial conditions
    ///
    /// All buffers and states are cleared. If you are calling
    /// [`process()`](#method.process) yourself, discard any
    /// samples you were holding for it.
    pub fn reset(&mut self) {
        self.segmenter.reset();
        self.framer.reset();
        self.input_sample_counter = 0;
        self.runs.clear();
    }

    // Classify and frame one completed run
    fn input_run<E>(&mut self, run: Run, events: &mut E)
    where
        E: Extend<FrameOut>,
    {
        self.input_sample_counter = self.input_sample_counter.wrapping_add(run.length as u64);
        let clock = self.input_sample_counter;

        let symbol = self.classifier.classify(&run);
        let out = match self.framer.input(symbol) {
            Some(out) => out,
            None => return,
        };

        match &out {
            FrameOut::Ready(Ok(rec)) => {
                info!("receiver [{:<14}]: time: {}", clock, rec)
            }
            FrameOut::Ready(Err(err)) => {
                warn!("receiver [{:<14}]: minute lost: {}", clock, err)
            }
            _ => trace!("receiver [{:<14}]: {:?}", clock, out),
        }
        events.extend(std::iter::once(out));
    }
}

impl From<&DcfReceiverBuilder> for DcfReceiver {
    /// Create the DCF77 Receiver from its Builder
    fn from(cfg: &DcfReceiverBuilder) -> Self {
        let segmenter = if cfg.inverted_input() {
            RunLengthSegmenter::new_inverted()
        } else {
            RunLengthSegmenter::new()
        };
        let classifier = BitClassifier::with_thresholds(
            cfg.input_rate(),
            cfg.sync_threshold(),
            cfg.bit_threshold(),
        );
        let mut decoder = FrameDecoder::new();
        decoder.with_range_check(cfg.range_check());

        Self {
            segmenter,
            classifier,
            framer: Framer::new(decoder, cfg.reset_on_error()),
            input_rate: cfg.input_rate(),
            input_sample_counter: 0,
            runs: Vec::new(),
        }
    }
}

/// Sample source iterator
///
/// This iterator is bound to a source of byte samples. Calling
/// the `next()` method will return the next
/// [`FrameOut`](enum.FrameOut.html) event from the DCF77
/// Receiver or `None` if the available samples have been
/// consumed without any new events.
#[derive(Debug)]
pub struct SourceIter<'rx, I>
where
    I: Iterator<Item = u8>,
{
    source: I,
    receiver: &'rx mut DcfReceiver,
    events: VecDeque<FrameOut>,
}

impl<'rx, I> Iterator for SourceIter<'rx, I>
where
    I: Iterator<Item = u8>,
{
    type Item = FrameOut;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(evt) = self.events.pop_front() {
                return Some(evt);
            }

            let sa = self.source.next()?;
            if let Some(run) = self.receiver.segmenter.push(sa) {
                self.receiver.input_run(run, &mut self.events);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::layout::{fill_parity, ParityGroup, FRAME_LENGTH, MINUTE};
    use crate::message::{DecodeErr, Month, TimeRecord, Timezone, Weekday};
    use crate::waveform::{encode_frame, modulate_frame};

    const RATE: u32 = 100;

    fn rec_2020() -> TimeRecord {
        TimeRecord::new(2020, Month::September, 29, Weekday::Tuesday, 0, 43, Timezone::Cest)
    }

    fn rec_2024() -> TimeRecord {
        TimeRecord::new(2024, Month::May, 26, Weekday::Sunday, 18, 58, Timezone::Cest)
    }

    // a partial minute ending in a sync gap, then each frame in turn,
    // then the first pulse of the following minute
    fn make_test_signal(frames: &[[u8; FRAME_LENGTH]]) -> Vec<u8> {
        let mut out = modulate_frame(&frames[0][40..], RATE);
        for frame in frames {
            out.extend(modulate_frame(frame, RATE));
        }
        out.extend(std::iter::repeat(0u8).take(RATE as usize / 10));
        out.push(1);
        out
    }

    fn records(events: &[FrameOut]) -> Vec<TimeRecord> {
        events.iter().filter_map(|e| e.record().copied()).collect()
    }

    fn errors(events: &[FrameOut]) -> Vec<DecodeErr> {
        events
            .iter()
            .filter_map(|e| match e {
                FrameOut::Ready(Err(err)) => Some(*err),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_top_level_receiver() {
        let signal = make_test_signal(&[encode_frame(&rec_2020()), encode_frame(&rec_2024())]);

        let mut rx = DcfReceiverBuilder::new(RATE).build();
        println!("{:?}", rx);

        let events: Vec<FrameOut> = rx.iter(signal.iter().copied()).collect();
        assert_eq!(records(&events), vec![rec_2020(), rec_2024()]);
        assert!(errors(&events).is_empty());

        // one sync before each frame and one after the last
        let syncs = events
            .iter()
            .filter(|e| **e == FrameOut::Synchronized)
            .count();
        assert_eq!(syncs, 3);

        // only the final high sample is unconsumed
        assert_eq!(rx.input_sample_counter(), signal.len() as u64 - 1);
        assert_eq!(rx.frame_len(), 1);
    }

    #[test]
    fn test_process_chunking() {
        let signal = make_test_signal(&[encode_frame(&rec_2020())]);

        let mut rx = DcfReceiverBuilder::new(RATE).build();
        let mut whole: Vec<FrameOut> = vec![];
        let consumed = rx.process(&signal, &mut whole);
        assert_eq!(consumed, signal.len() - 1);
        assert_eq!(records(&whole), vec![rec_2020()]);

        for &chunk_len in &[1usize, 7, 99, 100, 1013] {
            let mut rx = DcfReceiverBuilder::new(RATE).build();
            let mut events: Vec<FrameOut> = vec![];
            let mut pending: Vec<u8> = vec![];
            for chunk in signal.chunks(chunk_len) {
                pending.extend_from_slice(chunk);
                let consumed = rx.process(&pending, &mut events);
                pending.drain(..consumed);
            }
            assert_eq!(events, whole, "chunk length {}", chunk_len);
            assert_eq!(pending.len(), 1);
            assert_eq!(rx.input_sample_counter(), consumed as u64);
        }
    }

    #[test]
    fn test_iter_resumes() {
        let signal = make_test_signal(&[encode_frame(&rec_2024())]);
        let (first, second) = signal.split_at(signal.len() / 2);

        let mut rx = DcfReceiverBuilder::new(RATE).build();
        let mut events: Vec<FrameOut> = rx.iter(first.iter().copied()).collect();
        events.extend(rx.iter(second.iter().copied()));
        assert_eq!(records(&events), vec![rec_2024()]);
    }

    #[test]
    fn test_inverted_input() {
        let signal: Vec<u8> = make_test_signal(&[encode_frame(&rec_2020())])
            .into_iter()
            .map(|sa| if sa == 0 { 0xff } else { 0 })
            .collect();

        let mut rx = DcfReceiverBuilder::new(RATE)
            .with_inverted_input(true)
            .build();
        let events: Vec<FrameOut> = rx.iter(signal.iter().copied()).collect();
        assert_eq!(records(&events), vec![rec_2020()]);

        // without inversion, nothing decodes
        let mut rx = DcfReceiverBuilder::new(RATE).build();
        let events: Vec<FrameOut> = rx.iter(signal.iter().copied()).collect();
        assert!(records(&events).is_empty());
    }

    #[test]
    fn test_higher_rate() {
        let rate = 1000;
        let frame = encode_frame(&rec_2024());
        let mut signal = vec![1u8; 2 * rate as usize];
        signal.extend(modulate_frame(&frame, rate));
        signal.push(0);

        let mut rx = DcfReceiverBuilder::new(rate).build();
        let events: Vec<FrameOut> = rx.iter(signal.iter().copied()).collect();
        assert_eq!(records(&events), vec![rec_2024()]);
    }

    #[test]
    fn test_threshold_limits() {
        let signal = make_test_signal(&[encode_frame(&rec_2020()), encode_frame(&rec_2024())]);

        // a nominal gap after a one lasts exactly 1.8 s, and a one
        // lasts exactly 0.2 s, so the upper limits are not usable
        for &(sync_secs, bit_secs) in &[(0.9f32, 0.15f32), (1.7, 0.15), (0.9, 0.1), (1.7, 0.19)] {
            let mut rx = DcfReceiverBuilder::new(RATE)
                .with_sync_threshold(sync_secs)
                .with_bit_threshold(bit_secs)
                .build();
            let events: Vec<FrameOut> = rx.iter(signal.iter().copied()).collect();
            assert_eq!(
                records(&events),
                vec![rec_2020(), rec_2024()],
                "thresholds {} s, {} s",
                sync_secs,
                bit_secs
            );
        }
    }

    #[test]
    fn test_iter_stuck_carrier() {
        let mut rx = DcfReceiverBuilder::new(RATE).build();
        let stuck = std::iter::repeat(1u8).take(1_000_000);
        assert_eq!(rx.iter(stuck).count(), 0);
        assert_eq!(rx.input_sample_counter(), 0);

        // the stuck carrier ends as a sync gap, then a zero
        let events: Vec<FrameOut> = rx.iter([0u8, 0, 1]).collect();
        assert_eq!(events, vec![FrameOut::Synchronized, FrameOut::Reading(1)]);
        assert_eq!(rx.input_sample_counter(), 1_000_002);
    }

    #[test]
    fn test_decode_error_keeps_listening() {
        let mut bad = encode_frame(&rec_2020());
        bad[28] ^= 1;
        let signal = make_test_signal(&[bad, encode_frame(&rec_2024())]);

        let mut rx = DcfReceiverBuilder::new(RATE).build();
        let events: Vec<FrameOut> = rx.iter(signal.iter().copied()).collect();
        assert_eq!(
            errors(&events),
            vec![DecodeErr::Parity(ParityGroup::Minutes)]
        );
        assert_eq!(records(&events), vec![rec_2024()]);
    }

    #[test]
    fn test_range_check() {
        let mut frame = encode_frame(&rec_2020());
        MINUTE.encode(60, &mut frame);
        fill_parity(&mut frame);
        let signal = make_test_signal(&[frame]);

        let mut rx = DcfReceiverBuilder::new(RATE).build();
        let events: Vec<FrameOut> = rx.iter(signal.iter().copied()).collect();
        assert_eq!(errors(&events).len(), 1);

        let mut rx = DcfReceiverBuilder::new(RATE)
            .with_range_check(false)
            .build();
        let events: Vec<FrameOut> = rx.iter(signal.iter().copied()).collect();
        assert_eq!(records(&events)[0].minute(), 60);
    }

    #[test]
    fn test_missed_sync_self_heals() {
        let first = modulate_frame(&encode_frame(&rec_2020()), RATE);
        let second = modulate_frame(&encode_frame(&rec_2024()), RATE);

        // lose the sync gap after the first frame by pulsing inside it
        let mut signal = vec![1u8; 2 * RATE as usize];
        signal.extend_from_slice(&first[..first.len() - RATE as usize]);
        signal.extend(std::iter::repeat(0u8).take(10));
        signal.extend(std::iter::repeat(1u8).take(RATE as usize - 10));
        signal.extend_from_slice(&second);
        signal.extend_from_slice(&second);
        signal.push(0);

        let mut rx = DcfReceiverBuilder::new(RATE).build();
        let events: Vec<FrameOut> = rx.iter(signal.iter().copied()).collect();

        // the minute after the overrun is lost, but the next one decodes
        assert_eq!(records(&events), vec![rec_2020(), rec_2024()]);
        let overruns: Vec<&FrameOut> = events
            .iter()
            .filter(|e| matches!(e, FrameOut::Overrun(_)))
            .collect();
        assert_eq!(overruns, vec![&FrameOut::Overrun(FRAME_LENGTH + 1)]);
    }

    #[test]
    fn test_reset() {
        let signal = make_test_signal(&[encode_frame(&rec_2020())]);
        let mut rx = DcfReceiverBuilder::new(RATE).build();
        let _ = rx.iter(signal[..1000].iter().copied()).count();
        assert!(rx.input_sample_counter() > 0);
        assert!(rx.frame_len() > 0);

        rx.reset();
        assert_eq!(rx.input_sample_counter(), 0);
        assert_eq!(rx.frame_len(), 0);

        let events: Vec<FrameOut> = rx.iter(signal.iter().copied()).collect();
        assert_eq!(records(&events), vec![rec_2020()]);
    }
}
