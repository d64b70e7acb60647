//! Pulse classification
//!
//! DCF77 marks every second except the last one of each minute by
//! reducing the carrier for a short time. The duration of the
//! reduction carries the data:
//!
//! * ~100 ms of low carrier is a `0`
//! * ~200 ms of low carrier is a `1`
//!
//! Second 59 has no pulse at all. The resulting high-carrier gap
//! lasts nearly two seconds and marks the start of a new minute.
//!
//! ```txt
//!     bit 57      bit 58                       bit 0
//!   __    ______    ___________________________    ________
//!     |__|      |__|                           |__|
//!     100ms     200ms      sync gap (> 1 s)
//! ```

#[cfg(not(test))]
use log::trace;

#[cfg(test)]
use std::println as trace;

use crate::segmenter::{Level, Run};

/// Meaning of one completed [`Run`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// Minute sync gap
    ///
    /// A high run which lasted longer than the sync threshold.
    /// The next pulse is bit 0 of a new frame.
    Sync,

    /// Ordinary high carrier between two pulses
    ///
    /// Carries no information.
    Marker,

    /// A decoded data bit, `0` or `1`
    Bit(u8),
}

/// Duration-threshold bit classifier
///
/// All thresholds are computed from the input sampling rate, so the
/// classifier works the same at any rate.
///
/// ```
/// use dcfrx::{BitClassifier, Level, Run, Symbol};
///
/// let cls = BitClassifier::new(100);
/// assert_eq!(Symbol::Bit(0), cls.classify(&Run::new(Level::Low, 10)));
/// assert_eq!(Symbol::Bit(1), cls.classify(&Run::new(Level::Low, 20)));
/// assert_eq!(Symbol::Marker, cls.classify(&Run::new(Level::High, 80)));
/// assert_eq!(Symbol::Sync, cls.classify(&Run::new(Level::High, 180)));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BitClassifier {
    // high runs longer than this are sync gaps (samples)
    sync_threshold: usize,

    // low runs longer than this are ones (samples)
    bit_threshold: usize,
}

impl BitClassifier {
    /// Default sync gap threshold (seconds)
    pub const DEFAULT_SYNC_THRESHOLD_SECS: f32 = 1.0;

    /// Default one/zero bit threshold (seconds)
    pub const DEFAULT_BIT_THRESHOLD_SECS: f32 = 0.15;

    /// New classifier with standard thresholds
    ///
    /// High runs longer than one second are sync gaps. Low runs
    /// longer than 150 ms are ones.
    pub fn new(input_rate: u32) -> Self {
        Self::with_thresholds(
            input_rate,
            Self::DEFAULT_SYNC_THRESHOLD_SECS,
            Self::DEFAULT_BIT_THRESHOLD_SECS,
        )
    }

    /// New classifier with custom thresholds
    ///
    /// Thresholds are given in seconds and converted to whole
    /// samples at the `input_rate`, rounding down. Both comparisons
    /// are strict: a run must be *longer* than the threshold.
    pub fn with_thresholds(input_rate: u32, sync_secs: f32, bit_secs: f32) -> Self {
        Self {
            sync_threshold: secs_to_samples(input_rate, sync_secs),
            bit_threshold: secs_to_samples(input_rate, bit_secs),
        }
    }

    /// Sync gap threshold, in samples
    pub fn sync_threshold(&self) -> usize {
        self.sync_threshold
    }

    /// One/zero threshold, in samples
    pub fn bit_threshold(&self) -> usize {
        self.bit_threshold
    }

    /// Classify one completed run
    pub fn classify(&self, run: &Run) -> Symbol {
        match run.level {
            Level::High if run.length > self.sync_threshold => {
                trace!("classifier: sync gap of {} samples", run.length);
                Symbol::Sync
            }
            Level::High => Symbol::Marker,
            Level::Low => Symbol::Bit((run.length > self.bit_threshold) as u8),
        }
    }
}

// Convert seconds to whole samples, rounding down
//
// `secs` is first rounded to whole microseconds so that values
// like 0.9, which f32 cannot represent, scale to exact samples.
fn secs_to_samples(input_rate: u32, secs: f32) -> usize {
    const MICROS: u64 = 1_000_000;
    let micros = (f64::from(f32::max(secs, 0.0)) * MICROS as f64).round() as u64;
    (u64::from(input_rate) * micros / MICROS) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn low(length: usize) -> Run {
        Run::new(Level::Low, length)
    }

    fn high(length: usize) -> Run {
        Run::new(Level::High, length)
    }

    #[test]
    fn test_thresholds() {
        let cls = BitClassifier::new(100);
        assert_eq!(cls.sync_threshold(), 100);
        assert_eq!(cls.bit_threshold(), 15);

        let cls = BitClassifier::new(48000);
        assert_eq!(cls.sync_threshold(), 48000);
        assert_eq!(cls.bit_threshold(), 7200);

        let cls = BitClassifier::new(10);
        assert_eq!(cls.bit_threshold(), 1);

        let cls = BitClassifier::with_thresholds(1000, 1.5, 0.125);
        assert_eq!(cls.sync_threshold(), 1500);
        assert_eq!(cls.bit_threshold(), 125);
    }

    #[test]
    fn test_inexact_thresholds() {
        // (rate, sync secs, bit secs, sync samples, bit samples)
        const CASES: &[(u32, f32, f32, usize, usize)] = &[
            (100, 0.9, 0.15, 90, 15),
            (100, 1.8, 0.1, 180, 10),
            (100, 1.1, 0.2, 110, 20),
            (1000, 0.9, 0.11, 900, 110),
            (48000, 1.8, 0.13, 86400, 6240),
        ];

        for &(rate, sync_secs, bit_secs, sync, bit) in CASES {
            let cls = BitClassifier::with_thresholds(rate, sync_secs, bit_secs);
            assert_eq!(cls.sync_threshold(), sync);
            assert_eq!(cls.bit_threshold(), bit);
        }

        // the gap after a zero is not a sync at the lowest threshold
        let cls = BitClassifier::with_thresholds(100, 0.9, 0.15);
        assert_eq!(Symbol::Marker, cls.classify(&high(90)));
        assert_eq!(Symbol::Sync, cls.classify(&high(91)));

        assert_eq!(BitClassifier::with_thresholds(100, -1.0, 0.15).sync_threshold(), 0);
    }

    #[test]
    fn test_bit_boundary() {
        // (rate, floor(0.15 * rate))
        const CASES: &[(u32, usize)] = &[
            (10, 1),
            (50, 7),
            (100, 15),
            (250, 37),
            (1000, 150),
            (22050, 3307),
        ];

        for &(rate, floor) in CASES {
            let cls = BitClassifier::new(rate);
            assert_eq!(cls.bit_threshold(), floor);
            assert_eq!(Symbol::Bit(0), cls.classify(&low(floor)));
            assert_eq!(Symbol::Bit(1), cls.classify(&low(floor + 1)));
        }
    }

    #[test]
    fn test_sync_boundary() {
        for &rate in &[10u32, 100, 1000, 22050] {
            let cls = BitClassifier::new(rate);
            let rate = rate as usize;
            assert_eq!(Symbol::Marker, cls.classify(&high(rate)));
            assert_eq!(Symbol::Sync, cls.classify(&high(rate + 1)));
            assert_eq!(Symbol::Marker, cls.classify(&high(1)));
        }
    }

    #[test]
    fn test_nominal_pulses() {
        let cls = BitClassifier::new(100);
        assert_eq!(Symbol::Bit(0), cls.classify(&low(1)));
        assert_eq!(Symbol::Bit(0), cls.classify(&low(10)));
        assert_eq!(Symbol::Bit(1), cls.classify(&low(20)));

        // long low runs are still ones
        assert_eq!(Symbol::Bit(1), cls.classify(&low(500)));

        // the gap after a one or a zero is a marker
        assert_eq!(Symbol::Marker, cls.classify(&high(80)));
        assert_eq!(Symbol::Marker, cls.classify(&high(90)));

        // second 59 plus the rest of second 58
        assert_eq!(Symbol::Sync, cls.classify(&high(180)));
    }
}
