//! Run-length segmentation of raw samples
//!
//! The DCF77 amplitude is sampled into a stream of binary levels.
//! The [`RunLengthSegmenter`] converts those samples into
//! [`Run`]s: maximal spans of identical levels, with their
//! durations measured in samples.
//!
//! A run is only known to be complete once the first sample of the
//! *opposite* level arrives. Until then, its samples are left
//! unconsumed, and the caller must present them again, prepended to
//! the next batch of samples.

/// Signal level of one sample
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Level {
    /// Carrier reduced; a second marker pulse is in progress
    Low,

    /// Full carrier
    High,
}

impl Level {
    /// The opposite level
    pub fn inverted(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

impl From<u8> for Level {
    /// Level of a raw sample byte
    ///
    /// Zero is low. Any other value is high.
    fn from(sample: u8) -> Self {
        if sample == 0 {
            Level::Low
        } else {
            Level::High
        }
    }
}

/// A maximal run of identical samples
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Run {
    /// Level of every sample in the run
    pub level: Level,

    /// Number of samples, always at least one
    pub length: usize,
}

impl Run {
    /// New run
    pub fn new(level: Level, length: usize) -> Self {
        Self { level, length }
    }
}

/// Streaming run-length segmenter
///
/// The segmenter remembers the level of the run which was still in
/// progress at the end of the last call to
/// [`segment()`](#method.segment). Everything else is the caller's
/// job: samples which were not consumed must be supplied again.
///
/// Samples may also be supplied one at a time with
/// [`push()`](#method.push), which counts the samples of the
/// unterminated run itself. Pick one method per stream.
///
/// ```
/// use dcfrx::{Level, Run, RunLengthSegmenter};
///
/// let mut seg = RunLengthSegmenter::new();
/// let mut runs: Vec<Run> = vec![];
///
/// let consumed = seg.segment(&[1, 1, 1, 0, 0], &mut runs);
/// assert_eq!(consumed, 3);
/// assert_eq!(runs, vec![Run::new(Level::High, 3)]);
///
/// // the two zeros were not consumed: send them again
/// let consumed = seg.segment(&[0, 0, 0, 1], &mut runs);
/// assert_eq!(consumed, 3);
/// assert_eq!(runs[1], Run::new(Level::Low, 3));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunLengthSegmenter {
    // level of the unterminated run, once known
    level: Option<Level>,

    // samples of the unterminated run seen by push()
    length: usize,

    // swap high and low on input
    invert: bool,
}

impl RunLengthSegmenter {
    /// New segmenter
    pub fn new() -> Self {
        Self::default()
    }

    /// New segmenter which swaps `0` and `1` samples
    ///
    /// Some receiver modules pull their output low when the
    /// carrier is present.
    pub fn new_inverted() -> Self {
        Self {
            level: None,
            length: 0,
            invert: true,
        }
    }

    /// Reset to zero initial conditions
    pub fn reset(&mut self) {
        self.level = None;
        self.length = 0;
    }

    /// Level of the run in progress, if any samples have been seen
    pub fn level(&self) -> Option<Level> {
        self.level
    }

    /// Split `samples` into complete runs
    ///
    /// Every run which is known to be complete is appended to
    /// `runs`. Returns the number of samples consumed from the
    /// front of `samples`. The unconsumed tail is the start of a
    /// run which has not ended yet. It must be prepended to the
    /// next batch.
    ///
    /// If all the samples have the same level, nothing is consumed.
    /// This is not an error; more samples are simply needed.
    pub fn segment<E>(&mut self, samples: &[u8], runs: &mut E) -> usize
    where
        E: Extend<Run>,
    {
        let mut level = match (self.level, samples.first()) {
            (Some(level), _) => level,
            (None, Some(&sa)) => self.level_of(sa),
            (None, None) => return 0,
        };

        let mut start = 0;
        for (i, &sa) in samples.iter().enumerate() {
            let sa_level = self.level_of(sa);
            if sa_level == level {
                continue;
            }

            // a zero-length run only happens when the carried level
            // disagrees with the first re-delivered sample
            if i > start {
                runs.extend(std::iter::once(Run::new(level, i - start)));
            }
            start = i;
            level = sa_level;
        }

        self.level = Some(level);
        self.length = 0;
        start
    }

    /// Add one sample
    ///
    /// Returns the run which `sample` terminates, if any. The
    /// samples of the run in progress are counted, not stored, so
    /// a carrier which never changes level costs no memory.
    ///
    /// ```
    /// use dcfrx::{Level, Run, RunLengthSegmenter};
    ///
    /// let mut seg = RunLengthSegmenter::new();
    /// assert_eq!(None, seg.push(1));
    /// assert_eq!(None, seg.push(1));
    /// assert_eq!(Some(Run::new(Level::High, 2)), seg.push(0));
    /// assert_eq!(seg.pending(), 1);
    /// ```
    pub fn push(&mut self, sample: u8) -> Option<Run> {
        let level = self.level_of(sample);
        match self.level {
            Some(current) if current == level => {
                self.length = self.length.saturating_add(1);
                None
            }
            Some(current) if self.length > 0 => {
                let run = Run::new(current, self.length);
                self.level = Some(level);
                self.length = 1;
                Some(run)
            }
            _ => {
                self.level = Some(level);
                self.length = 1;
                None
            }
        }
    }

    /// Number of samples in the run in progress
    ///
    /// Only samples given to [`push()`](#method.push) are counted.
    pub fn pending(&self) -> usize {
        self.length
    }

    #[inline]
    fn level_of(&self, sample: u8) -> Level {
        let level = Level::from(sample);
        if self.invert {
            level.inverted()
        } else {
            level
        }
    }
}
