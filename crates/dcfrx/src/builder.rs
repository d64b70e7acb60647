use crate::classifier::BitClassifier;
use crate::receiver::DcfReceiver;

/// Builds a DCF77 receiver
///
/// The builder comes with a sensible set of default options.
/// All you really need to provide is the input sampling rate.
/// The [`DcfReceiver`](struct.DcfReceiver.html) works at any
/// rate which resolves the 100 ms difference between a `0` and
/// a `1` pulse. A few hundred hertz is plenty.
///
/// The API specified by the builder is part of this crate's
/// API. The actual default values are *not*, however, and
/// are subject to revision in any minor release. If you
/// care very strongly about a setting, be sure to configure
/// it here.
///
/// ```
/// use dcfrx::DcfReceiverBuilder;
///
/// let rx = DcfReceiverBuilder::new(1000)
///     .with_inverted_input(true)
///     .with_bit_threshold(0.14)
///     .build();
/// assert_eq!(rx.input_rate(), 1000);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct DcfReceiverBuilder {
    input_rate: u32,
    sync_threshold: f32,
    bit_threshold: f32,
    invert: bool,
    range_check: bool,
    reset_on_error: bool,
}

impl DcfReceiverBuilder {
    /// New receiver chain with "sensible" defaults
    ///
    /// The only mandatory parameter is the input sampling
    /// rate, in Hz. Every duration threshold is scaled to this
    /// rate.
    pub fn new(input_rate: u32) -> Self {
        Self {
            input_rate,
            sync_threshold: BitClassifier::DEFAULT_SYNC_THRESHOLD_SECS,
            bit_threshold: BitClassifier::DEFAULT_BIT_THRESHOLD_SECS,
            invert: false,
            range_check: true,
            reset_on_error: true,
        }
    }

    /// Build a receiver chain
    ///
    /// Once built, the receiver chain is immediately ready to
    /// process samples.
    pub fn build(&self) -> DcfReceiver {
        DcfReceiver::from(self)
    }

    /// Sync gap threshold (seconds)
    ///
    /// A high-carrier run which lasts longer than `secs` marks
    /// the missing second 59 and starts a new frame. Normal
    /// gaps between pulses last at most 900 ms, and the sync gap
    /// lasts at least 1.8 s. The threshold is clamped to the
    /// range `[0.9, 1.8]`.
    pub fn with_sync_threshold(&mut self, secs: f32) -> &mut Self {
        self.sync_threshold = f32::clamp(secs, 0.9, 1.8);
        self
    }

    /// One/zero pulse threshold (seconds)
    ///
    /// Low-carrier pulses longer than `secs` are ones, and all
    /// others are zeros. Nominal pulses are 100 ms and 200 ms
    /// long. The threshold is clamped to the range `[0.1, 0.2]`.
    pub fn with_bit_threshold(&mut self, secs: f32) -> &mut Self {
        self.bit_threshold = f32::clamp(secs, 0.1, 0.2);
        self
    }

    /// Invert input samples
    ///
    /// Normally, a zero sample means the carrier is reduced.
    /// Some receiver modules drive their output the other way:
    /// their output pin goes *high* during each pulse. Set this
    /// flag to receive from them.
    pub fn with_inverted_input(&mut self, invert: bool) -> &mut Self {
        self.invert = invert;
        self
    }

    /// Check numeric fields against their legal ranges
    ///
    /// When enabled, frames with a minute, hour, day, or year
    /// that cannot exist are rejected, even if they pass parity.
    /// Enabled by default.
    pub fn with_range_check(&mut self, range_check: bool) -> &mut Self {
        self.range_check = range_check;
        self
    }

    /// Discard frames which fail to decode
    ///
    /// When enabled, a frame which fails to decode is discarded
    /// immediately. When disabled, the failed frame is kept until
    /// the next sync gap, which matters only if that gap is
    /// missed. Enabled by default.
    pub fn with_reset_on_error(&mut self, reset_on_error: bool) -> &mut Self {
        self.reset_on_error = reset_on_error;
        self
    }

    /// Input sampling rate (Hz)
    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    /// Sync gap threshold (seconds)
    pub fn sync_threshold(&self) -> f32 {
        self.sync_threshold
    }

    /// One/zero pulse threshold (seconds)
    pub fn bit_threshold(&self) -> f32 {
        self.bit_threshold
    }

    /// True if input samples are inverted
    pub fn inverted_input(&self) -> bool {
        self.invert
    }

    /// True if numeric fields are range-checked
    pub fn range_check(&self) -> bool {
        self.range_check
    }

    /// True if failed frames are discarded immediately
    pub fn reset_on_error(&self) -> bool {
        self.reset_on_error
    }
}

impl std::default::Default for DcfReceiverBuilder {
    fn default() -> Self {
        Self::new(100)
    }
}
