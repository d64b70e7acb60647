//! Minute frame decoding

use std::convert::TryFrom;

use crate::layout::{
    FieldLayout, BIT_CEST, BIT_CET, DAY, FRAME_LENGTH, HOUR, MINUTE, MONTH, PARITY_GROUPS,
    WEEKDAY, YEAR,
};
use crate::message::{DecodeErr, Month, TimeRecord, Timezone, Weekday};

/// Decode a minute frame with default settings
///
/// Equivalent to [`FrameDecoder::new()`] followed by
/// [`FrameDecoder::decode()`].
///
/// ```
/// use dcfrx::{decode, DecodeErr};
///
/// let frame = [
///     0, 0, 0, 0, 1, 1, 1, 0, 0, 0, 1, 0, 1, 1, 1, 0, 0, 1, 0, 0,
///     1, 1, 1, 0, 0, 0, 0, 1, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 1,
///     0, 1, 0, 1, 0, 1, 0, 0, 1, 0, 0, 0, 0, 0, 0, 1, 0, 0, 1,
/// ];
/// let rec = decode(&frame).expect("valid frame");
/// assert_eq!("Tue 29 Sep 2020 00:43:00 CEST", rec.to_string());
///
/// assert_eq!(Err(DecodeErr::FrameLength { len: 58 }), decode(&frame[1..]));
/// ```
pub fn decode(frame: &[u8]) -> Result<TimeRecord, DecodeErr> {
    FrameDecoder::new().decode(frame)
}

/// DCF77 minute frame decoder
///
/// The decoder validates a complete frame and extracts a
/// [`TimeRecord`]. Validation runs in transmission order and stops
/// at the first failure:
///
/// 1. The three parity groups: minutes, hours, then date
/// 2. The timezone flags
/// 3. Minute, hour, and day of month
/// 4. Day of week, which must be in `1..=7`
/// 5. Month, which must be in `1..=12`
/// 6. Year within the 21st century
///
/// Range checks on the minute, hour, day, and year may be disabled
/// with [`with_range_check()`](#method.with_range_check). The
/// weekday and month are always checked because they are converted
/// to enumerations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameDecoder {
    range_check: bool,
}

impl FrameDecoder {
    /// New decoder with range checks enabled
    pub fn new() -> Self {
        Self { range_check: true }
    }

    /// Enable or disable numeric range checks
    ///
    /// When disabled, minute, hour, day, and year fields report
    /// whatever their weighted sum is, even if it is impossible
    /// (like minute `79`). Parity alone cannot catch these.
    pub fn with_range_check(&mut self, range_check: bool) -> &mut Self {
        self.range_check = range_check;
        self
    }

    /// True if range checks are enabled
    pub fn range_check(&self) -> bool {
        self.range_check
    }

    /// Decode a complete minute frame
    ///
    /// The `frame` must contain exactly [`FRAME_LENGTH`] bits,
    /// one per element. Any non-zero element is a set bit. The
    /// frame is not modified.
    pub fn decode(&self, frame: &[u8]) -> Result<TimeRecord, DecodeErr> {
        if frame.len() != FRAME_LENGTH {
            return Err(DecodeErr::FrameLength { len: frame.len() });
        }

        for group in PARITY_GROUPS.iter() {
            if !group.is_valid(frame) {
                return Err(DecodeErr::Parity(group.group));
            }
        }

        let timezone = decode_timezone(frame)?;
        let minute = self.field(&MINUTE, frame)?;
        let hour = self.field(&HOUR, frame)?;
        let day = self.field(&DAY, frame)?;
        let weekday = Weekday::try_from(WEEKDAY.weighted_sum(frame))?;
        let month = Month::try_from(MONTH.weighted_sum(frame))?;
        let year = self.field(&YEAR, frame)?;

        Ok(TimeRecord::new(
            2000 + year as u16,
            month,
            day,
            weekday,
            hour,
            minute,
            timezone,
        ))
    }

    // decode a numeric field, checking its range if required
    fn field(&self, layout: &FieldLayout, frame: &[u8]) -> Result<u8, DecodeErr> {
        let value = layout.weighted_sum(frame);
        if self.range_check && !layout.contains(value) {
            Err(DecodeErr::OutOfRange {
                field: layout.field,
                value,
            })
        } else {
            Ok(value)
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<&[u8]> for TimeRecord {
    type Error = DecodeErr;

    /// Decode a frame with default settings
    fn try_from(frame: &[u8]) -> Result<Self, Self::Error> {
        decode(frame)
    }
}

// Summer time wins if both flags are set
fn decode_timezone(frame: &[u8]) -> Result<Timezone, DecodeErr> {
    if frame[BIT_CEST] != 0 {
        Ok(Timezone::Cest)
    } else if frame[BIT_CET] != 0 {
        Ok(Timezone::Cet)
    } else {
        Err(DecodeErr::AmbiguousTimezone)
    }
}
