//! Decoded time records

use std::convert::TryFrom;
use std::fmt;

#[cfg(feature = "chrono")]
use chrono::{DateTime, FixedOffset, TimeZone};
use strum::{EnumMessage, IntoEnumIterator};
use thiserror::Error;

use crate::layout::{Field, ParityGroup, FRAME_LENGTH};

/// A fully-decoded DCF77 minute frame
///
/// Each minute frame describes the civil time in Germany at the
/// *start of the next minute*: the instant the sync gap ends. The
/// seconds field is therefore always zero.
///
/// `TimeRecord` prints in a compact human-readable form:
///
/// ```
/// use dcfrx::{Month, TimeRecord, Timezone, Weekday};
///
/// let rec = TimeRecord::new(2020, Month::September, 29, Weekday::Tuesday, 0, 43, Timezone::Cest);
/// assert_eq!("Tue 29 Sep 2020 00:43:00 CEST", rec.to_string());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeRecord {
    year: u16,
    month: Month,
    day: u8,
    weekday: Weekday,
    hour: u8,
    minute: u8,
    timezone: Timezone,
}

impl TimeRecord {
    /// Create a record from its fields
    ///
    /// No calendar validation is performed.
    pub fn new(
        year: u16,
        month: Month,
        day: u8,
        weekday: Weekday,
        hour: u8,
        minute: u8,
        timezone: Timezone,
    ) -> Self {
        Self {
            year,
            month,
            day,
            weekday,
            hour,
            minute,
            timezone,
        }
    }

    /// Full year, like `2024`
    pub fn year(&self) -> u16 {
        self.year
    }

    /// Month of the year
    pub fn month(&self) -> Month {
        self.month
    }

    /// Day of the month, starting at `1`
    pub fn day(&self) -> u8 {
        self.day
    }

    /// Day of the week
    pub fn weekday(&self) -> Weekday {
        self.weekday
    }

    /// Hour of the day, `0..=23`
    pub fn hour(&self) -> u8 {
        self.hour
    }

    /// Minute of the hour, `0..=59`
    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Second of the minute
    ///
    /// Frames mark whole minutes, so this is always zero.
    pub fn second(&self) -> u8 {
        0
    }

    /// Timezone in effect
    pub fn timezone(&self) -> Timezone {
        self.timezone
    }

    /// Convert to a calendar datetime
    ///
    /// The datetime carries the fixed UTC offset of the
    /// transmitted [`Timezone`]. Returns `None` if the fields do
    /// not form a real date, such as the 31st of February. Such
    /// frames can pass parity and are only caught here.
    ///
    /// ```
    /// # use dcfrx::{Month, TimeRecord, Timezone, Weekday};
    /// let rec = TimeRecord::new(2024, Month::May, 26, Weekday::Sunday, 18, 58, Timezone::Cest);
    /// let dt = rec.to_datetime().unwrap();
    /// assert_eq!(dt.to_rfc3339(), "2024-05-26T18:58:00+02:00");
    /// assert_eq!(dt.timestamp(), 1716742680);
    /// ```
    ///
    /// Requires `chrono`.
    #[cfg(feature = "chrono")]
    pub fn to_datetime(&self) -> Option<DateTime<FixedOffset>> {
        let offset = FixedOffset::east_opt(self.timezone.utc_offset_secs())?;
        offset
            .with_ymd_and_hms(
                self.year as i32,
                self.month as u32,
                self.day as u32,
                self.hour as u32,
                self.minute as u32,
                0,
            )
            .single()
    }
}

impl fmt::Display for TimeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:2} {} {:4} {:02}:{:02}:{:02} {}",
            self.weekday.as_code_str(),
            self.day,
            self.month.as_code_str(),
            self.year,
            self.hour,
            self.minute,
            self.second(),
            self.timezone.as_code_str()
        )
    }
}

/// Error decoding a minute frame
///
/// Every variant describes one frame which could not be decoded.
/// None of them indicate a problem with the receiver itself, which
/// keeps running and will try again on the next minute.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DecodeErr {
    /// The frame does not have exactly [`FRAME_LENGTH`] bits
    #[error("invalid DCF77 frame: expected {} bits, got {len}", FRAME_LENGTH)]
    FrameLength {
        /// Number of bits actually present
        len: usize,
    },

    /// A parity check failed
    #[error("parity error decoding {0}")]
    Parity(ParityGroup),

    /// Neither the CEST nor the CET flag is set
    #[error("could not parse timezone: neither CEST nor CET flag is set")]
    AmbiguousTimezone,

    /// The day of the week is not in `1..=7`
    #[error("invalid day of week: {0}")]
    InvalidWeekday(u8),

    /// The month is not in `1..=12`
    #[error("invalid month: {0}")]
    InvalidMonth(u8),

    /// A numeric field is outside its legal range
    #[error("invalid {field}: {value}")]
    OutOfRange {
        /// Offending field
        field: Field,

        /// Decoded value
        value: u8,
    },
}

/// Day of the week
///
/// DCF77 numbers the days of the week starting from Monday.
///
/// ```
/// use std::convert::TryFrom;
/// use dcfrx::Weekday;
///
/// assert_eq!(Weekday::Monday, Weekday::try_from(1).unwrap());
/// assert_eq!("Mon", Weekday::Monday.as_code_str());
/// assert_eq!("Monday", format!("{}", Weekday::Monday));
/// assert_eq!("Mon", format!("{:#}", Weekday::Monday));
/// assert!(Weekday::try_from(0).is_err());
/// ```
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum_macros::EnumMessage,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
#[repr(u8)]
pub enum Weekday {
    #[strum(serialize = "Mon", detailed_message = "Monday")]
    Monday = 1,
    #[strum(serialize = "Tue", detailed_message = "Tuesday")]
    Tuesday = 2,
    #[strum(serialize = "Wed", detailed_message = "Wednesday")]
    Wednesday = 3,
    #[strum(serialize = "Thu", detailed_message = "Thursday")]
    Thursday = 4,
    #[strum(serialize = "Fri", detailed_message = "Friday")]
    Friday = 5,
    #[strum(serialize = "Sat", detailed_message = "Saturday")]
    Saturday = 6,
    #[strum(serialize = "Sun", detailed_message = "Sunday")]
    Sunday = 7,
}

impl Weekday {
    /// Human-readable string representation, like "`Monday`"
    pub fn as_display_str(&self) -> &'static str {
        self.get_detailed_message().expect("missing definition")
    }

    /// Three-letter abbreviation, like "`Mon`"
    pub fn as_code_str(&self) -> &'static str {
        self.get_serializations()[0]
    }

    /// Transmitted number, `1` for Monday through `7` for Sunday
    pub fn number(&self) -> u8 {
        *self as u8
    }
}

impl TryFrom<u8> for Weekday {
    type Error = DecodeErr;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Weekday::iter()
            .find(|day| day.number() == value)
            .ok_or(DecodeErr::InvalidWeekday(value))
    }
}

impl fmt::Display for Weekday {
    /// Printable string
    ///
    /// * The normal form is the full name, like "`Monday`"
    /// * The alternate form is the abbreviation, like "`Mon`"
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.pad(self.as_code_str())
        } else {
            f.pad(self.as_display_str())
        }
    }
}

/// Month of the year
///
/// ```
/// use std::convert::TryFrom;
/// use dcfrx::Month;
///
/// assert_eq!(Month::September, Month::try_from(9).unwrap());
/// assert_eq!("Sep", Month::September.as_code_str());
/// assert!(Month::try_from(13).is_err());
/// ```
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum_macros::EnumMessage,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
#[repr(u8)]
pub enum Month {
    #[strum(serialize = "Jan", detailed_message = "January")]
    January = 1,
    #[strum(serialize = "Feb", detailed_message = "February")]
    February = 2,
    #[strum(serialize = "Mar", detailed_message = "March")]
    March = 3,
    #[strum(serialize = "Apr", detailed_message = "April")]
    April = 4,
    #[strum(serialize = "May", detailed_message = "May")]
    May = 5,
    #[strum(serialize = "Jun", detailed_message = "June")]
    June = 6,
    #[strum(serialize = "Jul", detailed_message = "July")]
    July = 7,
    #[strum(serialize = "Aug", detailed_message = "August")]
    August = 8,
    #[strum(serialize = "Sep", detailed_message = "September")]
    September = 9,
    #[strum(serialize = "Oct", detailed_message = "October")]
    October = 10,
    #[strum(serialize = "Nov", detailed_message = "November")]
    November = 11,
    #[strum(serialize = "Dec", detailed_message = "December")]
    December = 12,
}

impl Month {
    /// Human-readable string representation, like "`January`"
    pub fn as_display_str(&self) -> &'static str {
        self.get_detailed_message().expect("missing definition")
    }

    /// Three-letter abbreviation, like "`Jan`"
    pub fn as_code_str(&self) -> &'static str {
        self.get_serializations()[0]
    }

    /// Month number, `1` for January
    pub fn number(&self) -> u8 {
        *self as u8
    }
}

impl TryFrom<u8> for Month {
    type Error = DecodeErr;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Month::iter()
            .find(|month| month.number() == value)
            .ok_or(DecodeErr::InvalidMonth(value))
    }
}

impl fmt::Display for Month {
    /// Printable string
    ///
    /// * The normal form is the full name, like "`January`"
    /// * The alternate form is the abbreviation, like "`Jan`"
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.pad(self.as_code_str())
        } else {
            f.pad(self.as_display_str())
        }
    }
}

/// Transmitted timezone
///
/// DCF77 always transmits German civil time, which is either
/// standard time or summer time.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum_macros::EnumMessage,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
pub enum Timezone {
    /// Central European Time, UTC+1
    #[strum(serialize = "CET", detailed_message = "Central European Time")]
    Cet,

    /// Central European Summer Time, UTC+2
    #[strum(serialize = "CEST", detailed_message = "Central European Summer Time")]
    Cest,
}

impl Timezone {
    /// Human-readable string representation
    pub fn as_display_str(&self) -> &'static str {
        self.get_detailed_message().expect("missing definition")
    }

    /// Abbreviation, like "`CEST`"
    pub fn as_code_str(&self) -> &'static str {
        self.get_serializations()[0]
    }

    /// Offset from UTC, in seconds
    pub fn utc_offset_secs(&self) -> i32 {
        match self {
            Timezone::Cet => 3600,
            Timezone::Cest => 7200,
        }
    }
}

impl fmt::Display for Timezone {
    /// Printable string
    ///
    /// * The normal form is the abbreviation, like "`CEST`"
    /// * The alternate form is the full name
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.pad(self.as_display_str())
        } else {
            f.pad(self.as_code_str())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::str::FromStr;

    #[test]
    fn test_weekday_bijection() {
        let mut seen = Vec::new();
        for num in 1..=7u8 {
            let day = Weekday::try_from(num).expect("valid weekday");
            assert_eq!(day.number(), num);
            assert!(!seen.contains(&day));
            seen.push(day);
        }
        assert_eq!(seen.len(), Weekday::iter().count());
        assert_eq!(Weekday::try_from(1), Ok(Weekday::Monday));
        assert_eq!(Weekday::try_from(7), Ok(Weekday::Sunday));

        assert_eq!(Weekday::try_from(0), Err(DecodeErr::InvalidWeekday(0)));
        assert_eq!(Weekday::try_from(8), Err(DecodeErr::InvalidWeekday(8)));
    }

    #[test]
    fn test_month() {
        let names: Vec<&str> = Month::iter().map(|m| m.as_code_str()).collect();
        assert_eq!(
            names,
            vec!["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"]
        );
        assert_eq!(Month::try_from(12), Ok(Month::December));
        assert_eq!(Month::try_from(0), Err(DecodeErr::InvalidMonth(0)));
        assert_eq!(Month::try_from(13), Err(DecodeErr::InvalidMonth(13)));
        assert_eq!(Month::from_str("Oct"), Ok(Month::October));
        assert_eq!("October", Month::October.to_string());
    }

    #[test]
    fn test_timezone() {
        assert_eq!("CEST", Timezone::Cest.to_string());
        assert_eq!("Central European Time", format!("{:#}", Timezone::Cet));
        assert_eq!(Timezone::from_str("CET"), Ok(Timezone::Cet));
        assert_eq!(3600, Timezone::Cet.utc_offset_secs());
    }

    #[test]
    fn test_display() {
        let rec = TimeRecord::new(2021, Month::March, 7, Weekday::Sunday, 9, 5, Timezone::Cet);
        assert_eq!("Sun  7 Mar 2021 09:05:00 CET", rec.to_string());
        assert_eq!(0, rec.second());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            "parity error decoding minutes",
            DecodeErr::Parity(ParityGroup::Minutes).to_string()
        );
        assert_eq!(
            "invalid DCF77 frame: expected 59 bits, got 57",
            DecodeErr::FrameLength { len: 57 }.to_string()
        );
        assert_eq!(
            "invalid hour: 24",
            DecodeErr::OutOfRange {
                field: Field::Hour,
                value: 24
            }
            .to_string()
        );
    }

    #[cfg(feature = "chrono")]
    #[test]
    fn test_to_datetime() {
        let rec = TimeRecord::new(2020, Month::September, 29, Weekday::Tuesday, 0, 43, Timezone::Cest);
        let dt = rec.to_datetime().expect("valid date");
        assert_eq!("2020-09-29T00:43:00+02:00", dt.to_rfc3339());

        let rec = TimeRecord::new(2023, Month::February, 31, Weekday::Friday, 12, 0, Timezone::Cet);
        assert_eq!(None, rec.to_datetime());
    }
}
