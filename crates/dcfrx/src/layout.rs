//! DCF77 minute frame layout
//!
//! Each minute, DCF77 transmits one bit per second for seconds
//! `0..=58`. Second 59 carries no pulse at all; its absence is how
//! receivers find the start of the next minute.
//!
//! ```txt
//!  0          15 16 17 18 19 20 21        28 29      35 36                        58
//! +-------------+--+--+--+--+--+-----------+-+--------+-+--------------------------+-+
//! | weather/civ |A1|Z1|Z2|A2|S | minute    |P| hour   |P| day, wday, month, year   |P|
//! +-------------+--+--+--+--+--+-----------+-+--------+-+--------------------------+-+
//! ```
//!
//! All numeric fields are packed as two decimal digits. The units
//! digit uses weights `1, 2, 4, 8` and the tens digit continues with
//! `10, 20, 40, 80`. The complete table of fields is [`FIELDS`], and
//! the three even-parity groups are listed in [`PARITY_GROUPS`].

/// Number of bits in one complete minute frame
pub const FRAME_LENGTH: usize = 59;

/// Summer time (CEST) flag
pub const BIT_CEST: usize = 17;

/// Standard time (CET) flag
pub const BIT_CET: usize = 18;

/// Start of encoded time, always set
pub const BIT_TIME_START: usize = 20;

/// A coded field of the minute frame
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumIter,
)]
pub enum Field {
    /// Minute of the hour
    #[strum(serialize = "minute")]
    Minute,

    /// Hour of the day
    #[strum(serialize = "hour")]
    Hour,

    /// Day of the month
    #[strum(serialize = "day")]
    Day,

    /// Day of the week, Monday is `1`
    #[strum(serialize = "weekday")]
    Weekday,

    /// Month of the year
    #[strum(serialize = "month")]
    Month,

    /// Year within the century
    #[strum(serialize = "year")]
    Year,
}

/// Even-parity group
///
/// Each group covers a contiguous run of data bits which is
/// immediately followed by its check bit.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumIter,
)]
pub enum ParityGroup {
    /// Minute bits, checked by bit 28
    #[strum(serialize = "minutes")]
    Minutes,

    /// Hour bits, checked by bit 35
    #[strum(serialize = "hours")]
    Hours,

    /// Calendar date bits, checked by bit 58
    #[strum(serialize = "date")]
    Date,
}

/// Location and encoding of one [`Field`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldLayout {
    /// Which field this is
    pub field: Field,

    /// Frame position of the least-significant bit
    pub offset: usize,

    /// Weight of each bit, starting at `offset`
    pub weights: &'static [u8],

    /// Smallest legal value
    pub min: u8,

    /// Largest legal value
    pub max: u8,
}

impl FieldLayout {
    /// Number of bits occupied by the field
    pub fn width(&self) -> usize {
        self.weights.len()
    }

    /// Frame positions occupied by the field
    pub fn bits(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.width()
    }

    /// True if `value` is legal for this field
    pub fn contains(&self, value: u8) -> bool {
        value >= self.min && value <= self.max
    }

    /// Decode the field's weighted sum
    ///
    /// The `frame` must be at least [`FRAME_LENGTH`] bits long.
    /// Any non-zero element counts as a set bit.
    pub fn weighted_sum(&self, frame: &[u8]) -> u8 {
        frame[self.bits()]
            .iter()
            .zip(self.weights.iter())
            .map(|(&bit, &weight)| if bit != 0 { weight } else { 0 })
            .sum()
    }

    /// Encode `value` into the field's bits
    ///
    /// Bits are assigned greedily from the heaviest weight down,
    /// which reproduces the two-digit packing for any legal value.
    /// Parity bits are not touched; see [`fill_parity()`].
    pub fn encode(&self, value: u8, frame: &mut [u8]) {
        let mut remaining = value;
        for (pos, &weight) in self.bits().zip(self.weights.iter()).rev() {
            if remaining >= weight {
                remaining -= weight;
                frame[pos] = 1;
            } else {
                frame[pos] = 0;
            }
        }
    }
}

/// Location of one [`ParityGroup`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParityLayout {
    /// Which group this is
    pub group: ParityGroup,

    /// First data bit
    pub start: usize,

    /// Check bit, which follows the last data bit
    pub check: usize,
}

impl ParityLayout {
    /// Data bits covered by the group
    pub fn bits(&self) -> std::ops::Range<usize> {
        self.start..self.check
    }

    /// Even parity of the data bits
    pub fn parity(&self, frame: &[u8]) -> u8 {
        let ones = frame[self.bits()].iter().filter(|&&bit| bit != 0).count();
        (ones % 2) as u8
    }

    /// True if the check bit agrees with the data bits
    pub fn is_valid(&self, frame: &[u8]) -> bool {
        self.parity(frame) == (frame[self.check] != 0) as u8
    }
}

/// Minute of the hour, bits 21..=27
pub const MINUTE: FieldLayout = FieldLayout {
    field: Field::Minute,
    offset: 21,
    weights: &[1, 2, 4, 8, 10, 20, 40],
    min: 0,
    max: 59,
};

/// Hour of the day, bits 29..=34
pub const HOUR: FieldLayout = FieldLayout {
    field: Field::Hour,
    offset: 29,
    weights: &[1, 2, 4, 8, 10, 20],
    min: 0,
    max: 23,
};

/// Day of the month, bits 36..=41
pub const DAY: FieldLayout = FieldLayout {
    field: Field::Day,
    offset: 36,
    weights: &[1, 2, 4, 8, 10, 20],
    min: 1,
    max: 31,
};

/// Day of the week, Monday is 1, bits 42..=44
pub const WEEKDAY: FieldLayout = FieldLayout {
    field: Field::Weekday,
    offset: 42,
    weights: &[1, 2, 4],
    min: 1,
    max: 7,
};

/// Month of the year, bits 45..=49
pub const MONTH: FieldLayout = FieldLayout {
    field: Field::Month,
    offset: 45,
    weights: &[1, 2, 4, 8, 10],
    min: 1,
    max: 12,
};

/// Year of the century, bits 50..=57
pub const YEAR: FieldLayout = FieldLayout {
    field: Field::Year,
    offset: 50,
    weights: &[1, 2, 4, 8, 10, 20, 40, 80],
    min: 0,
    max: 99,
};

/// Every coded field, in transmission order
pub const FIELDS: [FieldLayout; 6] = [MINUTE, HOUR, DAY, WEEKDAY, MONTH, YEAR];

/// Every parity group, in transmission order
pub const PARITY_GROUPS: [ParityLayout; 3] = [
    ParityLayout {
        group: ParityGroup::Minutes,
        start: 21,
        check: 28,
    },
    ParityLayout {
        group: ParityGroup::Hours,
        start: 29,
        check: 35,
    },
    ParityLayout {
        group: ParityGroup::Date,
        start: 36,
        check: 58,
    },
];

/// Look up the layout for `field`
pub fn layout_of(field: Field) -> &'static FieldLayout {
    match field {
        Field::Minute => &MINUTE,
        Field::Hour => &HOUR,
        Field::Day => &DAY,
        Field::Weekday => &WEEKDAY,
        Field::Month => &MONTH,
        Field::Year => &YEAR,
    }
}

/// Set every check bit in `frame` to match its data
pub fn fill_parity(frame: &mut [u8]) {
    for group in PARITY_GROUPS.iter() {
        frame[group.check] = group.parity(frame);
    }
}
