//! DCF77 waveform synthesis
//!
//! These functions transmit rather than receive. They are useful
//! for testing a receiver without a radio.

use crate::layout::{
    fill_parity, Field, BIT_CEST, BIT_CET, BIT_TIME_START, FIELDS, FRAME_LENGTH,
};
use crate::message::{TimeRecord, Timezone};

/// Encode a minute frame
///
/// Produces the frame which announces `rec`, with valid parity.
/// The first twenty bits, which carry weather and civil warning
/// data, are left zero.
///
/// ```
/// use dcfrx::{decode, encode_frame, Month, TimeRecord, Timezone, Weekday};
///
/// let rec = TimeRecord::new(2024, Month::May, 26, Weekday::Sunday, 18, 58, Timezone::Cest);
/// let frame = encode_frame(&rec);
/// assert_eq!(Ok(rec), decode(&frame));
/// ```
pub fn encode_frame(rec: &TimeRecord) -> [u8; FRAME_LENGTH] {
    let mut frame = [0u8; FRAME_LENGTH];
    frame[BIT_TIME_START] = 1;
    match rec.timezone() {
        Timezone::Cest => frame[BIT_CEST] = 1,
        Timezone::Cet => frame[BIT_CET] = 1,
    }

    for layout in FIELDS.iter() {
        let value = match layout.field {
            Field::Minute => rec.minute(),
            Field::Hour => rec.hour(),
            Field::Day => rec.day(),
            Field::Weekday => rec.weekday().number(),
            Field::Month => rec.month().number(),
            Field::Year => (rec.year() % 100) as u8,
        };
        layout.encode(value, &mut frame);
    }

    fill_parity(&mut frame);
    frame
}

/// Modulate a frame into one minute of samples
///
/// Each bit becomes one second of samples at `input_rate`. The
/// second starts with a low pulse of 100 ms for a `0` or 200 ms
/// for a `1`, and the carrier is high for the remainder. Second
/// 59 is high throughout. Samples are `0` for low and `1` for high.
///
/// The output begins with the first pulse of the minute and ends
/// with the sync gap. The gap is only recognized once the first
/// pulse of the following minute arrives.
pub fn modulate_frame(frame: &[u8], input_rate: u32) -> Vec<u8> {
    let rate = input_rate as usize;
    let mut out = Vec::with_capacity(rate * (frame.len() + 1));
    for &bit in frame {
        let low = if bit != 0 { rate / 5 } else { rate / 10 };
        out.extend(std::iter::repeat(0u8).take(low));
        out.extend(std::iter::repeat(1u8).take(rate - low));
    }
    out.extend(std::iter::repeat(1u8).take(rate));
    out
}
