//! Event loop and child process supervision
//!
//! The receiver reports one event per pulse. Most are only of
//! interest to the log. Each decoded minute is printed and,
//! optionally, handed to a child process.
//!
//! At most one child runs at a time:
//!
//! ```txt
//!   start
//!     ||
//!     \/
//! +-----------+  decoded minute  +-----------+
//! |   Idle    | ===============> |  Running  |
//! +-----------+                  +-----------+
//!     /\                           ||     /\
//!     ||=== child exited ==========||     ||
//!                                  ||=====|| decoded minute,
//!                                            child still busy:
//!                                            minute is skipped
//! ```
//!
//! When the input is exhausted, we wait for any running child.

use std::process::Child;

use chrono::{DateTime, Datelike, TimeZone, Timelike};
use log::{debug, error, info, warn};

use dcfrx::{
    encode_frame, modulate_frame, DcfReceiver, FrameOut, Month, TimeRecord, Timezone, Weekday,
};

use crate::cli::Args;
use crate::spawner;

/// Run the application
///
/// Runs the `dcfdec` event loop with the given command-line
/// `args`, a fully-initialized `receiver`, and an `input`
/// iterator which returns each sample from some input source
/// until it is exhausted.
///
/// Returns the number of minutes decoded.
pub fn run<I>(args: &Args, receiver: &mut DcfReceiver, input: I) -> usize
where
    I: Iterator<Item = u8>,
{
    let input_rate_str = receiver.input_rate().to_string();
    let mut children = Children::new(&args.child, &input_rate_str);
    let mut decoded = 0;

    for evt in receiver.iter(input) {
        match evt {
            FrameOut::Ready(Ok(rec)) => {
                decoded += 1;
                if !args.quiet {
                    println!("{}", rec);
                }
                children.handle(&rec);
            }
            FrameOut::Ready(Err(err)) => {
                warn!("minute lost: {}", err);
            }
            FrameOut::Synchronized => {
                debug!("minute sync");
            }
            _ => {}
        }
    }

    children.finish();
    decoded
}

/// Synthesize a demonstration signal
///
/// Returns samples at `input_rate` for the two minutes which
/// follow `now`, preceded by a sync gap. The second minute's
/// sync gap is terminated so that it is reported too.
pub fn make_demo_signal<Tz>(now: &DateTime<Tz>, input_rate: u32) -> Vec<u8>
where
    Tz: TimeZone,
{
    let rate = input_rate as usize;
    let mut out = vec![1u8; 2 * rate];
    for minutes_ahead in 1..=2 {
        let rec = demo_record(now, minutes_ahead);
        out.extend(modulate_frame(&encode_frame(&rec), input_rate));
    }
    out.extend(std::iter::repeat(0u8).take(rate / 10));
    out.push(1);
    out
}

// The time which a frame sent `minutes_ahead - 1` minutes from `now`
// would announce. Summer time is assumed from April through October.
fn demo_record<Tz>(now: &DateTime<Tz>, minutes_ahead: u32) -> TimeRecord
where
    Tz: TimeZone,
{
    let at = now.clone() + chrono::Duration::minutes(minutes_ahead as i64);
    let month = Month::try_from(at.month() as u8).unwrap_or(Month::January);
    let weekday =
        Weekday::try_from(at.weekday().number_from_monday() as u8).unwrap_or(Weekday::Monday);
    let timezone = if (4..=10).contains(&at.month()) {
        Timezone::Cest
    } else {
        Timezone::Cet
    };

    TimeRecord::new(
        at.year() as u16,
        month,
        at.day() as u8,
        weekday,
        at.hour() as u8,
        at.minute() as u8,
        timezone,
    )
}

// Child process supervisor
struct Children<'args> {
    child_args: &'args [String],
    input_rate_str: &'args str,
    running: Option<Child>,
}

impl<'args> Children<'args> {
    fn new(child_args: &'args [String], input_rate_str: &'args str) -> Self {
        Self {
            child_args,
            input_rate_str,
            running: None,
        }
    }

    // Start a child for `rec`, unless one is already busy
    fn handle(&mut self, rec: &TimeRecord) {
        if self.child_args.is_empty() {
            return;
        }

        if self.is_busy() {
            warn!("child process still running; not spawning another for {}", rec);
            return;
        }

        match spawner::spawn(
            &self.child_args[0],
            &self.child_args[1..],
            rec,
            self.input_rate_str,
        ) {
            Ok(child) => {
                debug!("spawned child process PID {}", child.id());
                self.running = Some(child);
            }
            Err(err) => {
                error!("unable to spawn child process: {}", err);
            }
        }
    }

    // Reap the running child, if it has exited
    fn is_busy(&mut self) -> bool {
        let child = match self.running.as_mut() {
            Some(child) => child,
            None => return false,
        };

        match child.try_wait() {
            Ok(Some(exit)) => {
                report_exit(exit);
                self.running = None;
                false
            }
            Ok(None) => true,
            Err(err) => {
                error!("unable to query child process: {}", err);
                self.running = None;
                false
            }
        }
    }

    // Wait for the running child to exit
    fn finish(&mut self) {
        if let Some(mut child) = self.running.take() {
            info!("waiting for child process PID {} to exit", child.id());
            match child.wait() {
                Ok(exit) => report_exit(exit),
                Err(err) => error!("unable to await child process exit: {}", err),
            }
        }
    }
}

fn report_exit(exit: std::process::ExitStatus) {
    if exit.success() {
        debug!("child process exited successfully");
    } else {
        warn!(
            "child process exited abnormally with status {}",
            exit.code().unwrap_or(1)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::FixedOffset;
    use dcfrx::DcfReceiverBuilder;

    #[test]
    fn test_demo_record() {
        let now = FixedOffset::east_opt(7200)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 26, 18, 57, 30)
            .unwrap();
        assert_eq!(
            demo_record(&now, 1),
            TimeRecord::new(2024, Month::May, 26, Weekday::Sunday, 18, 58, Timezone::Cest)
        );

        let now = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2020, 12, 31, 23, 59, 0)
            .unwrap();
        assert_eq!(
            demo_record(&now, 2),
            TimeRecord::new(2021, Month::January, 1, Weekday::Friday, 0, 1, Timezone::Cet)
        );
    }

    #[test]
    fn test_demo_signal() {
        let now = FixedOffset::east_opt(7200)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 26, 18, 57, 30)
            .unwrap();
        let signal = make_demo_signal(&now, 100);

        let args = Args {
            verbose: 0,
            quiet: true,
            rate: 100,
            file: "-".to_owned(),
            udp: None,
            invert: false,
            no_range_check: false,
            keep_on_error: false,
            demo: true,
            sync_threshold: 1.0,
            bit_threshold: 0.15,
            child: vec![],
        };
        let mut rx = DcfReceiverBuilder::new(100).build();
        assert_eq!(2, run(&args, &mut rx, signal.into_iter()));
    }
}
