//! Spawns child process from a TimeRecord

use std::ffi::OsStr;
use std::io;
use std::process::{Child, Command, Stdio};

use dcfrx::TimeRecord;

/// Spawn a child process to handle the given time
///
/// The child process will receive information about the
/// decoded minute via the environment. Its standard input is
/// closed, and its standard output and error are inherited.
///
/// This method will attempt to start an executable named
/// `cmd` with the given `args`. The `record` and
/// `input_rate_str` (the input sampling rate) are transformed
/// into environment variables.
pub fn spawn<C, A, B>(
    cmd: C,
    args: A,
    record: &TimeRecord,
    input_rate_str: &str,
) -> io::Result<Child>
where
    C: AsRef<OsStr>,
    B: AsRef<OsStr>,
    A: IntoIterator<Item = B>,
{
    Command::new(cmd)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .args(args)
        .envs(child_env(record, input_rate_str))
        .spawn()
}

// environment variables for the child process
fn child_env(record: &TimeRecord, input_rate_str: &str) -> [(&'static str, String); 4] {
    [
        (childenv::DCFDEC_TIME, record.to_string()),
        (childenv::DCFDEC_TZ, record.timezone().as_code_str().to_owned()),
        (childenv::DCFDEC_UNIX, unix_str(record)),
        (childenv::DCFDEC_RATE, input_rate_str.to_owned()),
    ]
}

mod childenv {
    /// The decoded time, as printed
    ///
    /// ```txt
    /// Tue 29 Sep 2020 00:43:00 CEST
    /// ```
    pub const DCFDEC_TIME: &str = "DCFDEC_TIME";

    /// Transmitted timezone, `CET` or `CEST`
    pub const DCFDEC_TZ: &str = "DCFDEC_TZ";

    /// Decoded time (UTC UNIX timestamp, in seconds)
    ///
    /// Empty if the decoded fields do not form a real date, which
    /// can only happen with range checks disabled or on
    /// impossible days like the 31st of February.
    pub const DCFDEC_UNIX: &str = "DCFDEC_UNIX";

    /// Decoder input rate
    ///
    /// The sample `--rate` that dcfdec is running at.
    pub const DCFDEC_RATE: &str = "DCFDEC_RATE";
}

// convert record to UTC unix timestamp in seconds, as string
fn unix_str(record: &TimeRecord) -> String {
    match record.to_datetime() {
        Some(dt) => format!("{}", dt.timestamp()),
        None => "".to_owned(),
    }
}
