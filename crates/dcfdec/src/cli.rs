use std::fmt::Display;
use std::net::SocketAddr;

use clap::{error::ErrorKind, value_parser, CommandFactory, Parser};

/// Standard input filename
const STDIN_FILE: &str = "-";

const USAGE_SHORT: &str = r#"
This program accepts binary carrier samples, one byte per sample, at the given sampling --rate, and decodes the DCF77 time signal. A zero byte means the carrier is reduced; any other byte means full carrier. Each decoded minute is printed on its own line.

See --help for more details.
"#;

const USAGE_LONG: &str = r#"
This program accepts binary carrier samples, one byte per sample, at the given sampling --rate, and decodes the DCF77 time signal. A zero byte means the carrier is reduced; any other byte means full carrier. Each decoded minute is printed on its own line, like

    Tue 29 Sep 2020 00:43:00 CEST

Each line is printed just before the instant it names. The time becomes exact at the start of the following pulse.

You can pipe samples in from any program which polls a receiver module's output pin. If the pin goes HIGH during each pulse, use --invert.

    pinpoll --rate 100 | dcfdec --rate 100 --invert

Samples may also arrive as UDP datagrams, such as those sent by a GNU Radio flow. Multicast groups are joined automatically.

    dcfdec --rate 1000 --udp 239.0.0.77:7777

Arguments which follow "--" will be used to spawn a child process for every decoded minute. The child process receives the following additional environment variables which describe the time:

  DCFDEC_TIME="Tue 29 Sep 2020 00:43:00 CEST"
  DCFDEC_TZ="CEST" (or CET)
  DCFDEC_UNIX="1601332980" (UTC UNIX timestamp)
  DCFDEC_RATE="100" (configured sample --rate)

Minutes which fail to decode are reported as warnings. The decoder keeps listening.
"#;

const ADVANCED: &str = "Advanced Decoder Options";

/// Top-level program arguments
#[derive(Parser, Clone, Debug)]
#[command(version)]
#[command(about, long_about = None)]
#[command(after_help = USAGE_SHORT, after_long_help = USAGE_LONG)]
#[command(max_term_width = 100)]
pub struct Args {
    /// Verbosity level (-vvv for more)
    #[arg(short, long, default_value_t = 0, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print NOTHING, not even decoded times
    #[arg(short, long)]
    pub quiet: bool,

    /// Sampling rate (Hz)
    ///
    /// Set to the rate at which your receiver's output is sampled.
    /// The rate must resolve the 100 ms difference between a zero
    /// and a one; 100 Hz is plenty.
    #[arg(short, long, default_value_t = 100)]
    #[arg(value_parser = value_parser!(u32).range(10..))]
    pub rate: u32,

    /// Input file (or "-" for stdin)
    ///
    /// The input must contain one byte per sample at --rate.
    #[arg(long, default_value_t = STDIN_FILE.to_string())]
    pub file: String,

    /// Receive samples from a UDP socket at ADDR:PORT
    ///
    /// Each datagram contains one byte per sample at --rate. If ADDR
    /// is a multicast group, it is joined on the default interface.
    /// Overrides --file.
    #[arg(long, value_name = "ADDR:PORT")]
    pub udp: Option<SocketAddr>,

    /// Input is HIGH during each pulse
    #[arg(long)]
    pub invert: bool,

    /// Accept impossible minutes, hours, days, and years
    #[arg(long)]
    pub no_range_check: bool,

    /// Keep frames which fail to decode until the next sync gap
    #[arg(long)]
    pub keep_on_error: bool,

    /// Decode a synthesized signal and exit
    ///
    /// Generates two minutes of samples for the current local time,
    /// at --rate, and decodes them. Any other input is ignored.
    #[arg(long)]
    pub demo: bool,

    /// Sync gap threshold (s)
    #[arg(long, default_value_t = 1.0)]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub sync_threshold: f32,

    /// One/zero pulse threshold (s)
    #[arg(long, default_value_t = 0.15)]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub bit_threshold: f32,

    /// Spawn child process for each decoded minute. Optional.
    ///
    /// Arguments are provided VERBATIM to the child process
    /// without shell interpretation.
    #[arg(last = true)]
    pub child: Vec<String>,
}

impl Args {
    /// Return true if the user requests input from stdin
    pub fn input_is_stdin(&self) -> bool {
        self.file == STDIN_FILE
    }
}

/// A program-level error with exit code
#[derive(Debug)]
pub struct CliError {
    error: anyhow::Error,
    exit_code: i32,
}

impl CliError {
    /// Create new error with a custom exit code
    pub fn new(error: anyhow::Error, code: i32) -> CliError {
        CliError {
            error,
            exit_code: code,
        }
    }

    /// Print this error to the terminal
    ///
    /// Errors from clap are printed verbatim. Other types of errors
    /// are printed indirectly via clap's fancy formatter.
    pub fn print(&self) -> std::io::Result<()> {
        if let Some(e) = self.error.downcast_ref::<clap::Error>() {
            e.print()
        } else {
            Args::command()
                .error(ErrorKind::Format, self.to_string())
                .print()
        }
    }

    /// Print this error to the terminal and exit
    pub fn exit(&self) -> ! {
        drop(self.print());
        std::process::exit(self.exit_code);
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.error)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> CliError {
        CliError::new(err, 1)
    }
}

impl From<clap::Error> for CliError {
    fn from(err: clap::Error) -> CliError {
        let code = if err.use_stderr() { 1 } else { 0 };
        CliError::new(err.into(), code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clap() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse() {
        let args = Args::try_parse_from(["dcfdec"]).expect("defaults");
        assert_eq!(args.rate, 100);
        assert!(args.input_is_stdin());
        assert!(args.udp.is_none());
        assert!(args.child.is_empty());

        let args = Args::try_parse_from([
            "dcfdec",
            "-r",
            "1000",
            "--udp",
            "239.0.0.77:7777",
            "--invert",
            "--",
            "logger",
            "-t",
            "dcf77",
        ])
        .expect("valid arguments");
        assert_eq!(args.rate, 1000);
        assert_eq!(args.udp, Some("239.0.0.77:7777".parse().unwrap()));
        assert!(args.invert);
        assert_eq!(args.child, vec!["logger", "-t", "dcf77"]);

        assert!(Args::try_parse_from(["dcfdec", "--rate", "5"]).is_err());
        assert!(Args::try_parse_from(["dcfdec", "--udp", "nowhere"]).is_err());
    }
}
