use std::io::{self, Read};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};

use anyhow::{anyhow, Context};
use clap::Parser;
use log::{error, info, warn, LevelFilter};

use dcfrx::DcfReceiverBuilder;

mod app;
mod cli;
mod spawner;

use cli::{Args, CliError};

fn main() {
    match dcfdec() {
        Ok(()) => {}
        Err(cli_error) => cli_error.exit(),
    }
}

fn dcfdec() -> Result<(), CliError> {
    // Parse options and start logging
    let args = Args::try_parse()?;
    log_setup(&args);

    // create the decoder
    let mut rx = DcfReceiverBuilder::new(args.rate)
        .with_sync_threshold(args.sync_threshold)
        .with_bit_threshold(args.bit_threshold)
        .with_inverted_input(args.invert)
        .with_range_check(!args.no_range_check)
        .with_reset_on_error(!args.keep_on_error)
        .build();

    if args.demo {
        warn!("demonstration (--demo) mode: the following times are NOT LIVE!");
        let invert = args.invert;
        let signal = app::make_demo_signal(&chrono::Local::now(), args.rate);
        let decoded = app::run(
            &args,
            &mut rx,
            signal.into_iter().map(move |sa| if invert { sa ^ 1 } else { sa }),
        );
        return check_decoded(decoded);
    }

    if let Some(addr) = args.udp {
        let socket = udp_setup(addr)?;
        app::run(&args, &mut rx, DatagramSamples::new(socket));
        return Ok(());
    }

    // file setup: locks stdin in case we need it
    let stdin = io::stdin();
    let stdin_handle = stdin.lock();
    let inbuf = file_setup(&args, stdin_handle)?;

    // processing: one byte per sample
    app::run(&args, &mut rx, inbuf.bytes().map_while(Result::ok));

    Ok(())
}

fn check_decoded(decoded: usize) -> Result<(), CliError> {
    if decoded == 0 {
        Err(anyhow!("demonstration signal did not decode").into())
    } else {
        Ok(())
    }
}

fn log_setup(args: &Args) {
    if args.quiet {
        // no logging
        return;
    } else if std::env::var_os("RUST_LOG").is_none() {
        // parameter controls
        let log_filter = match args.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        pretty_env_logger::formatted_builder()
            .filter_module("dcfrx", log_filter)
            .filter_module("dcfdec", log_filter)
            .init();
    } else {
        // environment controls
        pretty_env_logger::init();
    }
}

fn file_setup<'stdin>(
    args: &Args,
    stdin: std::io::StdinLock<'stdin>,
) -> Result<Box<dyn io::BufRead + 'stdin>, anyhow::Error> {
    if args.input_is_stdin() {
        info!("DCF77 decoder reading standard input");
        if !is_terminal(&std::io::stdin()) {
            Ok(Box::new(io::BufReader::new(stdin)))
        } else {
            Err(anyhow!(
                "cowardly refusing to read samples from a terminal.

Pipe a source of raw samples, one byte per sample, into this
program. Try --demo to see it work without a receiver."
            ))
        }
    } else {
        info!("DCF77 decoder reading file: \"{}\"", &args.file);
        Ok(Box::new(io::BufReader::new(
            std::fs::File::open(&args.file)
                .with_context(|| format!("Unable to open --file \"{}\"", args.file))?,
        )))
    }
}

fn udp_setup(addr: SocketAddr) -> Result<UdpSocket, anyhow::Error> {
    let ip = addr.ip();
    let bind_addr = if ip.is_multicast() {
        // bind to the port only; the group is joined below
        match ip {
            IpAddr::V4(_) => SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), addr.port()),
            IpAddr::V6(_) => SocketAddr::new(std::net::Ipv6Addr::UNSPECIFIED.into(), addr.port()),
        }
    } else {
        addr
    };

    let socket = UdpSocket::bind(bind_addr)
        .with_context(|| format!("Unable to bind --udp socket \"{}\"", bind_addr))?;

    match ip {
        IpAddr::V4(group) if group.is_multicast() => socket
            .join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)
            .with_context(|| format!("Unable to join multicast group \"{}\"", group))?,
        IpAddr::V6(group) if group.is_multicast() => socket
            .join_multicast_v6(&group, 0)
            .with_context(|| format!("Unable to join multicast group \"{}\"", group))?,
        _ => {}
    }

    info!("DCF77 decoder reading UDP: \"{}\"", addr);
    Ok(socket)
}

/// Samples from UDP datagrams
///
/// Every byte of every datagram is one sample. Transient socket
/// errors are logged and the socket is read again. Iteration only
/// ends on an error which will not go away.
struct DatagramSamples {
    socket: UdpSocket,
    buf: Vec<u8>,
    len: usize,
    pos: usize,
}

impl DatagramSamples {
    // largest possible UDP payload
    const MAX_DATAGRAM: usize = 65536;

    fn new(socket: UdpSocket) -> Self {
        Self {
            socket,
            buf: vec![0u8; Self::MAX_DATAGRAM],
            len: 0,
            pos: 0,
        }
    }
}

impl Iterator for DatagramSamples {
    type Item = u8;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos >= self.len {
            match self.socket.recv(&mut self.buf) {
                Ok(len) => {
                    self.len = len;
                    self.pos = 0;
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) if is_transient(err.kind()) => {
                    warn!("unable to receive from --udp socket, retrying: {}", err);
                }
                Err(err) => {
                    error!("unable to receive from --udp socket: {}", err);
                    return None;
                }
            }
        }

        let sa = self.buf[self.pos];
        self.pos += 1;
        Some(sa)
    }
}

// Socket errors which a later recv() may not repeat
fn is_transient(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::OutOfMemory
    )
}

#[cfg(not(target_os = "windows"))]
fn is_terminal<S>(stream: &S) -> bool
where
    S: std::os::fd::AsRawFd,
{
    terminal_size::terminal_size_using_fd(stream.as_raw_fd()).is_some()
}

#[cfg(target_os = "windows")]
fn is_terminal<S>(stream: &S) -> bool
where
    S: std::os::windows::io::AsRawHandle,
{
    terminal_size::terminal_size_using_handle(stream.as_raw_handle()).is_some()
}
