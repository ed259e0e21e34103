use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod overlay;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode one captured frame and print it.
    Decode(DecodeArgs),
    /// Run the Cartesian overlay client against a controller.
    Overlay(OverlayArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::Overlay(args) => overlay::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// File holding exactly one frame (length, payload, checksum).
    pub file: PathBuf,
    /// Number of robot joints.
    #[arg(long, default_value = "7")]
    pub joints: usize,
    /// Decode as a client command instead of a controller monitoring message.
    #[arg(long)]
    pub command: bool,
}

#[derive(Args, Debug)]
pub struct OverlayArgs {
    /// Local address to receive controller datagrams on.
    #[arg(long, default_value = "0.0.0.0:30200", env = "FRI_BIND")]
    pub bind: SocketAddr,
    /// Controller address. Learned from the first datagram when omitted.
    #[arg(long, env = "FRI_CONTROLLER")]
    pub controller: Option<SocketAddr>,
    /// Number of robot joints.
    #[arg(long, default_value = "7")]
    pub joints: usize,
    /// Frequency of the circular offset in Hz.
    #[arg(long, default_value = "0.25")]
    pub freq_hz: f64,
    /// Amplitude of the circular offset in mm.
    #[arg(long, default_value = "5.0")]
    pub amplitude: f64,
    /// Low-pass filter coefficient in [0, 1).
    #[arg(long, default_value = "0.99")]
    pub filter_coeff: f64,
    /// How long to wait for a datagram before skipping a cycle (e.g. 100ms, 1s).
    #[arg(long, default_value = "100ms")]
    pub receive_timeout: String,
    /// Exit after N received cycles.
    #[arg(long)]
    pub cycles: Option<u64>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
