//! CLI argument parsing

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "idpake")]
#[command(author, version, about = "Identity-bound PAKE suite (CHIP, CRISP, OPAQUE)", long_about = None)]
pub struct Cli {
    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Schnorr-style identity-bound PAKE over Ristretto255
    #[command(subcommand)]
    Chip(ChipCommand),

    /// Pairing-based identity-verified PAKE
    #[command(subcommand)]
    Crisp(CrispCommand),

    /// Augmented PAKE with a server-held envelope
    #[command(subcommand)]
    Opaque(OpaqueCommand),
}

#[derive(Subcommand)]
pub enum ChipCommand {
    /// Create an enrollment record
    Enroll(EnrollArgs),
    /// Run a key exchange against a peer
    Exchange(ExchangeArgs),
}

#[derive(Subcommand)]
pub enum CrispCommand {
    /// Create an enrollment record
    Enroll(EnrollArgs),
    /// Run a key exchange against a peer
    Exchange(ExchangeArgs),
}

#[derive(Subcommand)]
pub enum OpaqueCommand {
    /// Create a server-side password file
    Enroll(OpaqueEnrollArgs),
    /// Run the client side of a login
    Client(OpaqueClientArgs),
    /// Answer one client login
    Server(OpaqueServerArgs),
}

#[derive(Args)]
pub struct EnrollArgs {
    /// Community of users the record belongs to
    pub network: String,

    /// Shared password
    pub password: String,

    /// Identity to enroll (at most 16 bytes)
    pub identity: String,

    /// Write the record here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Use the lighter interactive Argon2id profile
    #[arg(long)]
    pub interactive: bool,
}

#[derive(Args)]
pub struct ExchangeArgs {
    /// Path to the enrollment record
    pub record: PathBuf,

    /// Port (both sides use the same one)
    #[arg(default_value_t = 9999)]
    pub port: u16,

    /// Peer address; without it, rendezvous with a local process instead
    #[arg(long)]
    pub ip: Option<IpAddr>,

    /// Suppress the stage timing table
    #[arg(long)]
    pub no_timing: bool,
}

#[derive(Args)]
pub struct OpaqueEnrollArgs {
    /// Accepted for symmetry with chip/crisp; not stored in the file
    pub network: String,

    /// Password to enroll
    pub password: String,

    /// Identity to enroll (at most 16 bytes, alphanumeric)
    pub identity: String,

    /// Write `<identity>.pwd` into this directory (server layout)
    #[arg(long, conflicts_with = "output")]
    pub output_dir: Option<PathBuf>,

    /// Write the file here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct OpaqueClientArgs {
    /// Password to log in with
    pub password: String,

    /// Identity to log in as
    pub identity: String,

    /// Port (both sides use the same one)
    #[arg(default_value_t = 9999)]
    pub port: u16,

    /// Server address; without it, rendezvous with a local process instead
    #[arg(long)]
    pub ip: Option<IpAddr>,

    /// Suppress the stage timing table
    #[arg(long)]
    pub no_timing: bool,
}

#[derive(Args)]
pub struct OpaqueServerArgs {
    /// Port (both sides use the same one)
    #[arg(default_value_t = 9999)]
    pub port: u16,

    /// Client address; without it, rendezvous with a local process instead
    #[arg(long)]
    pub ip: Option<IpAddr>,

    /// Directory holding `<sid>.pwd` password files
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Suppress the stage timing table
    #[arg(long)]
    pub no_timing: bool,
}
