//! Command handlers

pub mod chip;
pub mod crisp;
pub mod opaque;

use std::io::Write;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;

use idpake_net::PeerChannel;

/// Open the channel: UDP toward `ip`, or a local rendezvous without one.
pub async fn connect(ip: Option<IpAddr>, port: u16) -> anyhow::Result<PeerChannel> {
    let channel = match ip {
        Some(ip) => {
            let local = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
            PeerChannel::connect(local, SocketAddr::new(ip, port)).await?
        }
        None => PeerChannel::rendezvous_local(port).await?,
    };
    Ok(channel)
}

/// Write an enrollment record to `path`, or raw to stdout like the original
/// generation tools.
pub fn write_record(path: Option<&Path>, bytes: &[u8]) -> anyhow::Result<()> {
    match path {
        Some(path) => std::fs::write(path, bytes)?,
        None => std::io::stdout().write_all(bytes)?,
    }
    Ok(())
}
