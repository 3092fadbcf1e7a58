//! Peer channel with rendezvous opener and counter-framed messages

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::time::timeout;

use crate::error::NetError;
use crate::Result;

const SYN: u8 = 1 << 0;
const ACK: u8 = 1 << 1;
const CTR_INC: u8 = 1 << 2;
const SYN_ACK: u8 = SYN | ACK;
const RESET: u8 = 0xFF;

/// How often the opener re-announces itself while the peer is absent
const RETRY_INTERVAL: Duration = Duration::from_millis(500);
/// Budget for completing the three-way opener once the peer is heard
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(2);

enum Inner {
    Udp(UdpSocket),
    Tcp(TcpStream),
}

/// An established channel to the peer.
///
/// Each message is one counter header byte followed by a fixed-width
/// payload. Send and receive counters start at zero and advance by four per
/// message, independently; a mismatch is fatal. On drop, the UDP flavor
/// sends a best-effort `0xFF` reset byte so a lingering peer fails fast.
pub struct PeerChannel {
    inner: Inner,
    send_ctr: u8,
    recv_ctr: u8,
}

impl PeerChannel {
    /// Rendezvous with a remote peer over UDP.
    ///
    /// Binds `local`, connects the socket to `remote`, then announces with
    /// `SYN` every half second until the peer is heard. Whichever side
    /// receives the other's `SYN` answers `SYN_ACK`; the opener completes on
    /// `ACK` (or a crossing `SYN_ACK`). Both sides may initiate
    /// simultaneously.
    pub async fn connect(local: SocketAddr, remote: SocketAddr) -> Result<Self> {
        let sock = UdpSocket::bind(local).await?;
        sock.connect(remote).await?;
        tracing::debug!(%remote, "announcing");

        let mut buf = [0u8; 1];
        let first = loop {
            sock.send(&[SYN]).await?;
            match timeout(RETRY_INTERVAL, sock.recv(&mut buf)).await {
                Ok(Ok(n)) if n >= 1 => break buf[0],
                Ok(Ok(_)) => continue,
                // A send into the void bounces back as ECONNREFUSED on a
                // connected socket; the peer just is not up yet.
                Ok(Err(e)) => {
                    tracing::trace!("announce bounced: {}", e);
                    continue;
                }
                Err(_elapsed) => continue,
            }
        };

        timeout(HANDSHAKE_TIMEOUT, async {
            match first {
                SYN => {
                    sock.send(&[SYN_ACK]).await?;
                    loop {
                        sock.recv(&mut buf).await?;
                        match buf[0] {
                            ACK | SYN_ACK => return Ok(()),
                            // The peer may still be re-announcing.
                            SYN => continue,
                            other => {
                                return Err(NetError::Handshake(format!(
                                    "expected ACK, got {:#04x}",
                                    other
                                )))
                            }
                        }
                    }
                }
                SYN_ACK => {
                    sock.send(&[ACK]).await?;
                    Ok(())
                }
                other => Err(NetError::Handshake(format!(
                    "unexpected data {:#04x}",
                    other
                ))),
            }
        })
        .await
        .map_err(|_elapsed| NetError::Timeout)??;

        tracing::debug!(%remote, "channel established");
        Ok(Self::new(Inner::Udp(sock)))
    }

    /// Rendezvous with a peer process on the same host.
    ///
    /// Binds the TCP port and accepts one connection; if the port is already
    /// taken the other process got there first, so connect to it instead.
    pub async fn rendezvous_local(port: u16) -> Result<Self> {
        let addr: SocketAddr = ([127, 0, 0, 1], port).into();
        let stream = match TcpListener::bind(addr).await {
            Ok(listener) => {
                tracing::debug!(port, "listening for local peer");
                let (stream, _peer) = listener.accept().await?;
                stream
            }
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                tracing::debug!(port, "port taken, connecting to local peer");
                TcpStream::connect(addr).await?
            }
            Err(e) => return Err(e.into()),
        };
        stream.set_nodelay(true)?;
        Ok(Self::new(Inner::Tcp(stream)))
    }

    fn new(inner: Inner) -> Self {
        PeerChannel {
            inner,
            send_ctr: 0,
            recv_ctr: 0,
        }
    }

    /// Send one message assembled from `parts`, prefixed with the counter
    /// header.
    pub async fn send(&mut self, parts: &[&[u8]]) -> Result<()> {
        let len = 1 + parts.iter().map(|p| p.len()).sum::<usize>();
        let mut msg = Vec::with_capacity(len);
        msg.push(self.send_ctr);
        for part in parts {
            msg.extend_from_slice(part);
        }

        match &mut self.inner {
            Inner::Udp(sock) => {
                sock.send(&msg).await?;
            }
            Inner::Tcp(stream) => {
                stream.write_all(&msg).await?;
            }
        }
        self.send_ctr = self.send_ctr.wrapping_add(CTR_INC);
        Ok(())
    }

    /// Receive exactly `buf.len()` payload bytes, checking the header.
    pub async fn recv(&mut self, buf: &mut [u8]) -> Result<()> {
        let header = match &mut self.inner {
            Inner::Udp(sock) => {
                let mut msg = vec![0u8; buf.len() + 1];
                let n = sock.recv(&mut msg).await?;
                if n != msg.len() {
                    return Err(NetError::Truncated {
                        expected: msg.len(),
                        got: n,
                    });
                }
                buf.copy_from_slice(&msg[1..]);
                msg[0]
            }
            Inner::Tcp(stream) => {
                let mut header = [0u8; 1];
                stream.read_exact(&mut header).await?;
                stream.read_exact(buf).await?;
                header[0]
            }
        };

        if header != self.recv_ctr {
            return Err(NetError::Header {
                expected: self.recv_ctr,
                got: header,
            });
        }
        self.recv_ctr = self.recv_ctr.wrapping_add(CTR_INC);
        Ok(())
    }
}

impl Drop for PeerChannel {
    fn drop(&mut self) {
        if let Inner::Udp(sock) = &self.inner {
            let _ = sock.try_send(&[RESET]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn udp_pair(port_a: u16, port_b: u16) -> (PeerChannel, PeerChannel) {
        let addr_a: SocketAddr = ([127, 0, 0, 1], port_a).into();
        let addr_b: SocketAddr = ([127, 0, 0, 1], port_b).into();
        let (a, b) = tokio::join!(
            PeerChannel::connect(addr_a, addr_b),
            PeerChannel::connect(addr_b, addr_a),
        );
        (a.unwrap(), b.unwrap())
    }

    #[tokio::test]
    async fn test_udp_exchange() {
        let (mut a, mut b) = udp_pair(41741, 41742).await;

        a.send(&[b"hello ", b"world"]).await.unwrap();
        let mut buf = [0u8; 11];
        b.recv(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hello world");

        b.send(&[&buf]).await.unwrap();
        let mut echo = [0u8; 11];
        a.recv(&mut echo).await.unwrap();
        assert_eq!(echo, buf);
    }

    #[tokio::test]
    async fn test_udp_counters_advance() {
        let (mut a, mut b) = udp_pair(41743, 41744).await;

        for round in 0u8..4 {
            a.send(&[&[round]]).await.unwrap();
            let mut buf = [0u8; 1];
            b.recv(&mut buf).await.unwrap();
            assert_eq!(buf[0], round);
        }
    }

    #[tokio::test]
    async fn test_local_rendezvous() {
        let (a, b) = tokio::join!(
            PeerChannel::rendezvous_local(41745),
            PeerChannel::rendezvous_local(41745),
        );
        let (mut a, mut b) = (a.unwrap(), b.unwrap());

        a.send(&[b"ping"]).await.unwrap();
        b.send(&[b"pong"]).await.unwrap();
        let mut buf = [0u8; 4];
        b.recv(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");
        a.recv(&mut buf).await.unwrap();
        assert_eq!(&buf, b"pong");
    }

    #[tokio::test]
    async fn test_header_mismatch_fatal() {
        let (mut a, mut b) = udp_pair(41746, 41747).await;

        // Skip a's first counter value by sending out of band.
        a.send_ctr = a.send_ctr.wrapping_add(CTR_INC);
        a.send(&[b"x"]).await.unwrap();
        let mut buf = [0u8; 1];
        let err = b.recv(&mut buf).await.unwrap_err();
        assert!(matches!(err, NetError::Header { expected: 0, got: 4 }));
    }
}
