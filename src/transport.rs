use std::{net::SocketAddr, time::Duration};

use tokio::{net::UdpSocket, time::timeout};

use crate::{Error, Result};

/// Largest reply datagram read in one go.
const RECEIVE_BUFFER: usize = 1024;

/// A UDP socket bound locally and pointed at one remote peer.
///
/// Delivery is not acknowledged. Replies are accepted from any sender, not
/// only from `remote`; the device protocol carries no correlation, so a late
/// reply to an earlier query is indistinguishable from the current one.
#[derive(Debug)]
pub struct Transport {
    socket: UdpSocket,
    remote: SocketAddr,
    timeout: Duration,
}

impl Transport {
    pub async fn open(local: SocketAddr, remote: SocketAddr, timeout: Duration) -> Result<Self> {
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|source| Error::Bind {
                address: local,
                source,
            })?;

        Ok(Transport {
            socket,
            remote,
            timeout,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub fn remote(&self) -> SocketAddr {
        self.remote
    }

    /// Sends `command` plus a line feed as a single datagram.
    pub async fn send(&self, command: &str) -> Result<()> {
        let mut out = String::with_capacity(command.len() + 1);
        out.push_str(command);
        out.push('\n');
        self.socket.send_to(out.as_bytes(), self.remote).await?;

        Ok(())
    }

    /// Sends `command` and waits at most the configured timeout for one
    /// datagram back. Never retries.
    pub async fn send_and_receive(&self, command: &str) -> Result<Vec<u8>> {
        self.send(command).await?;

        let mut buffer = [0u8; RECEIVE_BUFFER];
        let (len, _sender) = timeout(self.timeout, self.socket.recv_from(&mut buffer))
            .await
            .map_err(|_| Error::ResponseTimeout(self.timeout))??;

        Ok(buffer[..len].to_vec())
    }

    /// Releases the socket.
    pub fn close(self) {}
}
