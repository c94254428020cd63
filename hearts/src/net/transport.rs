//! Peer addressing and the UDP socket.
//!
//! Addressing is static: player `i` listens on `base_port + i` at a shared
//! IP, so any node can compute every peer's address from its own
//! configuration. The socket blocks with a short read timeout so a receive
//! loop can observe a shutdown flag between waits.

use std::io;
use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use super::errors::{ProtocolError, Result};
use super::messages::{self, Message};
use crate::coordination::Outbox;
use crate::game::entities::{NUM_PLAYERS, PlayerIndex};

/// Largest datagram the protocol will send. A full deal record is the
/// biggest payload and fits comfortably.
pub const MAX_DATAGRAM: usize = 4096;

/// Read timeout on the receive path.
pub const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// The four peer addresses and this node's place among them.
#[derive(Clone, Debug)]
pub struct Ring {
    addrs: [SocketAddr; NUM_PLAYERS],
    me: PlayerIndex,
}

impl Ring {
    #[must_use]
    pub fn new(ip: IpAddr, base_port: u16, me: PlayerIndex) -> Self {
        assert!(me < NUM_PLAYERS, "player index out of range");
        let addrs = std::array::from_fn(|i| SocketAddr::new(ip, base_port + i as u16));
        Self { addrs, me }
    }

    #[must_use]
    pub fn me(&self) -> PlayerIndex {
        self.me
    }

    #[must_use]
    pub fn my_addr(&self) -> SocketAddr {
        self.addrs[self.me]
    }

    #[must_use]
    pub fn addr_of(&self, player: PlayerIndex) -> SocketAddr {
        self.addrs[player]
    }

    /// The ring successor, the only peer this node ever grants the token.
    #[must_use]
    pub fn next(&self) -> PlayerIndex {
        (self.me + 1) % NUM_PLAYERS
    }

    /// Every player except this node.
    pub fn peers(&self) -> impl Iterator<Item = PlayerIndex> + '_ {
        (0..NUM_PLAYERS).filter(move |&player| player != self.me)
    }
}

/// A bound UDP socket plus the ring it serves. Cloning shares the socket,
/// which lets a receive thread and a send path coexist without locking.
#[derive(Clone)]
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
    ring: Ring,
}

impl UdpTransport {
    /// Bind this node's ring address.
    pub fn bind(ring: Ring) -> Result<Self> {
        let socket = UdpSocket::bind(ring.my_addr())?;
        socket.set_read_timeout(Some(READ_TIMEOUT))?;
        debug!("bound {}", ring.my_addr());
        Ok(Self {
            socket: Arc::new(socket),
            ring,
        })
    }

    #[must_use]
    pub fn ring(&self) -> &Ring {
        &self.ring
    }

    /// Receive one datagram. `Ok(None)` means the read timed out; the
    /// caller polls its shutdown flag and tries again.
    pub fn recv_datagram(&self, buf: &mut [u8]) -> io::Result<Option<(usize, SocketAddr)>> {
        match self.socket.recv_from(buf) {
            Ok(received) => Ok(Some(received)),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) =>
            {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn send_frame(&self, frame: &[u8], to: PlayerIndex) -> Result<()> {
        if frame.len() > MAX_DATAGRAM {
            return Err(ProtocolError::FrameTooLarge {
                actual: frame.len(),
                max: MAX_DATAGRAM,
            });
        }
        self.socket.send_to(frame, self.ring.addr_of(to))?;
        Ok(())
    }

    fn send_message(&self, message: &Message, to: PlayerIndex) -> Result<()> {
        let frame = messages::encode(message)?;
        self.send_frame(&frame, to)
    }
}

// Sends are fire-and-forget: a failed send is logged, never surfaced,
// since the protocol has no retry or acknowledgment layer to feed.
impl Outbox for UdpTransport {
    fn send_to(&mut self, message: &Message, to: PlayerIndex) {
        match self.send_message(message, to) {
            Ok(()) => debug!("sent to player {to}: {message}"),
            Err(err) => warn!("send to player {to} failed: {err}"),
        }
    }

    fn broadcast(&mut self, message: &Message) {
        for to in self.ring.peers() {
            match self.send_message(message, to) {
                Ok(()) => {}
                Err(err) => warn!("broadcast to player {to} failed: {err}"),
            }
        }
        debug!("broadcast: {message}");
    }

    fn send_token(&mut self, to: PlayerIndex) {
        match self.send_frame(messages::token_frame(), to) {
            Ok(()) => debug!("granted the token to player {to}"),
            Err(err) => warn!("token grant to player {to} failed: {err}"),
        }
    }
}
