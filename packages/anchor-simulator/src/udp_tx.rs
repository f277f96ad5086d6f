//! udp_tx.rs — SignalK UDP data-connection sender
//!
//! One JSON delta per datagram, to the server's UDP input (e.g.
//! 127.0.0.1:8375). Send errors are logged and never stop the simulation.

use std::net::UdpSocket;

use tracing::{debug, warn};

pub struct UdpTransmitter {
    socket: UdpSocket,
    target: String,
}

impl UdpTransmitter {
    pub fn new(target: &str) -> Result<Self, std::io::Error> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_nonblocking(true)?;
        Ok(Self { socket, target: target.to_string() })
    }

    pub fn target(&self) -> &str { &self.target }

    /// Pre-serialized delta (the tick loop serializes once for all sinks)
    pub fn send_raw(&self, bytes: &[u8]) {
        match self.socket.send_to(bytes, &self.target) {
            Ok(n) => debug!("UDP → {} ({n} bytes)", self.target),
            Err(e) => warn!("UDP: send to {} failed: {e}", self.target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchor_types::Delta;
    use std::time::Duration;

    #[test]
    fn delivers_delta_as_json_datagram() {
        let rx = UdpSocket::bind("127.0.0.1:0").unwrap();
        rx.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let tx = UdpTransmitter::new(&rx.local_addr().unwrap().to_string()).unwrap();

        let mut delta = Delta::new("anchor-simulator", "2026-01-01T00:00:00.000Z".into());
        delta.push("navigation.speedOverGround", 0.25);
        tx.send_raw(serde_json::to_string(&delta).unwrap().as_bytes());

        let mut buf = [0u8; 2048];
        let n = rx.recv(&mut buf).unwrap();
        let got: Delta = serde_json::from_slice(&buf[..n]).unwrap();
        assert_eq!(got, delta);
    }
}
