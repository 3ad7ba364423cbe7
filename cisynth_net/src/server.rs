//! UDP ingest server: binds one socket, feeds datagrams through the
//! reassembler, and publishes completed lines to the image double buffer.

use std::{
    net::UdpSocket,
    sync::{atomic::{AtomicBool, Ordering}, Arc},
    thread::{self, JoinHandle},
    time::Duration,
};

use cisynth_core::EngineConfig;

use crate::{double_buffer::ImageDoubleBuffer, error::NetError, reassembler::LineReassembler};

/// Maximum datagram size accepted from the socket.
const RECV_BUFFER_SIZE: usize = 2048;

/// Socket read timeout, so the recv loop re-checks the shutdown flag
/// instead of blocking forever per spec.md §5's "condvar waits use 1-second
/// timeouts so shutdown cannot stall" guarantee, applied here to the socket.
const RECV_TIMEOUT: Duration = Duration::from_secs(1);

pub struct LineServer {
    socket: UdpSocket,
    reassembler: LineReassembler,
    buffer: Arc<ImageDoubleBuffer>,
    dmx_buffer: Option<Arc<ImageDoubleBuffer>>,
}

impl LineServer {
    pub fn bind(config: &EngineConfig, buffer: Arc<ImageDoubleBuffer>) -> Result<Self, NetError> {
        Self::bind_with_dmx_buffer(config, buffer, None)
    }

    /// Bind with a second fan-out buffer for the DMX thread, so a single
    /// completed line reaches both the DSP and DMX consumers rather than
    /// the two racing over one shared buffer.
    pub fn bind_with_dmx_buffer(
        config: &EngineConfig,
        buffer: Arc<ImageDoubleBuffer>,
        dmx_buffer: Option<Arc<ImageDoubleBuffer>>,
    ) -> Result<Self, NetError> {
        let addr = format!("0.0.0.0:{}", config.udp_port);
        let socket = UdpSocket::bind(&addr).map_err(|_| NetError::BindFailed)?;
        socket.set_read_timeout(Some(RECV_TIMEOUT)).map_err(|_| NetError::BindFailed)?;

        Ok(Self {
            socket,
            reassembler: LineReassembler::new(config.pixels_per_line, config.total_fragments, config.fragment_size),
            buffer,
            dmx_buffer,
        })
    }

    /// Run the recv loop on the calling thread until `shutdown` is set. A
    /// timed-out or errored `recv` is treated as transient per the
    /// reassembler contract: skip and continue, re-checking `shutdown` on
    /// each timeout.
    pub fn run(mut self, shutdown: Arc<AtomicBool>) {
        let mut recv_buf = vec![0u8; RECV_BUFFER_SIZE];
        while !shutdown.load(Ordering::Relaxed) {
            match self.socket.recv(&mut recv_buf) {
                Ok(len) => {
                    if let Some(line) = self.reassembler.accept(&recv_buf[..len]) {
                        if let Some(dmx_buffer) = &self.dmx_buffer {
                            dmx_buffer.publish(line.clone());
                        }
                        self.buffer.publish(line);
                    }
                }
                Err(_) => continue,
            }
        }
    }

    pub fn spawn(self, shutdown: Arc<AtomicBool>) -> JoinHandle<()> {
        thread::spawn(move || self.run(shutdown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_succeeds_on_ephemeral_port() {
        let mut config = EngineConfig::default();
        config.udp_port = 0; // OS-assigned ephemeral port
        config.pixels_per_line = 8;
        config.total_fragments = 4;
        config.fragment_size = 2;

        let buffer = ImageDoubleBuffer::new();
        assert!(LineServer::bind(&config, buffer).is_ok());
    }
}
