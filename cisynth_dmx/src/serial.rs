//! DMX512 serial transport: BREAK + Mark-After-Break framing over a
//! 250000 baud, 8 data bits / 2 stop bits / no parity serial line.

use std::time::Duration;

use serialport::SerialPort;

use crate::{error::DmxError, frame::UNIVERSE_SIZE};

const BREAK_DURATION: Duration = Duration::from_micros(100);
const MARK_AFTER_BREAK: Duration = Duration::from_micros(12);

pub struct DmxTransport {
    port: Box<dyn SerialPort>,
}

impl DmxTransport {
    pub fn open(path: &str, baud: u32) -> Result<Self, DmxError> {
        let port = serialport::new(path, baud)
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::Two)
            .parity(serialport::Parity::None)
            .timeout(Duration::from_secs(1))
            .open()
            .map_err(|_| DmxError::OpenFailed)?;

        Ok(Self { port })
    }

    /// Send one universe frame: BREAK, Mark-After-Break, then the frame
    /// bytes, draining the output before returning.
    pub fn send_frame(&mut self, frame: &[u8; UNIVERSE_SIZE]) -> Result<(), DmxError> {
        self.port.set_break().map_err(|_| DmxError::BreakFailed)?;
        std::thread::sleep(BREAK_DURATION);
        self.port.clear_break().map_err(|_| DmxError::BreakFailed)?;
        std::thread::sleep(MARK_AFTER_BREAK);

        self.port.write_all(frame).map_err(|_| DmxError::WriteFailed)?;
        self.port.flush().map_err(|_| DmxError::WriteFailed)?;
        Ok(())
    }
}
