use log::debug;
use std::io::{Read, Write};

use super::crc::{append_crc, frame_crc_ok};
use crate::utils::error::ReaderError;

pub const READ_INPUT_REGISTERS: u8 = 0x04;
const EXCEPTION_FLAG: u8 = 0x80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRequest {
    pub slave_id: u8,
    pub function: u8,
    pub start_register: u16,
    pub count: u16,
}

impl ReadRequest {
    pub fn input_registers(slave_id: u8, start_register: u16, count: u16) -> Self {
        Self { slave_id, function: READ_INPUT_REGISTERS, start_register, count }
    }

    pub fn to_frame(&self) -> Vec<u8> {
        let mut frame = vec![self.slave_id, self.function];
        frame.extend_from_slice(&self.start_register.to_be_bytes());
        frame.extend_from_slice(&self.count.to_be_bytes());
        append_crc(&mut frame);
        frame
    }
}

/// Sends one read request and waits for the matching response.
pub fn transact<P: Read + Write + ?Sized>(
    port: &mut P,
    request: &ReadRequest,
) -> Result<Vec<u16>, ReaderError> {
    let frame = request.to_frame();
    debug!("📤 Sending frame: [{}]", hex::encode(&frame));

    port.write_all(&frame)?;
    port.flush()?;

    read_response(port, request)
}

/// Reads one response frame. Exception responses are turned into errors
/// here so callers never see them as data.
pub fn read_response<R: Read + ?Sized>(
    port: &mut R,
    request: &ReadRequest,
) -> Result<Vec<u16>, ReaderError> {
    // address, function, byte count (or exception code)
    let mut header = [0u8; 3];
    port.read_exact(&mut header)?;

    if header[0] != request.slave_id {
        return Err(ReaderError::InvalidResponse(format!(
            "expected slave {}, got {}",
            request.slave_id, header[0]
        )));
    }

    if header[1] == request.function | EXCEPTION_FLAG {
        let mut frame = header.to_vec();
        let mut crc = [0u8; 2];
        port.read_exact(&mut crc)?;
        frame.extend_from_slice(&crc);
        if !frame_crc_ok(&frame) {
            return Err(ReaderError::CrcError);
        }
        return Err(ReaderError::ModbusException {
            slave: request.slave_id,
            function: request.function,
            code: header[2],
        });
    }

    if header[1] != request.function {
        return Err(ReaderError::InvalidResponse(format!(
            "unexpected function code 0x{:02x}",
            header[1]
        )));
    }

    let byte_count = header[2] as usize;
    if byte_count != request.count as usize * 2 {
        return Err(ReaderError::InvalidResponse(format!(
            "expected {} data bytes, got {}",
            request.count as usize * 2,
            byte_count
        )));
    }

    let mut frame = header.to_vec();
    frame.resize(3 + byte_count + 2, 0);
    port.read_exact(&mut frame[3..])?;
    debug!("📥 Received frame: [{}]", hex::encode(&frame));

    if !frame_crc_ok(&frame) {
        return Err(ReaderError::CrcError);
    }

    Ok(frame[3..3 + byte_count]
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Serial double: records what was written, replays a canned reply.
    struct FakePort {
        written: Vec<u8>,
        reply: Cursor<Vec<u8>>,
    }

    impl FakePort {
        fn new(reply: Vec<u8>) -> Self {
            Self { written: Vec::new(), reply: Cursor::new(reply) }
        }
    }

    impl Read for FakePort {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.reply.read(buf)
        }
    }

    impl Write for FakePort {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn reply(slave: u8, function: u8, payload: &[u8]) -> Vec<u8> {
        let mut frame = vec![slave, function];
        frame.extend_from_slice(payload);
        append_crc(&mut frame);
        frame
    }

    #[test]
    fn test_input_register_request_frame() {
        let frame = ReadRequest::input_registers(1, 0, 1).to_frame();
        assert_eq!(frame, vec![0x01, 0x04, 0x00, 0x00, 0x00, 0x01, 0x31, 0xCA]);
    }

    #[test]
    fn test_transact_decodes_registers() {
        let request = ReadRequest::input_registers(1, 0, 3);
        let mut port = FakePort::new(reply(1, 0x04, &[6, 0x00, 0x01, 0x12, 0x34, 0xFF, 0xFF]));

        let registers = transact(&mut port, &request).unwrap();

        assert_eq!(registers, vec![1, 0x1234, 0xFFFF]);
        assert_eq!(port.written, request.to_frame());
    }

    #[test]
    fn test_exception_response_becomes_error() {
        let request = ReadRequest::input_registers(1, 0, 45);
        let mut port = FakePort::new(reply(1, 0x84, &[0x02]));

        let err = transact(&mut port, &request).unwrap_err();

        assert!(matches!(
            err,
            ReaderError::ModbusException { slave: 1, function: 0x04, code: 0x02 }
        ));
        assert!(err.is_transport());
    }

    #[test]
    fn test_corrupt_crc_rejected() {
        let request = ReadRequest::input_registers(1, 0, 1);
        let mut frame = reply(1, 0x04, &[2, 0x00, 0x05]);
        let last = frame.len() - 1;
        frame[last] ^= 0xFF;

        let err = read_response(&mut Cursor::new(frame), &request).unwrap_err();
        assert!(matches!(err, ReaderError::CrcError));
    }

    #[test]
    fn test_wrong_slave_rejected() {
        let request = ReadRequest::input_registers(1, 0, 1);
        let frame = reply(7, 0x04, &[2, 0x00, 0x05]);

        let err = read_response(&mut Cursor::new(frame), &request).unwrap_err();
        assert!(matches!(err, ReaderError::InvalidResponse(_)));
    }

    #[test]
    fn test_short_reply_is_transport_failure() {
        let request = ReadRequest::input_registers(1, 0, 2);
        let frame = vec![0x01, 0x04, 0x04, 0x00];

        let err = read_response(&mut Cursor::new(frame), &request).unwrap_err();
        assert!(err.is_transport());
    }
}
