//! Byte-stream abstraction used by asset decoding and screenshot
//! encoding.
//!
//! Every operation returns a [`StreamError`] from the process-wide
//! recoverable taxonomy; unimplemented operations report
//! [`StreamError::NotSupported`] rather than panicking, so a concrete
//! stream only overrides what it can actually do.

pub mod buffered;
pub mod crc32;
pub mod file;
pub mod memory;
pub mod portion;

pub use buffered::*;
pub use crc32::*;
pub use file::*;
pub use memory::*;
pub use portion::*;

use snafu::Snafu;

pub type StreamResult<T> = Result<T, StreamError>;

/// Recoverable failure codes shared by the stream layer and the asset
/// decoders. The graphics layer has its own fatal regime and never
/// raises these.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(Err)), visibility(pub(crate)))]
pub enum StreamError {
    #[snafu(display("attempted to read more data than the stream provided"))]
    EndOfStream,
    #[snafu(display("operation is not supported in current state or at all"))]
    NotSupported,
    #[snafu(display("invalid argument provided"))]
    InvalidArgument,
    #[snafu(display("insufficient memory for the requested allocation"))]
    OutOfMemory,
    #[snafu(display("i/o error: {source}"))]
    Io { source: std::io::Error },
    #[snafu(display("png encode error: {source}"))]
    PngEncode { source: image::ImageError },
}

/// A polymorphic byte stream.
///
/// `read` and `write` move *up to* `buf.len()` bytes and report how
/// many; use [`read_exact`]/[`write_exact`] when the full count is
/// required. Positions and lengths are 32-bit, matching the asset
/// formats this engine consumes.
pub trait Stream {
    fn read(&mut self, _buf: &mut [u8]) -> StreamResult<usize> {
        Err(StreamError::NotSupported)
    }

    fn write(&mut self, _buf: &[u8]) -> StreamResult<usize> {
        Err(StreamError::NotSupported)
    }

    /// Reads a single byte. The default goes through `read`; streams
    /// with cheap byte access override this.
    fn read_u8(&mut self) -> StreamResult<u8> {
        let mut data = [0u8; 1];
        match self.read(&mut data)? {
            0 => Err(StreamError::EndOfStream),
            _ => Ok(data[0]),
        }
    }

    /// Skips `count` bytes. The default reads into a scratch buffer,
    /// for streams without random access.
    fn skip(&mut self, mut count: u32) -> StreamResult<()> {
        let mut tmp = [0u8; 3584];
        while count > 0 {
            let to_read = (count as usize).min(tmp.len());
            let read = self.read(&mut tmp[..to_read])?;
            if read == 0 {
                return Err(StreamError::EndOfStream);
            }
            count -= read as u32;
        }
        Ok(())
    }

    fn seek(&mut self, _position: u32) -> StreamResult<()> {
        Err(StreamError::NotSupported)
    }

    fn position(&mut self) -> StreamResult<u32> {
        Err(StreamError::NotSupported)
    }

    fn length(&mut self) -> StreamResult<u32> {
        Err(StreamError::NotSupported)
    }
}

/// Reads exactly `buf.len()` bytes, retrying partial reads. A read
/// that makes zero progress is promoted to `EndOfStream`.
pub fn read_exact(s: &mut dyn Stream, buf: &mut [u8]) -> StreamResult<()> {
    let mut offset = 0;
    while offset < buf.len() {
        let read = s.read(&mut buf[offset..])?;
        if read == 0 {
            return Err(StreamError::EndOfStream);
        }
        offset += read;
    }
    Ok(())
}

/// Writes exactly `buf.len()` bytes, retrying partial writes. A write
/// that makes zero progress is promoted to `EndOfStream`.
pub fn write_exact(s: &mut dyn Stream, buf: &[u8]) -> StreamResult<()> {
    let mut offset = 0;
    while offset < buf.len() {
        let written = s.write(&buf[offset..])?;
        if written == 0 {
            return Err(StreamError::EndOfStream);
        }
        offset += written;
    }
    Ok(())
}

/// Creates `path` and writes `data` to it in full.
pub fn write_all_to(path: &std::path::Path, data: &[u8]) -> StreamResult<()> {
    let mut stream = FileStream::create(path)?;
    write_exact(&mut stream, data)
}

// Multi-byte integer helpers are explicit little/big-endian pairs; no
// native-endianness assumption anywhere.

pub fn get_u16_le(data: &[u8]) -> u16 {
    u16::from_le_bytes([data[0], data[1]])
}

pub fn get_u16_be(data: &[u8]) -> u16 {
    u16::from_be_bytes([data[0], data[1]])
}

pub fn get_u32_le(data: &[u8]) -> u32 {
    u32::from_le_bytes([data[0], data[1], data[2], data[3]])
}

pub fn get_u32_be(data: &[u8]) -> u32 {
    u32::from_be_bytes([data[0], data[1], data[2], data[3]])
}

pub fn set_u16_le(data: &mut [u8], value: u16) {
    data[..2].copy_from_slice(&value.to_le_bytes());
}

pub fn set_u16_be(data: &mut [u8], value: u16) {
    data[..2].copy_from_slice(&value.to_be_bytes());
}

pub fn set_u32_le(data: &mut [u8], value: u32) {
    data[..4].copy_from_slice(&value.to_le_bytes());
}

pub fn set_u32_be(data: &mut [u8], value: u32) {
    data[..4].copy_from_slice(&value.to_be_bytes());
}

pub fn read_u32_le(s: &mut dyn Stream) -> StreamResult<u32> {
    let mut data = [0u8; 4];
    read_exact(s, &mut data)?;
    Ok(get_u32_le(&data))
}

pub fn read_u32_be(s: &mut dyn Stream) -> StreamResult<u32> {
    let mut data = [0u8; 4];
    read_exact(s, &mut data)?;
    Ok(get_u32_be(&data))
}

/// Adapter so `std::io::Write` consumers (the PNG encoder) can target
/// a stream.
pub struct StreamWriter<'a>(pub &'a mut dyn Stream);

impl std::io::Write for StreamWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .write(buf)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endian_round_trips() {
        for value in [0u32, 1, 0xDEAD_BEEF, u32::MAX, 0x0102_0304] {
            let mut data = [0u8; 4];
            set_u32_le(&mut data, value);
            assert_eq!(get_u32_le(&data), value);
            set_u32_be(&mut data, value);
            assert_eq!(get_u32_be(&data), value);
        }
        for value in [0u16, 1, 0xBEEF, u16::MAX] {
            let mut data = [0u8; 2];
            set_u16_le(&mut data, value);
            assert_eq!(get_u16_le(&data), value);
            set_u16_be(&mut data, value);
            assert_eq!(get_u16_be(&data), value);
        }
    }

    #[test]
    fn endianness_is_explicit() {
        let mut data = [0u8; 4];
        set_u32_le(&mut data, 0x0102_0304);
        assert_eq!(data, [0x04, 0x03, 0x02, 0x01]);
        set_u32_be(&mut data, 0x0102_0304);
        assert_eq!(data, [0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn default_operations_are_unsupported() {
        struct Inert;
        impl Stream for Inert {}

        let mut s = Inert;
        assert!(matches!(
            s.read(&mut [0u8; 4]),
            Err(StreamError::NotSupported)
        ));
        assert!(matches!(s.write(&[0u8; 4]), Err(StreamError::NotSupported)));
        assert!(matches!(s.seek(0), Err(StreamError::NotSupported)));
        assert!(matches!(s.position(), Err(StreamError::NotSupported)));
        assert!(matches!(s.length(), Err(StreamError::NotSupported)));
    }
}
