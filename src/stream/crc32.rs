use crate::stream::{Stream, StreamResult};

const CRC32_POLY: u32 = 0xEDB8_8320;

const CRC32_TABLE: [u32; 256] = build_crc32_table();

const fn build_crc32_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut c = i as u32;
        let mut bit = 0;
        while bit < 8 {
            c = if c & 1 != 0 { CRC32_POLY ^ (c >> 1) } else { c >> 1 };
            bit += 1;
        }
        table[i] = c;
        i += 1;
    }
    table
}

/// Write-only wrapper that accumulates a CRC32 of everything written
/// through it before forwarding to the underlying stream.
pub struct Crc32Writer<S: Stream> {
    source: S,
    state: u32,
}

impl<S: Stream> Crc32Writer<S> {
    pub fn new(source: S) -> Self {
        Crc32Writer {
            source,
            state: 0xFFFF_FFFF,
        }
    }

    /// Finalized checksum of the bytes written so far.
    pub fn crc32(&self) -> u32 {
        self.state ^ 0xFFFF_FFFF
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: Stream> Stream for Crc32Writer<S> {
    fn write(&mut self, buf: &[u8]) -> StreamResult<usize> {
        let written = self.source.write(buf)?;

        let mut crc = self.state;
        for &byte in &buf[..written] {
            crc = CRC32_TABLE[((crc ^ byte as u32) & 0xFF) as usize] ^ (crc >> 8);
        }
        self.state = crc;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{StreamResult, write_exact};

    struct Sink;
    impl Stream for Sink {
        fn write(&mut self, buf: &[u8]) -> StreamResult<usize> {
            Ok(buf.len())
        }
    }

    #[test]
    fn matches_reference_vector() {
        let mut s = Crc32Writer::new(Sink);
        write_exact(&mut s, b"123456789").unwrap();
        assert_eq!(s.crc32(), 0xCBF4_3926);
    }

    #[test]
    fn empty_input_checksums_to_zero() {
        let s = Crc32Writer::new(Sink);
        assert_eq!(s.crc32(), 0);
    }

    #[test]
    fn accumulates_across_writes() {
        let mut split = Crc32Writer::new(Sink);
        write_exact(&mut split, b"1234").unwrap();
        write_exact(&mut split, b"56789").unwrap();

        let mut whole = Crc32Writer::new(Sink);
        write_exact(&mut whole, b"123456789").unwrap();

        assert_eq!(split.crc32(), whole.crc32());
    }
}
