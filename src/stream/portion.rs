use crate::stream::{Stream, StreamError, StreamResult};

/// Read-only view bounding reads to the next `len` bytes of an
/// underlying stream.
pub struct PortionStream<S: Stream> {
    source: S,
    left: u32,
    len: u32,
}

impl<S: Stream> PortionStream<S> {
    pub fn new(source: S, len: u32) -> Self {
        PortionStream {
            source,
            left: len,
            len,
        }
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: Stream> Stream for PortionStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> StreamResult<usize> {
        let count = buf.len().min(self.left as usize);
        let read = self.source.read(&mut buf[..count])?;
        self.left -= read as u32;
        Ok(read)
    }

    fn read_u8(&mut self) -> StreamResult<u8> {
        if self.left == 0 {
            return Err(StreamError::EndOfStream);
        }
        let value = self.source.read_u8()?;
        self.left -= 1;
        Ok(value)
    }

    fn skip(&mut self, count: u32) -> StreamResult<()> {
        if count > self.left {
            return Err(StreamError::InvalidArgument);
        }
        self.source.skip(count)?;
        self.left -= count;
        Ok(())
    }

    fn position(&mut self) -> StreamResult<u32> {
        Ok(self.len - self.left)
    }

    fn length(&mut self) -> StreamResult<u32> {
        Ok(self.len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{MemoryStream, read_exact};

    #[test]
    fn bounds_reads_to_the_portion() {
        let data = [1u8, 2, 3, 4, 5, 6];
        let mut s = PortionStream::new(MemoryStream::new(&data), 4);

        let mut buf = [0u8; 4];
        read_exact(&mut s, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4]);
        assert_eq!(s.position().unwrap(), 4);
        assert_eq!(s.length().unwrap(), 4);

        // Underlying stream has data left, the portion does not.
        assert!(matches!(s.read_u8(), Err(StreamError::EndOfStream)));
    }

    struct StallingSource {
        bytes: Vec<u8>,
        pos: usize,
        stalled: bool,
    }

    impl Stream for StallingSource {
        fn read_u8(&mut self) -> StreamResult<u8> {
            if self.stalled {
                self.stalled = false;
                return Err(StreamError::NotSupported);
            }
            let value = self.bytes[self.pos];
            self.pos += 1;
            Ok(value)
        }
    }

    #[test]
    fn failed_source_read_does_not_consume_the_budget() {
        let source = StallingSource {
            bytes: vec![7, 8],
            pos: 0,
            stalled: true,
        };
        let mut s = PortionStream::new(source, 2);

        assert!(matches!(s.read_u8(), Err(StreamError::NotSupported)));
        assert_eq!(s.position().unwrap(), 0);

        // Once the source recovers the full portion is still readable.
        assert_eq!(s.read_u8().unwrap(), 7);
        assert_eq!(s.read_u8().unwrap(), 8);
        assert!(matches!(s.read_u8(), Err(StreamError::EndOfStream)));
    }

    #[test]
    fn skip_beyond_portion_is_invalid() {
        let data = [0u8; 8];
        let mut s = PortionStream::new(MemoryStream::new(&data), 3);
        assert!(matches!(s.skip(4), Err(StreamError::InvalidArgument)));
        s.skip(3).unwrap();
        assert_eq!(s.position().unwrap(), 3);
    }
}
