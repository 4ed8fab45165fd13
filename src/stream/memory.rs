use crate::stream::{Stream, StreamError, StreamResult};

/// Read-only stream over a fixed memory region.
pub struct MemoryStream<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> MemoryStream<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        MemoryStream { data, offset: 0 }
    }

    fn left(&self) -> usize {
        self.data.len() - self.offset
    }
}

impl Stream for MemoryStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> StreamResult<usize> {
        let count = buf.len().min(self.left());
        buf[..count].copy_from_slice(&self.data[self.offset..self.offset + count]);
        self.offset += count;
        Ok(count)
    }

    fn read_u8(&mut self) -> StreamResult<u8> {
        if self.left() == 0 {
            return Err(StreamError::EndOfStream);
        }
        let value = self.data[self.offset];
        self.offset += 1;
        Ok(value)
    }

    fn skip(&mut self, count: u32) -> StreamResult<()> {
        if count as usize > self.left() {
            return Err(StreamError::InvalidArgument);
        }
        self.offset += count as usize;
        Ok(())
    }

    fn seek(&mut self, position: u32) -> StreamResult<()> {
        if position as usize >= self.data.len() {
            return Err(StreamError::InvalidArgument);
        }
        self.offset = position as usize;
        Ok(())
    }

    fn position(&mut self) -> StreamResult<u32> {
        Ok(self.offset as u32)
    }

    fn length(&mut self) -> StreamResult<u32> {
        Ok(self.data.len() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::read_exact;

    #[test]
    fn reads_and_seeks() {
        let mut s = MemoryStream::new(&[1, 2, 3, 4, 5]);
        assert_eq!(s.read_u8().unwrap(), 1);

        let mut buf = [0u8; 3];
        read_exact(&mut s, &mut buf).unwrap();
        assert_eq!(buf, [2, 3, 4]);
        assert_eq!(s.position().unwrap(), 4);

        s.seek(1).unwrap();
        assert_eq!(s.read_u8().unwrap(), 2);
        assert!(matches!(s.seek(5), Err(StreamError::InvalidArgument)));
    }

    #[test]
    fn exhaustion_promotes_end_of_stream() {
        let mut s = MemoryStream::new(&[7]);
        assert_eq!(s.read_u8().unwrap(), 7);
        assert!(matches!(s.read_u8(), Err(StreamError::EndOfStream)));

        let mut buf = [0u8; 4];
        assert!(matches!(
            read_exact(&mut s, &mut buf),
            Err(StreamError::EndOfStream)
        ));
    }

    #[test]
    fn skip_past_end_is_invalid() {
        let mut s = MemoryStream::new(&[1, 2]);
        assert!(matches!(s.skip(3), Err(StreamError::InvalidArgument)));
        s.skip(2).unwrap();
    }
}
