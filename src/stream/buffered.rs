use crate::stream::{Stream, StreamResult};

/// Fixed-size read-ahead buffer over another stream.
///
/// Refills happen only when the buffer runs dry, and a refill issues a
/// single read against the source. Seeks that land inside the cached
/// window are satisfied without touching the source.
pub struct BufferedStream<S: Stream> {
    source: S,
    buf: Vec<u8>,
    /// Bytes of `buf` holding source data.
    valid: usize,
    /// Bytes of `buf` already handed out.
    offset: usize,
    /// Source position just past the buffered window.
    end: u32,
}

impl<S: Stream> BufferedStream<S> {
    pub fn new(source: S, capacity: usize) -> Self {
        BufferedStream {
            source,
            buf: vec![0; capacity],
            valid: 0,
            offset: 0,
            end: 0,
        }
    }

    fn left(&self) -> usize {
        self.valid - self.offset
    }

    fn refill(&mut self) -> StreamResult<()> {
        self.offset = 0;
        self.valid = self.source.read(&mut self.buf)?;
        self.end += self.valid as u32;
        Ok(())
    }
}

impl<S: Stream> Stream for BufferedStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> StreamResult<usize> {
        if self.left() == 0 {
            self.refill()?;
        }

        let count = buf.len().min(self.left());
        buf[..count].copy_from_slice(&self.buf[self.offset..self.offset + count]);
        self.offset += count;
        Ok(count)
    }

    fn read_u8(&mut self) -> StreamResult<u8> {
        if self.left() == 0 {
            self.refill()?;
        }
        if self.left() == 0 {
            return Err(crate::stream::StreamError::EndOfStream);
        }

        let value = self.buf[self.offset];
        self.offset += 1;
        Ok(value)
    }

    fn seek(&mut self, position: u32) -> StreamResult<()> {
        // Positions within the cached window only need a cursor move.
        let beg = self.end - self.valid as u32;
        if position >= beg && position < beg + self.valid as u32 {
            self.offset = (position - beg) as usize;
            return Ok(());
        }

        self.source.seek(position)?;
        self.offset = 0;
        self.valid = 0;
        self.end = position;
        Ok(())
    }
}
