use crate::stream::{IoErr, Stream, StreamResult};
use snafu::ResultExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// File-backed stream. The file is closed when the stream is dropped.
pub struct FileStream {
    file: File,
}

impl FileStream {
    pub fn open(path: &Path) -> StreamResult<Self> {
        let file = File::open(path).context(IoErr)?;
        Ok(FileStream { file })
    }

    pub fn create(path: &Path) -> StreamResult<Self> {
        let file = File::create(path).context(IoErr)?;
        Ok(FileStream { file })
    }

    pub fn append(path: &Path) -> StreamResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .context(IoErr)?;
        Ok(FileStream { file })
    }
}

impl Stream for FileStream {
    fn read(&mut self, buf: &mut [u8]) -> StreamResult<usize> {
        self.file.read(buf).context(IoErr)
    }

    fn write(&mut self, buf: &[u8]) -> StreamResult<usize> {
        self.file.write(buf).context(IoErr)
    }

    fn skip(&mut self, count: u32) -> StreamResult<()> {
        self.file
            .seek(SeekFrom::Current(count as i64))
            .context(IoErr)?;
        Ok(())
    }

    fn seek(&mut self, position: u32) -> StreamResult<()> {
        self.file
            .seek(SeekFrom::Start(position as u64))
            .context(IoErr)?;
        Ok(())
    }

    fn position(&mut self) -> StreamResult<u32> {
        let pos = self.file.stream_position().context(IoErr)?;
        Ok(pos as u32)
    }

    fn length(&mut self) -> StreamResult<u32> {
        let len = self.file.metadata().context(IoErr)?.len();
        Ok(len as u32)
    }
}
