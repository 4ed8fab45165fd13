//! End to end checks for the stream layer: a file written through one
//! stream chain must read back identically through another.

use std::path::PathBuf;

use cubist::stream::{
    self, BufferedStream, Crc32Writer, FileStream, MemoryStream, PortionStream, Stream,
    StreamError,
};

fn temp_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("cubist-{}-{name}", std::process::id()));
    path
}

#[test]
fn file_round_trip_through_buffered_reader() {
    let _ = env_logger::builder().is_test(true).try_init();
    let path = temp_path("roundtrip.bin");
    let payload: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();

    {
        let mut out = FileStream::create(&path).unwrap();
        stream::write_exact(&mut out, &payload).unwrap();
    }

    let file = FileStream::open(&path).unwrap();
    let mut reader = BufferedStream::new(file, 1024);
    let mut back = vec![0u8; payload.len()];
    stream::read_exact(&mut reader, &mut back).unwrap();
    assert_eq!(back, payload);
    assert!(matches!(reader.read_u8(), Err(StreamError::EndOfStream)));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn portion_over_file_reads_a_window() {
    let path = temp_path("portion.bin");
    stream::write_all_to(&path, b"headerPAYLOADtrailer").unwrap();

    let mut file = FileStream::open(&path).unwrap();
    file.skip(6).unwrap();
    let mut portion = PortionStream::new(file, 7);

    let mut payload = [0u8; 7];
    stream::read_exact(&mut portion, &mut payload).unwrap();
    assert_eq!(&payload, b"PAYLOAD");
    assert!(matches!(portion.read_u8(), Err(StreamError::EndOfStream)));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn crc_writer_matches_memory_reference() {
    let path = temp_path("crc.bin");
    let data = b"The quick brown fox jumps over the lazy dog";

    let crc_of_file = {
        let file = FileStream::create(&path).unwrap();
        let mut writer = Crc32Writer::new(file);
        stream::write_exact(&mut writer, data).unwrap();
        writer.crc32()
    };

    // Feeding the same bytes through a memory-backed writer must agree.
    let sink = SinkStream::default();
    let mut reference = Crc32Writer::new(sink);
    stream::write_exact(&mut reference, data).unwrap();
    assert_eq!(crc_of_file, reference.crc32());

    let mut back = Vec::new();
    {
        let mut file = FileStream::open(&path).unwrap();
        let len = file.length().unwrap() as usize;
        back.resize(len, 0);
        stream::read_exact(&mut file, &mut back).unwrap();
    }
    assert_eq!(back, data);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn endian_helpers_survive_stream_transport() {
    let mut scratch = [0u8; 12];
    stream::set_u32_le(&mut scratch[0..], 0xDEAD_BEEF);
    stream::set_u32_be(&mut scratch[4..], 0xDEAD_BEEF);
    stream::set_u16_le(&mut scratch[8..], 0xABCD);
    stream::set_u16_be(&mut scratch[10..], 0xABCD);

    let mut reader = MemoryStream::new(&scratch);
    assert_eq!(stream::read_u32_le(&mut reader).unwrap(), 0xDEAD_BEEF);
    assert_eq!(stream::read_u32_be(&mut reader).unwrap(), 0xDEAD_BEEF);

    assert_eq!(stream::get_u16_le(&scratch[8..]), 0xABCD);
    assert_eq!(stream::get_u16_be(&scratch[10..]), 0xABCD);
}

#[test]
fn seek_repositions_file_reads() {
    let path = temp_path("seek.bin");
    stream::write_all_to(&path, b"0123456789").unwrap();

    let mut file = FileStream::open(&path).unwrap();
    file.seek(7).unwrap();
    assert_eq!(file.read_u8().unwrap(), b'7');
    assert_eq!(file.position().unwrap(), 8);
    assert_eq!(file.length().unwrap(), 10);

    file.seek(0).unwrap();
    assert_eq!(file.read_u8().unwrap(), b'0');

    let _ = std::fs::remove_file(&path);
}

/// Write-only stream that discards its input, for CRC reference runs.
#[derive(Default)]
struct SinkStream;

impl Stream for SinkStream {
    fn write(&mut self, buf: &[u8]) -> cubist::stream::StreamResult<usize> {
        Ok(buf.len())
    }
}
