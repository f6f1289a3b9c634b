//! File and memory stream behavior through the public API.

use pretty_assertions::assert_eq;

use lskit::error::Error;
use lskit::stream::{FileStream, MemoryStream, SeekFrom, Stream};

fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|n| b'A' + (n % 26) as u8).collect()
}

#[test]
fn file_round_trip_crosses_buffer_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.bin");

    // Larger than the 64 KiB internal buffer, so a single logical read
    // and write both span buffer refills.
    let data = patterned(200_000);
    {
        let mut out = FileStream::open(&path, "wb").unwrap();
        assert_eq!(out.write(&data).unwrap(), data.len());
    }

    let mut inp = FileStream::open(&path, "rb").unwrap();
    assert_eq!(inp.size().unwrap(), data.len() as u64);
    assert_eq!(inp.read_bytes(data.len()).unwrap(), data);
}

#[test]
fn mode_misuse_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("modes.bin");
    std::fs::write(&path, b"content").unwrap();

    let mut reader = FileStream::open(&path, "rb").unwrap();
    assert!(matches!(
        reader.write(b"nope"),
        Err(Error::InvalidStreamOperation(_))
    ));

    let mut writer = FileStream::open(&path, "wb").unwrap();
    let mut buf = [0u8; 4];
    assert!(matches!(
        Stream::read(&mut writer, &mut buf),
        Err(Error::InvalidStreamOperation(_))
    ));
}

#[test]
fn unknown_mode_string_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = FileStream::open(dir.path().join("x.bin"), "r+").unwrap_err();
    assert!(matches!(err, Error::InvalidOpenMode(m) if m == "r+"));
}

#[test]
fn append_mode_extends_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.bin");

    FileStream::open(&path, "wb").unwrap().write(b"first").unwrap();
    FileStream::open(&path, "ab").unwrap().write(b"|second").unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), b"first|second");
}

#[test]
fn typed_reads_and_seeks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("typed.bin");
    {
        let mut out = FileStream::open(&path, "wb").unwrap();
        out.write_u32(0xDEADBEEF).unwrap();
        out.write_u16(7).unwrap();
        out.write_u64(u64::MAX).unwrap();
    }

    let mut inp = FileStream::open(&path, "rb").unwrap();
    assert_eq!(inp.read_u32().unwrap(), 0xDEADBEEF);
    assert_eq!(inp.read_u16().unwrap(), 7);
    assert_eq!(inp.read_u64().unwrap(), u64::MAX);

    inp.seek(SeekFrom::Start(4)).unwrap();
    assert_eq!(inp.tell().unwrap(), 4);
    assert_eq!(inp.read_u16().unwrap(), 7);
}

#[test]
fn reopen_resets_a_closed_stream() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reopen.bin");
    std::fs::write(&path, b"abcdef").unwrap();

    let mut stream = FileStream::open(&path, "rb").unwrap();
    stream.read_bytes(3).unwrap();
    stream.close().unwrap();
    assert!(!stream.is_open());
    assert!(matches!(stream.read_u8(), Err(Error::StreamNotOpen)));

    stream.reopen().unwrap();
    assert_eq!(stream.read_bytes(6).unwrap(), b"abcdef");
}

#[test]
fn sub_stream_is_bounded() {
    let mut stream = MemoryStream::read_only(patterned(32));
    stream.seek(SeekFrom::Start(4)).unwrap();

    let mut sub = stream.read_stream(8).unwrap();
    assert_eq!(sub.size().unwrap(), 8);
    assert_eq!(sub.read_bytes(8).unwrap(), patterned(32)[4..12].to_vec());
    assert!(matches!(sub.read_u8(), Err(Error::UnexpectedEof { .. })));

    // Parent position advanced past the carved-out range.
    assert_eq!(stream.tell().unwrap(), 12);
}
