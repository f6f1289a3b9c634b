//! PAK archive packing and extraction through the public API.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use pretty_assertions::assert_eq;

use lskit::compression::CompressionMethod;
use lskit::error::Error;
use lskit::pak::{self, PakReader, PakWriteOptions, PAK_VERSION};
use lskit::progress::{CancelFlag, NullProgress, ProgressListener};

fn populate(dir: &Path) {
    std::fs::create_dir_all(dir.join("Mods/Gustav")).unwrap();
    std::fs::create_dir_all(dir.join("Public")).unwrap();
    std::fs::write(dir.join("meta.lsx"), b"<save><region id=\"Config\"/></save>").unwrap();
    std::fs::write(
        dir.join("Mods/Gustav/data.bin"),
        (0..4096u32).flat_map(u32::to_le_bytes).collect::<Vec<u8>>(),
    )
    .unwrap();
    std::fs::write(dir.join("Public/notes.txt"), b"lorem ipsum ".repeat(100)).unwrap();
    std::fs::write(dir.join("Public/empty.dat"), b"").unwrap();
}

fn build_archive(src: &Path, archive: &Path, options: &PakWriteOptions) {
    pak::create_from_directory(src, archive, options, &NullProgress).unwrap();
}

#[test]
fn create_and_list() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    populate(&src);
    let archive = dir.path().join("out.pak");
    build_archive(&src, &archive, &PakWriteOptions::default());

    let reader = PakReader::open(&archive).unwrap();
    assert_eq!(reader.header().num_parts, 1);

    let names: Vec<&str> = reader.entries().iter().map(|e| e.name.as_str()).collect();
    // Entries are packed in sorted name order.
    assert_eq!(
        names,
        vec![
            "Mods/Gustav/data.bin",
            "Public/empty.dat",
            "Public/notes.txt",
            "meta.lsx",
        ]
    );
    assert!(reader.contains("meta.lsx"));
    assert!(!reader.contains("missing.lsx"));
}

#[test]
fn read_file_returns_exact_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    populate(&src);
    let archive = dir.path().join("out.pak");
    build_archive(&src, &archive, &PakWriteOptions::default());

    let reader = PakReader::open(&archive).unwrap();
    let expected = std::fs::read(src.join("Mods/Gustav/data.bin")).unwrap();
    assert_eq!(reader.read_file("Mods/Gustav/data.bin").unwrap(), expected);
    assert_eq!(reader.read_file("Public/empty.dat").unwrap(), b"");
}

#[test]
fn extract_all_recreates_the_tree() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    populate(&src);
    let archive = dir.path().join("out.pak");
    build_archive(&src, &archive, &PakWriteOptions::default());

    let dest = dir.path().join("dest");
    let reader = PakReader::open(&archive).unwrap();
    reader.extract_all(&dest, &NullProgress).unwrap();

    for entry in reader.entries() {
        let original = std::fs::read(src.join(&entry.name)).unwrap();
        let extracted = std::fs::read(dest.join(&entry.name)).unwrap();
        assert_eq!(extracted, original, "{}", entry.name);
    }
}

#[test]
fn missing_entry_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    populate(&src);
    let archive = dir.path().join("out.pak");
    build_archive(&src, &archive, &PakWriteOptions::default());

    let reader = PakReader::open(&archive).unwrap();
    assert!(matches!(
        reader.read_file("no/such.file"),
        Err(Error::FileNotFoundInPak(name)) if name == "no/such.file"
    ));
}

#[test]
fn uncompressed_option_stores_raw_payloads() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    populate(&src);
    let archive = dir.path().join("raw.pak");
    build_archive(
        &src,
        &archive,
        &PakWriteOptions {
            compression: CompressionMethod::None,
            ..PakWriteOptions::default()
        },
    );

    let reader = PakReader::open(&archive).unwrap();
    for entry in reader.entries() {
        assert_eq!(entry.method(), CompressionMethod::None, "{}", entry.name);
        assert_eq!(
            u64::from(entry.size_on_disk),
            std::fs::metadata(src.join(&entry.name)).unwrap().len(),
            "{}",
            entry.name
        );
    }
}

#[test]
fn packing_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    populate(&src);

    let first = dir.path().join("a.pak");
    let second = dir.path().join("b.pak");
    build_archive(&src, &first, &PakWriteOptions::default());
    build_archive(&src, &second, &PakWriteOptions::default());

    assert_eq!(
        std::fs::read(&first).unwrap(),
        std::fs::read(&second).unwrap()
    );
}

#[test]
fn content_digest_is_opt_in() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    populate(&src);

    let plain = dir.path().join("plain.pak");
    build_archive(&src, &plain, &PakWriteOptions::default());
    assert_eq!(PakReader::open(&plain).unwrap().header().md5, [0u8; 16]);

    let hashed = dir.path().join("hashed.pak");
    build_archive(
        &src,
        &hashed,
        &PakWriteOptions {
            hash_contents: true,
            ..PakWriteOptions::default()
        },
    );

    // The digest covers the file contents in pack (sorted-name) order.
    let mut expected = md5::Context::new();
    for name in [
        "Mods/Gustav/data.bin",
        "Public/empty.dat",
        "Public/notes.txt",
        "meta.lsx",
    ] {
        expected.consume(std::fs::read(src.join(name)).unwrap());
    }
    assert_eq!(
        PakReader::open(&hashed).unwrap().header().md5,
        expected.compute().0
    );
}

#[derive(Default)]
struct RecordingProgress {
    files: Mutex<Vec<(String, usize, usize)>>,
    finished: AtomicBool,
}

impl ProgressListener for RecordingProgress {
    fn on_file(&self, name: &str, index: usize, total: usize) {
        self.files
            .lock()
            .unwrap()
            .push((name.to_string(), index, total));
    }

    fn on_finished(&self) {
        self.finished.store(true, Ordering::Relaxed);
    }
}

#[test]
fn packing_reports_each_file_after_it_lands() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    populate(&src);
    let archive = dir.path().join("out.pak");

    let listener = RecordingProgress::default();
    pak::create_from_directory(&src, &archive, &PakWriteOptions::default(), &listener).unwrap();
    assert!(listener.finished.load(Ordering::Relaxed));

    let files = listener.files.into_inner().unwrap();
    let expected = [
        "Mods/Gustav/data.bin",
        "Public/empty.dat",
        "Public/notes.txt",
        "meta.lsx",
    ];
    assert_eq!(files.len(), expected.len());
    for (i, (name, index, total)) in files.iter().enumerate() {
        assert_eq!(name, expected[i]);
        assert_eq!(*index, i);
        assert_eq!(*total, expected.len());
    }
}

#[test]
fn garbage_input_is_not_an_archive() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("noise.pak");
    std::fs::write(&path, b"this is not an archive at all").unwrap();
    assert!(matches!(
        PakReader::open(&path),
        Err(Error::InvalidPakMagic)
    ));
}

#[test]
fn legacy_trailing_header_is_called_out() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.pak");

    // Legacy generations keep the header at the end of the file; the last
    // eight bytes are the header size followed by a second magic.
    let mut bytes = vec![0u8; 64];
    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(b"LSPK");
    std::fs::write(&path, &bytes).unwrap();

    assert!(matches!(
        PakReader::open(&path),
        Err(Error::UnsupportedPakVersion(_))
    ));
}

#[test]
fn unsupported_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    populate(&src);
    let archive = dir.path().join("v17.pak");
    build_archive(&src, &archive, &PakWriteOptions::default());

    let mut bytes = std::fs::read(&archive).unwrap();
    bytes[4..8].copy_from_slice(&17u32.to_le_bytes());
    std::fs::write(&archive, &bytes).unwrap();

    assert!(matches!(
        PakReader::open(&archive),
        Err(Error::UnsupportedPakVersion(_))
    ));
}

#[test]
fn pre_cancelled_extraction_stops() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    populate(&src);
    let archive = dir.path().join("out.pak");
    build_archive(&src, &archive, &PakWriteOptions::default());

    let flag = CancelFlag::new();
    flag.cancel();
    let reader = PakReader::open(&archive).unwrap();
    let err = reader
        .extract_all(&dir.path().join("dest"), &flag)
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}

#[test]
fn archive_version_constant_matches_disk() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    populate(&src);
    let archive = dir.path().join("out.pak");
    build_archive(&src, &archive, &PakWriteOptions::default());

    let bytes = std::fs::read(&archive).unwrap();
    assert_eq!(&bytes[0..4], b"LSPK");
    assert_eq!(
        u32::from_le_bytes(bytes[4..8].try_into().unwrap()),
        PAK_VERSION
    );
}
