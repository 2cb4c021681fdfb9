//! Integration tests for the compound file writer.
//!
//! These tests verify that written containers can be read back with the
//! `cfb` crate, an independent reader implementation, so the writer is
//! validated against more than its own expectations.

use crate::builder::CfbWriter;
use crate::directory::DirectoryBuilder;
use crate::error::CfbError;
use crate::sector::SectorPool;
use proptest::prelude::*;
use std::io::{Cursor, Read};

/// Build the container in memory and hand it to the reference reader.
fn read_back(writer: CfbWriter) -> cfb::CompoundFile<Cursor<Vec<u8>>> {
    let mut buffer = Vec::new();
    writer.write_to(&mut buffer).unwrap();
    cfb::CompoundFile::open(Cursor::new(buffer)).unwrap()
}

fn open_stream(comp: &mut cfb::CompoundFile<Cursor<Vec<u8>>>, path: &str) -> Vec<u8> {
    let mut data = Vec::new();
    comp.open_stream(path)
        .unwrap()
        .read_to_end(&mut data)
        .unwrap();
    data
}

#[test]
fn test_write_simple_file() {
    let mut writer = CfbWriter::new();
    writer.create_stream(&["First"], b"Hello, World!").unwrap();
    writer.create_stream(&["Second"], b"More data").unwrap();
    writer
        .create_stream(&["Third"], &vec![0xAB; 6000])
        .unwrap();

    let mut buffer = Vec::new();
    writer.write_to(&mut buffer).unwrap();

    // Header plus at least one sector each for data, directory, and FAT
    assert!(buffer.len() >= 1536);
    assert_eq!(&buffer[0..8], b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1");

    let mut comp = cfb::CompoundFile::open(Cursor::new(buffer)).unwrap();
    assert_eq!(open_stream(&mut comp, "/First"), b"Hello, World!");
    assert_eq!(open_stream(&mut comp, "/Second"), b"More data");
    assert_eq!(open_stream(&mut comp, "/Third"), vec![0xAB; 6000]);
}

#[test]
fn test_roundtrip_mixed_sizes() {
    // Small streams travel through the ministream, large ones through
    // big sectors, including both sides of the cutoff boundary
    let cases: &[(&str, usize, u8)] = &[
        ("Tiny", 4, 0x01),
        ("Small", 1000, 0x11),
        ("Medium", 3000, 0x22),
        ("JustUnder", 4095, 0x33),
        ("Exactly", 4096, 0x44),
        ("JustOver", 4097, 0x55),
        ("Huge", 20000, 0x66),
    ];

    let mut writer = CfbWriter::new();
    for &(name, size, fill) in cases {
        writer.create_stream(&[name], &vec![fill; size]).unwrap();
    }

    let mut comp = read_back(writer);
    for &(name, size, fill) in cases {
        let data = open_stream(&mut comp, &format!("/{}", name));
        assert_eq!(data.len(), size);
        assert!(data.iter().all(|&b| b == fill));
    }
}

#[test]
fn test_roundtrip_nested_storage() {
    let mut writer = CfbWriter::new();
    writer.create_storage(&["sub"]).unwrap();
    writer.create_stream(&["a.txt"], &[0x0A; 10]).unwrap();
    writer
        .create_stream(&["sub", "b.txt"], &vec![0x0B; 5000])
        .unwrap();

    let mut comp = read_back(writer);

    assert_eq!(open_stream(&mut comp, "/a.txt"), vec![0x0A; 10]);
    assert_eq!(open_stream(&mut comp, "/sub/b.txt"), vec![0x0B; 5000]);

    let mut storages = Vec::new();
    let mut streams = Vec::new();
    for entry in comp.walk() {
        if entry.is_storage() && !entry.is_root() {
            storages.push(entry.name().to_string());
        } else if entry.is_stream() {
            streams.push(entry.name().to_string());
        }
    }
    storages.sort();
    streams.sort();
    assert_eq!(storages, vec!["sub"]);
    assert_eq!(streams, vec!["a.txt", "b.txt"]);
}

#[test]
fn test_roundtrip_deep_nesting() {
    let mut writer = CfbWriter::new();
    writer.create_storage(&["outer"]).unwrap();
    writer.create_storage(&["outer", "inner"]).unwrap();
    writer
        .create_stream(&["outer", "shallow"], b"shallow data")
        .unwrap();
    writer
        .create_stream(&["outer", "inner", "deep"], b"deep data")
        .unwrap();
    writer.create_stream(&["top1"], b"one").unwrap();
    writer.create_stream(&["top2"], b"two").unwrap();
    writer.create_stream(&["top3"], &vec![0x77; 9000]).unwrap();

    let mut comp = read_back(writer);
    assert_eq!(open_stream(&mut comp, "/outer/shallow"), b"shallow data");
    assert_eq!(open_stream(&mut comp, "/outer/inner/deep"), b"deep data");
    assert_eq!(open_stream(&mut comp, "/top1"), b"one");
    assert_eq!(open_stream(&mut comp, "/top2"), b"two");
    assert_eq!(open_stream(&mut comp, "/top3"), vec![0x77; 9000]);
}

#[test]
fn test_roundtrip_empty_stream() {
    let mut writer = CfbWriter::new();
    writer.create_stream(&["Empty"], b"").unwrap();
    writer.create_stream(&["Filler1"], b"x").unwrap();
    writer.create_stream(&["Filler2"], b"y").unwrap();

    let mut comp = read_back(writer);
    assert_eq!(open_stream(&mut comp, "/Empty"), b"");
    assert_eq!(open_stream(&mut comp, "/Filler1"), b"x");
}

#[test]
fn test_roundtrip_many_small_streams() {
    // Eleven ministream tenants plus the root fill three directory
    // sectors exactly
    let mut writer = CfbWriter::new();
    for i in 0..11u8 {
        let name = format!("Stream{}", i);
        writer
            .create_stream(&[&name], &vec![i; 100 + i as usize * 50])
            .unwrap();
    }

    let mut comp = read_back(writer);
    for i in 0..11u8 {
        let data = open_stream(&mut comp, &format!("/Stream{}", i));
        assert_eq!(data.len(), 100 + i as usize * 50);
        assert!(data.iter().all(|&b| b == i));
    }
}

#[test]
fn test_roundtrip_large_stream() {
    let mut writer = CfbWriter::new();
    writer
        .create_stream(&["Large"], &vec![0x42; 100_000])
        .unwrap();
    writer.create_stream(&["Pad1"], b"p1").unwrap();
    writer.create_stream(&["Pad2"], b"p2").unwrap();

    let mut comp = read_back(writer);
    let data = open_stream(&mut comp, "/Large");
    assert_eq!(data.len(), 100_000);
    assert!(data.iter().all(|&b| b == 0x42));
}

#[test]
fn test_save_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("container.cfb");

    let mut writer = CfbWriter::new();
    writer.create_storage(&["store"]).unwrap();
    writer.create_stream(&["file"], b"File content").unwrap();
    writer
        .create_stream(&["store", "nested"], b"Nested content")
        .unwrap();
    writer.save(&path).unwrap();

    let mut comp = cfb::open(&path).unwrap();
    let mut data = Vec::new();
    comp.open_stream("/file")
        .unwrap()
        .read_to_end(&mut data)
        .unwrap();
    assert_eq!(data, b"File content");
}

#[test]
fn test_duplicate_name_is_case_folded() {
    let mut writer = CfbWriter::new();
    writer.create_stream(&["A"], b"first").unwrap();

    let err = writer.create_stream(&["a"], b"second").unwrap_err();
    assert!(matches!(err, CfbError::DuplicateName { name } if name == "a"));
}

#[test]
fn test_missing_parent_aborts() {
    let mut writer = CfbWriter::new();
    let err = writer
        .create_stream(&["missing", "stream"], b"data")
        .unwrap_err();
    assert!(matches!(err, CfbError::PathNotFound { .. }));
}

#[test]
fn test_capacity_error_writes_nothing() {
    // 8 MiB of stream data needs more FAT sectors than the header's
    // inline DIFAT can address
    let mut writer = CfbWriter::new();
    writer
        .create_stream(&["big"], &vec![0u8; 8 * 1024 * 1024])
        .unwrap();

    let mut buffer = Vec::new();
    let err = writer.write_to(&mut buffer).unwrap_err();
    assert!(matches!(err, CfbError::CapacityExceeded { .. }));
    assert!(buffer.is_empty());
}

#[test]
fn test_directory_padding_pattern() {
    // Root plus one stream leaves two trailing filler records
    let mut writer = CfbWriter::new();
    writer.create_stream(&["only"], &vec![0x5A; 5000]).unwrap();

    let mut buffer = Vec::new();
    writer.write_to(&mut buffer).unwrap();

    let dir_start = u32::from_le_bytes(buffer[48..52].try_into().unwrap());
    let dir_offset = 512 + dir_start as usize * 512;
    let filler = &buffer[dir_offset + 2 * 128..dir_offset + 4 * 128];
    assert!(filler.iter().all(|&b| b == 0xFF));
}

#[test]
fn test_first_discovered_stream_id_order() {
    let mut directory = DirectoryBuilder::new();
    directory.insert_storage(&["sub"]).unwrap();
    directory.insert_stream(&["a.txt"], 0, 10).unwrap();
    directory.insert_stream(&["sub", "b.txt"], 0, 5000).unwrap();

    assert_eq!(directory.entry(1).name.as_str(), "sub");
    assert_eq!(directory.entry(2).name.as_str(), "a.txt");
    assert_eq!(directory.entry(3).name.as_str(), "b.txt");

    // Four records, no padding needed
    assert_eq!(directory.build_directory_stream().len(), 4 * 128);
}

proptest! {
    #[test]
    fn prop_payload_roundtrip(
        a in proptest::collection::vec(any::<u8>(), 0..9000),
        b in proptest::collection::vec(any::<u8>(), 0..9000),
        c in proptest::collection::vec(any::<u8>(), 0..9000),
    ) {
        let mut writer = CfbWriter::new();
        writer.create_stream(&["s1"], &a).unwrap();
        writer.create_stream(&["s2"], &b).unwrap();
        writer.create_stream(&["s3"], &c).unwrap();

        let mut comp = read_back(writer);
        prop_assert_eq!(open_stream(&mut comp, "/s1"), a);
        prop_assert_eq!(open_stream(&mut comp, "/s2"), b);
        prop_assert_eq!(open_stream(&mut comp, "/s3"), c);
    }

    #[test]
    fn prop_sibling_ordering_law(
        names in proptest::collection::vec("[A-Za-z0-9]{1,12}", 1..16)
    ) {
        let mut directory = DirectoryBuilder::new();
        let mut inserted: Vec<String> = Vec::new();

        for name in names {
            if directory.insert_stream(&[&name], 0, 0).is_ok() {
                inserted.push(name);
            }
        }

        let order: Vec<String> = directory
            .traverse()
            .skip(1)
            .map(|id| directory.entry(id).name.as_str().to_string())
            .collect();

        let mut expected = inserted;
        expected.sort_by_key(|n| (n.encode_utf16().count(), n.to_uppercase()));
        prop_assert_eq!(order, expected);
    }

    #[test]
    fn prop_fat_chain_length_law(size in 1usize..100_000) {
        let mut pool = SectorPool::new(512, 64);
        let head = pool.allocate_big(&vec![0xA5; size]).unwrap();

        let mut len = 0;
        let mut current = head;
        while current != crate::consts::ENDOFCHAIN {
            len += 1;
            current = pool.fat()[current as usize];
        }
        prop_assert_eq!(len, size.div_ceil(512));
    }

    #[test]
    fn prop_minifat_chain_length_law(size in 1usize..4096) {
        let mut pool = SectorPool::new(512, 64);
        let head = pool.allocate_mini(&vec![0x5A; size]).unwrap();

        let mut len = 0;
        let mut current = head;
        while current != crate::consts::ENDOFCHAIN {
            len += 1;
            current = pool.minifat()[current as usize];
        }
        prop_assert_eq!(len, size.div_ceil(64));
    }
}
