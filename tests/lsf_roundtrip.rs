//! LSF encode/decode behavior through the public API.

use pretty_assertions::assert_eq;

use lskit::compression::{CompressionLevel, CompressionMethod};
use lskit::error::Error;
use lskit::formats::common::{AttributeValue, PackedVersion};
use lskit::formats::lsf::{self, MetadataFormat, NodeId, Resource, WriteOptions};

fn sample_resource() -> Resource {
    let mut res = Resource::new();
    res.version = PackedVersion::new(4, 1, 9, 330);

    let root = res.add_region("Config");
    let object = res.append_child(root, "Object");
    res.set_attribute(object, "Name", AttributeValue::FixedString("Gustav".into()));
    res.set_attribute(object, "Weight", AttributeValue::Float(12.5));
    res.set_attribute(
        object,
        "Position",
        AttributeValue::Vec3([1.0, -2.0, 0.25]),
    );
    res.set_attribute(object, "Enabled", AttributeValue::Bool(true));

    let meta = res.append_child(root, "Metadata");
    res.set_attribute(meta, "Count", AttributeValue::Int(-7));
    res.set_attribute(meta, "Mask", AttributeValue::ULongLong(u64::MAX));
    res.set_attribute(
        meta,
        "UUID",
        AttributeValue::Uuid([
            0x44, 0x33, 0x22, 0x11, 0x66, 0x55, 0x88, 0x77, 0xAA, 0x99, 0xCC, 0xBB, 0xEE,
            0xDD, 0x00, 0xFF,
        ]),
    );
    res.set_attribute(
        meta,
        "DisplayName",
        AttributeValue::TranslatedString {
            version: 2,
            handle: "h0a1b2c3dg4e5f".into(),
        },
    );
    res.set_attribute(meta, "Blob", AttributeValue::ScratchBuffer(vec![1, 2, 3, 250]));
    res.set_attribute(meta, "Empty", AttributeValue::None);
    res
}

/// Compare two trees structurally, attribute maps included.
fn assert_same_tree(a: &Resource, b: &Resource) {
    assert_eq!(
        a.regions().keys().collect::<Vec<_>>(),
        b.regions().keys().collect::<Vec<_>>()
    );
    for (name, id_a) in a.regions() {
        let id_b = b.region(name).expect("region missing after decode");
        assert_same_node(a, *id_a, b, id_b);
    }
}

fn assert_same_node(a: &Resource, id_a: NodeId, b: &Resource, id_b: NodeId) {
    let node_a = a.node(id_a);
    let node_b = b.node(id_b);
    assert_eq!(node_a.name, node_b.name);
    assert_eq!(node_a.attributes, node_b.attributes, "node {}", node_a.name);

    let children_a: Vec<NodeId> = a.children_of(id_a).collect();
    let children_b: Vec<NodeId> = b.children_of(id_b).collect();
    assert_eq!(children_a.len(), children_b.len(), "node {}", node_a.name);
    for (ca, cb) in children_a.iter().zip(&children_b) {
        assert_same_node(a, *ca, b, *cb);
    }
}

#[test]
fn adjacency_round_trip_with_lz4() {
    let original = sample_resource();
    let bytes = lsf::to_bytes(&original, &WriteOptions::default()).unwrap();
    let decoded = lsf::read_bytes(&bytes).unwrap();

    assert_eq!(decoded.version, original.version);
    assert_eq!(decoded.metadata_format, MetadataFormat::KeysAndAdjacency);
    assert_same_tree(&original, &decoded);
}

#[test]
fn compact_round_trip_without_compression() {
    let original = sample_resource();
    let options = WriteOptions {
        metadata_format: MetadataFormat::None,
        compression: CompressionMethod::None,
        ..WriteOptions::default()
    };
    let bytes = lsf::to_bytes(&original, &options).unwrap();
    let decoded = lsf::read_bytes(&bytes).unwrap();

    assert_eq!(decoded.metadata_format, MetadataFormat::None);
    assert_same_tree(&original, &decoded);
}

#[test]
fn zlib_round_trip() {
    let original = sample_resource();
    let options = WriteOptions {
        compression: CompressionMethod::Zlib,
        level: CompressionLevel::Max,
        ..WriteOptions::default()
    };
    let bytes = lsf::to_bytes(&original, &options).unwrap();
    assert_same_tree(&original, &lsf::read_bytes(&bytes).unwrap());
}

#[test]
fn key_attributes_survive_adjacency_round_trip() {
    let mut original = sample_resource();
    let root = original.region("Config").unwrap();
    let object = original.children_of(root).next().unwrap();
    original.node_mut(object).key_attribute = Some("Name".to_string());

    let bytes = lsf::to_bytes(&original, &WriteOptions::default()).unwrap();
    let decoded = lsf::read_bytes(&bytes).unwrap();

    let root = decoded.region("Config").unwrap();
    let object = decoded.children_of(root).next().unwrap();
    assert_eq!(
        decoded.node(object).key_attribute.as_deref(),
        Some("Name")
    );
}

#[test]
fn same_name_sibling_order_is_preserved() {
    let mut original = Resource::new();
    let root = original.add_region("root");
    for i in 0..5 {
        let child = original.append_child(root, "Item");
        original.set_attribute(child, "Index", AttributeValue::Int(i));
    }

    let bytes = lsf::to_bytes(&original, &WriteOptions::default()).unwrap();
    let decoded = lsf::read_bytes(&bytes).unwrap();

    let root = decoded.region("root").unwrap();
    let indices: Vec<i32> = decoded
        .children_of(root)
        .map(|id| match decoded.node(id).attributes["Index"] {
            AttributeValue::Int(i) => i,
            ref other => panic!("unexpected value {other:?}"),
        })
        .collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
}

#[test]
fn bad_magic_is_rejected() {
    let err = lsf::read_bytes(b"NOPE\x06\x00\x00\x00rest").unwrap_err();
    assert!(matches!(err, Error::InvalidLsfMagic(_)));
}

#[test]
fn version_gate_applies_both_ways() {
    let original = sample_resource();
    let options = WriteOptions {
        version: 5,
        ..WriteOptions::default()
    };
    assert!(matches!(
        lsf::to_bytes(&original, &options),
        Err(Error::UnsupportedLsfVersion { version: 5, .. })
    ));

    let mut bytes = lsf::to_bytes(&original, &WriteOptions::default()).unwrap();
    bytes[4..8].copy_from_slice(&8u32.to_le_bytes());
    assert!(matches!(
        lsf::read_bytes(&bytes),
        Err(Error::UnsupportedLsfVersion { version: 8, .. })
    ));
}

#[test]
fn zero_engine_version_falls_back() {
    let mut original = sample_resource();
    original.version = PackedVersion::default();

    let bytes = lsf::to_bytes(&original, &WriteOptions::default()).unwrap();
    let decoded = lsf::read_bytes(&bytes).unwrap();
    assert_eq!(decoded.version, PackedVersion::new(4, 0, 9, 0));
}

#[test]
fn matrices_cannot_be_encoded() {
    let mut original = Resource::new();
    let root = original.add_region("root");
    original.set_attribute(root, "Transform", AttributeValue::Mat4([0.5; 16]));

    let err = lsf::to_bytes(&original, &WriteOptions::default()).unwrap_err();
    assert!(matches!(err, Error::UnsupportedAttributeType { .. }));
}

#[test]
fn file_round_trip_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.lsf");

    let original = sample_resource();
    lsf::write(&original, &path).unwrap();
    let decoded = lsf::read(&path).unwrap();
    assert_same_tree(&original, &decoded);
}
