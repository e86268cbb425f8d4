//! End-to-end scenarios spanning builders, views and conversion together,
//! complementing the unit tests that live next to each module.

use eformat::compression::CompressionType;
use eformat::convert::convert_full_event;
use eformat::detector_mask::DetectorMask;
use eformat::read::FullEventView;
use eformat::source_id::{SourceIdentifier, SubDetector};
use eformat::status::StatusPosition;
use eformat::stream_tag::{self, StreamTag, TagType};
use eformat::write::{FullEventBuilder, RobBuilder, RodBuilder};

fn lar_rob() -> Vec<u32> {
    let rod = RodBuilder::new(0x0041_0001, 42, 1, 2, 0x81)
        .with_status(vec![0])
        .with_status_position(StatusPosition::Front)
        .with_data(vec![0xDEAD, 0xBEEF, 0xCAFE, 0xBABE])
        .bind();
    RobBuilder::new(0x0041_0001).with_rod(rod).bind()
}

#[test]
fn minimal_full_event_roundtrip() {
    let global_id = (0x0000_0001u64 << 32) | 0x0000_0002u64;
    let words = FullEventBuilder::new(0x0041_0001, 42, 1, 2, 0x81)
        .with_global_id(global_id)
        .with_lumi_block(7)
        .with_bc_time(1_700_000_000, 0)
        .with_robs(vec![lar_rob()])
        .bind();

    let view = FullEventView::new(&words).unwrap();
    let children = view.child_iter().unwrap();
    assert_eq!(view.nchildren().unwrap(), 1);
    assert_eq!(children.len(), 1);

    let rod = children[0].rod().unwrap();
    assert_eq!(rod.rod_ndata(), 4);
    assert_eq!(rod.source_id(), 0x0041_0001);
    assert_eq!(children[0].rod_data(), &[0xDEAD, 0xBEEF, 0xCAFE, 0xBABE]);
    assert_eq!(view.global_id(), 0x0000_0001_0000_0002);
    assert_eq!(view.run_number(), 42);
    assert_eq!(view.lumi_block(), 7);
}

#[test]
fn compressed_payload_is_smaller_and_decompresses_to_the_original() {
    let rob = lar_rob();
    let uncompressed = FullEventBuilder::new(0x0041_0001, 42, 1, 2, 0x81)
        .with_robs(vec![rob.clone()])
        .bind();
    let compressed = FullEventBuilder::new(0x0041_0001, 42, 1, 2, 0x81)
        .with_compression(CompressionType::Zlib, 6)
        .with_robs(vec![rob])
        .try_bind()
        .unwrap();

    let plain_view = FullEventView::new(&uncompressed).unwrap();
    let zipped_view = FullEventView::new(&compressed).unwrap();

    assert!(zipped_view.fragment_size_word() < plain_view.fragment_size_word());
    assert_eq!(zipped_view.readable_payload_size_word(), plain_view.readable_payload_size_word());
    assert_eq!(zipped_view.readable_payload().unwrap(), plain_view.readable_payload().unwrap());
}

#[test]
fn detector_mask_roundtrips_through_its_hex_string() {
    let mut mask = DetectorMask::new();
    mask.set(SubDetector::LarEmBarrelASide).set(SubDetector::TdaqCtp);
    let encoded = mask.string();
    assert_eq!(encoded.len(), 32);
    assert_eq!(DetectorMask::from_string(&encoded).unwrap(), mask);
    assert!(mask.is_set(SubDetector::LarEmBarrelASide));
    assert!(mask.is_set(SubDetector::TdaqCtp));
}

#[test]
fn source_identifier_code_roundtrips_for_sampled_values() {
    for code in [0x0000_0000u32, 0x0041_0001, 0x0071_0001, 0xffff_ffff] {
        assert_eq!(SourceIdentifier::from_code(code).code(), code);
    }
}

#[test]
fn stream_tag_vector_roundtrips_order_preserving() {
    let tags = vec![
        StreamTag::new("Main", TagType::Physics, true),
        StreamTag::new("Exp", TagType::Express, false).with_robs([0x0071_0001]),
    ];
    let bytes = stream_tag::encode(&tags);
    let decoded = stream_tag::decode(&bytes).unwrap();
    assert_eq!(decoded, tags);
    assert_eq!(stream_tag::size_word(&tags) as usize * 4, bytes.len());
}

#[test]
fn version_conversion_is_idempotent_at_current_version() {
    let words = FullEventBuilder::new(0x0041_0001, 42, 1, 2, 0x81).with_robs(vec![lar_rob()]).bind();
    let mut dest = vec![0u32; words.len()];
    let written = convert_full_event(&words, &mut dest).unwrap();
    assert_eq!(&dest[..written as usize], &words[..]);
}

#[test]
fn file_rollover_like_sequence_of_fragments_preserves_each_payload() {
    // Three independently built FullEvents, standing in for three records a
    // storage writer would place across a file rollover boundary; verifies
    // each parses back with its own untouched payload regardless of order.
    let built: Vec<Vec<u32>> = (0..3u32)
        .map(|i| {
            FullEventBuilder::new(0x0041_0001, 42, i, i, 0x81)
                .with_global_id(u64::from(i))
                .with_robs(vec![lar_rob()])
                .bind()
        })
        .collect();

    for (i, words) in built.iter().enumerate() {
        let view = FullEventView::new(words).unwrap();
        assert_eq!(view.global_id(), u64::from(i as u32));
        assert_eq!(view.child_iter().unwrap().len(), 1);
    }
}
