/*
 * SPDX-FileCopyrightText: 2022 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: CC0-1.0
 */

use super::*;
use std::io::Cursor;
use rand::{thread_rng, Rng};

#[test]
fn test_pcs_cycle_forced_and_cropped() {

    let mut rng = thread_rng();
    let segment = Segment::PresentationComposition(
        PresentationCompositionSegment {
            pts: rng.gen(),
            dts: rng.gen(),
            width: rng.gen(),
            height: rng.gen(),
            frame_rate: 0x30,
            composition_number: rng.gen(),
            composition_state: CompositionState::EpochStart,
            palette_update: false,
            palette_id: rng.gen(),
            composition_objects: vec![
                CompositionObject {
                    object_id: rng.gen(),
                    window_id: rng.gen(),
                    x: rng.gen(),
                    y: rng.gen(),
                    forced: true,
                    crop: None,
                },
                CompositionObject {
                    object_id: rng.gen(),
                    window_id: rng.gen(),
                    x: rng.gen(),
                    y: rng.gen(),
                    forced: false,
                    crop: Some(
                        Crop {
                            x: rng.gen(),
                            y: rng.gen(),
                            width: rng.gen(),
                            height: rng.gen(),
                        }
                    ),
                },
            ],
        }
    );

    cycle(&segment);
}

#[test]
fn test_pcs_keeps_palette_id_without_update() {

    let mut buffer = vec![];
    let segment = Segment::PresentationComposition(
        PresentationCompositionSegment {
            palette_update: false,
            palette_id: 7,
            composition_state: CompositionState::Normal,
            ..Default::default()
        }
    );

    buffer.write_bare_segment(&segment).unwrap();

    // kind, size, width, height, frame rate, number, state, update flag, palette ID
    assert_eq!(buffer[11], 0x00);
    assert_eq!(buffer[12], 7);
    assert_eq!(Cursor::new(buffer).read_bare_segment().unwrap(), segment);
}

#[test]
fn test_pcs_truncated_crop_is_tolerated() {

    let payload = [
        0x07, 0x80, 0x04, 0x38, 0x10, 0x00, 0x01, 0x80, 0x00, 0x00, 0x01,
        0x00, 0x00, 0x00, 0x80, 0x00, 0x10, 0x00, 0x20,
    ];
    let mut buffer = vec![PCS_KIND, 0x00, payload.len() as u8];

    buffer.extend_from_slice(&payload);

    match Cursor::new(buffer).read_bare_segment().unwrap() {
        Segment::PresentationComposition(pcs) => {
            assert_eq!(pcs.width, 1920);
            assert_eq!(pcs.height, 1080);
            assert_eq!(pcs.composition_objects.len(), 1);
            assert_eq!(pcs.composition_objects[0].x, 16);
            assert_eq!(pcs.composition_objects[0].y, 32);
            assert_eq!(pcs.composition_objects[0].crop, None);
        }
        _ => panic!("expected a presentation composition segment"),
    }
}

#[test]
fn test_wds_cycle() {

    let mut rng = thread_rng();
    let segment = Segment::WindowDefinition(
        WindowDefinitionSegment {
            pts: rng.gen(),
            dts: rng.gen(),
            windows: vec![
                WindowDefinition {
                    id: 0,
                    x: rng.gen(),
                    y: rng.gen(),
                    width: rng.gen(),
                    height: rng.gen(),
                },
                WindowDefinition {
                    id: 1,
                    x: rng.gen(),
                    y: rng.gen(),
                    width: rng.gen(),
                    height: rng.gen(),
                },
            ],
        }
    );

    cycle(&segment);
}

#[test]
fn test_pds_cycle() {

    let mut rng = thread_rng();
    let segment = Segment::PaletteDefinition(
        PaletteDefinitionSegment {
            pts: rng.gen(),
            dts: rng.gen(),
            id: rng.gen(),
            version: rng.gen(),
            entries: (0..=255).map(|id|
                PaletteEntry {
                    id,
                    y: rng.gen(),
                    cr: rng.gen(),
                    cb: rng.gen(),
                    alpha: rng.gen(),
                }
            ).collect(),
        }
    );

    cycle(&segment);
}

#[test]
fn test_ods_sequence_cycle() {

    let mut rng = thread_rng();
    let pts = rng.gen();
    let dts = rng.gen();
    let segments = vec![
        Segment::InitialObjectDefinition(
            InitialObjectDefinitionSegment {
                pts,
                dts,
                id: 3,
                version: 1,
                width: 640,
                height: 80,
                length: 10,
                data: vec![1, 2, 3],
            }
        ),
        Segment::MiddleObjectDefinition(
            MiddleObjectDefinitionSegment {
                pts,
                dts,
                id: 3,
                version: 1,
                data: vec![4, 5],
            }
        ),
        Segment::FinalObjectDefinition(
            FinalObjectDefinitionSegment {
                pts,
                dts,
                id: 3,
                version: 1,
                data: vec![6],
            }
        ),
        Segment::SingleObjectDefinition(
            SingleObjectDefinitionSegment {
                pts,
                dts,
                id: 4,
                version: 0,
                width: 2,
                height: 1,
                data: vec![0x01, 0x01, 0x00, 0x00],
            }
        ),
    ];

    for segment in segments.iter() {
        cycle(segment);
    }
}

#[test]
fn test_es_cycle() {

    let mut rng = thread_rng();
    let segment = Segment::End(
        EndSegment {
            pts: rng.gen(),
            dts: rng.gen(),
        }
    );

    cycle(&segment);
}

#[test]
fn test_bare_segment_has_no_timestamps() {

    let mut buffer = vec![];
    let segment = Segment::End(EndSegment { pts: 900, dts: 0 });

    buffer.write_bare_segment(&segment).unwrap();

    assert_eq!(buffer, vec![ES_KIND, 0x00, 0x00]);
    assert_eq!(
        Cursor::new(buffer).read_bare_segment().unwrap(),
        Segment::End(EndSegment { pts: 0, dts: 0 }),
    );
}

#[test]
fn test_unrecognized_magic_number() {

    let buffer = vec![0x50, 0x48, 0, 0, 0, 0, 0, 0, 0, 0, ES_KIND, 0, 0];

    assert!(matches!(
        Cursor::new(buffer).read_segment(),
        Err(ReadError::UnrecognizedMagicNumber),
    ));
}

#[test]
fn test_unrecognized_kind() {

    let buffer = vec![0x42, 0x00, 0x00];

    assert!(matches!(
        Cursor::new(buffer).read_bare_segment(),
        Err(ReadError::UnrecognizedKind(0x42)),
    ));
}

#[test]
fn test_find_epoch_start_skips_by_declared_size() {
    assert_eq!(find_epoch_start(&[0x81, 0x00, 0x02, 0xAA, 0xAA, 0x80, 0x00, 0x00]), Some(5));
}

#[test]
fn test_find_epoch_start_ignores_payload_bytes() {
    assert_eq!(find_epoch_start(&[0x16, 0x00, 0x02, 0x80, 0x80]), None);
}

#[test]
fn test_find_epoch_start_incomplete_segment() {
    assert_eq!(find_epoch_start(&[0x15, 0x01, 0x00, 0x80, 0x00, 0x00]), None);
    assert_eq!(find_epoch_start(&[0x15, 0x00]), None);
    assert_eq!(find_epoch_start(&[]), None);
}

fn cycle(segment: &Segment) {

    let mut buffer = vec![];

    buffer.write_segment(segment).unwrap();

    let mut cursor = Cursor::new(buffer);
    let cycled_segment = cursor.read_segment().unwrap();

    assert_eq!(cycled_segment, *segment);
}
