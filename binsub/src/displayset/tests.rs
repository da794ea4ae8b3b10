/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: CC0-1.0
 */

use super::{
    *,
    super::segment::{
        CompositionState,
        Crop,
        EndSegment,
        FinalObjectDefinitionSegment,
        MiddleObjectDefinitionSegment,
        PresentationCompositionSegment,
        Segment,
        WriteSegmentExt,
    },
};
use std::{
    collections::BTreeMap,
    io::Cursor,
};
use rand::{thread_rng, Rng};

#[test]
fn test_ds_cycle_empty() {

    let mut rng = thread_rng();
    let mut buffer = vec![];
    let display_set = DisplaySet {
        pts: rng.gen(),
        dts: rng.gen(),
        width: rng.gen(),
        height: rng.gen(),
        frame_rate: rng.gen(),
        palette_update: true,
        palette_id: rng.gen(),
        windows: BTreeMap::<u8, Window>::new(),
        palettes: BTreeMap::<Vid<u8>, Palette>::new(),
        objects: BTreeMap::<Vid<u16>, Object>::new(),
        composition: Composition {
            number: rng.gen(),
            state: CompositionState::Normal,
            objects: BTreeMap::<Cid, CompositionObject>::new(),
        },
    };

    buffer.write_display_set(&display_set).unwrap();

    let mut cursor = Cursor::new(buffer);
    let cycled_display_set = cursor.read_display_set().unwrap();

    assert_eq!(cycled_display_set, display_set);
}

#[test]
fn test_ds_cycle_split_object() {

    let mut rng = thread_rng();
    let mut buffer = vec![];
    let mut composition_objects = BTreeMap::<Cid, CompositionObject>::new();
    let mut windows = BTreeMap::<u8, Window>::new();
    let mut palettes = BTreeMap::<Vid<u8>, Palette>::new();
    let mut objects = BTreeMap::<Vid<u16>, Object>::new();

    composition_objects.insert(
        Cid {
            object_id: 1,
            window_id: 0,
        },
        CompositionObject {
            x: rng.gen(),
            y: rng.gen(),
            forced: true,
            crop: Some(
                Crop {
                    x: 4,
                    y: 8,
                    width: 100,
                    height: 50,
                }
            ),
        },
    );
    windows.insert(
        0,
        Window {
            x: rng.gen(),
            y: rng.gen(),
            width: 300,
            height: 300,
        },
    );
    palettes.insert(
        Vid {
            id: 0,
            version: 0,
        },
        Palette {
            entries: (0..=255).map(|id|
                (id, PaletteEntry {
                    y: rng.gen(),
                    cr: rng.gen(),
                    cb: rng.gen(),
                    alpha: rng.gen(),
                })
            ).collect::<BTreeMap<u8, PaletteEntry>>(),
        },
    );
    objects.insert(
        Vid {
            id: 1,
            version: 0,
        },
        Object {
            width: 300,
            height: 300,
            lines: (0..300).map(|_|
                (0..300).map(|_| rng.gen::<u8>()).collect::<Vec<u8>>()
            ).collect::<Vec<Vec<u8>>>(),
        },
    );

    let display_set = DisplaySet {
        pts: rng.gen(),
        dts: rng.gen(),
        width: 1920,
        height: 1080,
        frame_rate: 0x10,
        palette_update: false,
        palette_id: 0,
        windows,
        palettes,
        objects,
        composition: Composition {
            number: rng.gen(),
            state: CompositionState::EpochStart,
            objects: composition_objects,
        },
    };
    let segments = display_set.to_segments();

    assert!(segments.iter().any(|segment|
        matches!(segment, Segment::InitialObjectDefinition(_))
    ));
    assert!(segments.iter().any(|segment|
        matches!(segment, Segment::FinalObjectDefinition(_))
    ));

    buffer.write_bare_display_set(&display_set).unwrap();

    let mut cursor = Cursor::new(buffer);
    let cycled_display_set = cursor.read_bare_display_set().unwrap();

    assert_eq!(cycled_display_set.objects, display_set.objects);
    assert_eq!(cycled_display_set.palettes, display_set.palettes);
    assert_eq!(cycled_display_set.windows, display_set.windows);
    assert_eq!(cycled_display_set.composition, display_set.composition);
}

#[test]
fn test_rle_long_runs() {

    let lines = vec![
        vec![0; 100],
        [vec![7; 200], vec![3, 3, 9]].concat(),
    ];
    let data = rle_compress(&lines);

    assert_eq!(
        data,
        vec![
            0x00, 0x40, 100, 0x00, 0x00,
            0x00, 0xC0, 200, 7, 3, 3, 9, 0x00, 0x00,
        ],
    );
}

#[test]
fn test_rle_splits_runs_longer_than_one_code() {

    let data = rle_compress(&[vec![5; 20_000], vec![0; 16_384]]);

    assert_eq!(
        data,
        vec![
            0x00, 0xFF, 0xFF, 5, 0x00, 0xCE, 0x21, 5, 0x00, 0x00,
            0x00, 0x7F, 0xFF, 0x00, 0x01, 0x00, 0x00,
        ],
    );
}

#[test]
fn test_full_redraw_then_clearing() {

    let placement = Placement {
        x: 100,
        y: 900,
        forced: true,
        palette: Palette {
            entries: [(1, PaletteEntry { y: 235, cr: 128, cb: 128, alpha: 255 })].into_iter().collect(),
        },
        object: Object {
            width: 3,
            height: 1,
            lines: vec![vec![1, 0, 1]],
        },
    };
    let redraw = DisplaySet::full_redraw(9_000, 1920, 1080, 0x30, 4, placement.clone());
    let clearing = redraw.clearing(18_000);

    assert_eq!(redraw.composition.state, CompositionState::EpochStart);
    assert_eq!(redraw.composition.number, 4);
    assert_eq!(redraw.windows[&0], Window { x: 100, y: 900, width: 3, height: 1 });
    assert_eq!(redraw.objects[&Vid { id: 0, version: 0 }], placement.object);
    assert_eq!(redraw.palettes[&Vid { id: 0, version: 0 }], placement.palette);
    assert!(redraw.composition.objects[&Cid { object_id: 0, window_id: 0 }].forced);

    assert_eq!(clearing.pts, 18_000);
    assert_eq!(clearing.composition.number, 5);
    assert_eq!(clearing.composition.state, CompositionState::Normal);
    assert_eq!(clearing.windows, redraw.windows);
    assert!(clearing.composition.objects.is_empty());
    assert!(clearing.palettes.is_empty());
    assert!(clearing.objects.is_empty());

    let mut buffer = vec![];

    buffer.write_display_set(&redraw).unwrap();
    buffer.write_display_set(&clearing).unwrap();

    let mut cursor = Cursor::new(buffer);

    assert_eq!(cursor.read_display_set().unwrap(), redraw);
    assert_eq!(cursor.read_display_set().unwrap(), clearing);
}

#[test]
fn test_read_pads_short_lines() {

    let mut buffer = vec![];

    for segment in [
        Segment::PresentationComposition(PresentationCompositionSegment::default()),
        Segment::SingleObjectDefinition(
            super::super::segment::SingleObjectDefinitionSegment {
                pts: 0,
                dts: 0,
                id: 0,
                version: 0,
                width: 4,
                height: 3,
                data: vec![0x05, 0x00, 0x00, 0x00, 0x83, 0x06, 0x00, 0x00],
            }
        ),
        Segment::End(EndSegment::default()),
    ].iter() {
        buffer.write_bare_segment(segment).unwrap();
    }

    let display_set = Cursor::new(buffer).read_bare_display_set().unwrap();
    let object = &display_set.objects[&Vid { id: 0, version: 0 }];

    assert_eq!(
        object.lines,
        vec![
            vec![5, 0, 0, 0],
            vec![6, 6, 6, 0],
            vec![0, 0, 0, 0],
        ],
    );
}

#[test]
fn test_missing_pcs() {

    let mut buffer = vec![];

    buffer.write_bare_segment(&Segment::End(EndSegment::default())).unwrap();

    assert!(matches!(
        Cursor::new(buffer).read_bare_display_set(),
        Err(ReadError::MissingPresentationCompositionSegment),
    ));
}

#[test]
fn test_orphaned_object_fragment() {

    let mut buffer = vec![];

    for segment in [
        Segment::PresentationComposition(PresentationCompositionSegment::default()),
        Segment::MiddleObjectDefinition(
            MiddleObjectDefinitionSegment {
                pts: 0,
                dts: 0,
                id: 1,
                version: 0,
                data: vec![1],
            }
        ),
        Segment::FinalObjectDefinition(
            FinalObjectDefinitionSegment {
                pts: 0,
                dts: 0,
                id: 1,
                version: 0,
                data: vec![1],
            }
        ),
    ].iter() {
        buffer.write_bare_segment(segment).unwrap();
    }

    assert!(matches!(
        Cursor::new(buffer).read_bare_display_set(),
        Err(ReadError::UnexpectedObjectFragment),
    ));
}

#[test]
fn test_end_of_input() {

    let error = Cursor::new(vec![]).read_display_set().unwrap_err();

    assert!(error.is_end_of_input());
}
