/*
 * Copyright 2022 William Swartzendruber
 *
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

use super::{
    Cid,
    Composition,
    CompositionObject,
    DisplaySet,
    Object,
    Palette,
    Vid,
    Window,
    super::segment::{
        CompositionObject as SegmentCompositionObject,
        CompositionState,
        EndSegment,
        FinalObjectDefinitionSegment,
        InitialObjectDefinitionSegment,
        MiddleObjectDefinitionSegment,
        PaletteDefinitionSegment,
        PaletteEntry as SegmentPaletteEntry,
        PresentationCompositionSegment,
        SingleObjectDefinitionSegment,
        WindowDefinition,
        WindowDefinitionSegment,
        WriteError as SegmentWriteError,
        WriteSegmentExt,
        Segment,
    },
};
use std::{
    collections::BTreeMap,
    io::Write,
};
use thiserror::Error as ThisError;

/// Object data that fits behind the length, width, and height of an opening fragment.
const FIRST_FRAGMENT_SIZE: usize = 65_508;
/// Object data that fits into each fragment after the first.
const FRAGMENT_SIZE: usize = 65_515;
/// The longest run one RLE code can carry.
const MAX_RUN: usize = 16_383;

/// A specialized [`Result`](std::result::Result) type for display set-writing operations.
pub type WriteResult<T> = Result<T, WriteError>;

/// The error type for [WriteDisplaySetExt].
#[derive(ThisError, Debug)]
pub enum WriteError {
    #[error("segment value error")]
    SegmentError {
        #[from]
        source: SegmentWriteError,
    },
}

/// Allows writing display sets to a sink.
pub trait WriteDisplaySetExt {
    /// Writes a display set using `.sup` framing.
    fn write_display_set(&mut self, display_set: &DisplaySet) -> WriteResult<()>;
    /// Writes a display set using Matroska framing.
    fn write_bare_display_set(&mut self, display_set: &DisplaySet) -> WriteResult<()>;
}

impl<T> WriteDisplaySetExt for T where
    T: Write,
{

    fn write_display_set(&mut self, display_set: &DisplaySet) -> WriteResult<()> {

        for segment in display_set.to_segments().iter() {
            self.write_segment(segment)?;
        }

        Ok(())
    }

    fn write_bare_display_set(&mut self, display_set: &DisplaySet) -> WriteResult<()> {

        for segment in display_set.to_segments().iter() {
            self.write_bare_segment(segment)?;
        }

        Ok(())
    }
}

/// The one object a full redraw puts on screen, with the palette it is drawn in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Placement {
    pub x: u16,
    pub y: u16,
    pub forced: bool,
    pub palette: Palette,
    pub object: Object,
}

impl DisplaySet {

    /// Builds an epoch start that draws a single object from scratch.
    ///
    /// The window is cut to the object's size and position. Window, palette, and object all
    /// use ID zero at version zero, so nothing from an earlier epoch is referenced.
    pub fn full_redraw(
        pts: u32,
        width: u16,
        height: u16,
        frame_rate: u8,
        number: u16,
        placement: Placement,
    ) -> Self {

        let window = Window {
            x: placement.x,
            y: placement.y,
            width: placement.object.width,
            height: placement.object.height,
        };
        let composition_object = CompositionObject {
            x: placement.x,
            y: placement.y,
            forced: placement.forced,
            crop: None,
        };

        DisplaySet {
            pts,
            dts: 0,
            width,
            height,
            frame_rate,
            palette_update: false,
            palette_id: 0,
            windows: BTreeMap::from([(0, window)]),
            palettes: BTreeMap::from([(Vid { id: 0, version: 0 }, placement.palette)]),
            objects: BTreeMap::from([(Vid { id: 0, version: 0 }, placement.object)]),
            composition: Composition {
                number,
                state: CompositionState::EpochStart,
                objects: BTreeMap::from([(Cid { object_id: 0, window_id: 0 }, composition_object)]),
            },
        }
    }

    /// Builds the display set that takes down whatever this one shows.
    ///
    /// Windows are kept so the decoder knows which area to wipe. The composition number is the
    /// next one along.
    pub fn clearing(&self, pts: u32) -> Self {
        DisplaySet {
            pts,
            dts: self.dts,
            width: self.width,
            height: self.height,
            frame_rate: self.frame_rate,
            palette_update: false,
            palette_id: self.palette_id,
            windows: self.windows.clone(),
            palettes: BTreeMap::new(),
            objects: BTreeMap::new(),
            composition: Composition {
                number: self.composition.number.wrapping_add(1),
                state: CompositionState::Normal,
                objects: BTreeMap::new(),
            },
        }
    }

    /// Lays the display set out as segments: composition, windows, palettes, objects, end.
    pub fn to_segments(&self) -> Vec<Segment> {

        let mut segments = vec![Segment::PresentationComposition(self.composition_segment())];

        if !self.windows.is_empty() {
            segments.push(Segment::WindowDefinition(self.window_segment()));
        }

        segments.extend(
            self.palettes.iter().map(|(vid, palette)|
                Segment::PaletteDefinition(self.palette_segment(*vid, palette))
            )
        );

        for (vid, object) in self.objects.iter() {
            segments.extend(self.object_segments(*vid, object));
        }

        segments.push(Segment::End(EndSegment { pts: self.pts, dts: self.dts }));

        segments
    }

    fn composition_segment(&self) -> PresentationCompositionSegment {
        PresentationCompositionSegment {
            pts: self.pts,
            dts: self.dts,
            width: self.width,
            height: self.height,
            frame_rate: self.frame_rate,
            composition_number: self.composition.number,
            composition_state: self.composition.state,
            palette_update: self.palette_update,
            palette_id: self.palette_id,
            composition_objects: self.composition.objects.iter()
                .map(|(cid, co)| SegmentCompositionObject {
                    object_id: cid.object_id,
                    window_id: cid.window_id,
                    x: co.x,
                    y: co.y,
                    forced: co.forced,
                    crop: co.crop.clone(),
                })
                .collect(),
        }
    }

    fn window_segment(&self) -> WindowDefinitionSegment {
        WindowDefinitionSegment {
            pts: self.pts,
            dts: self.dts,
            windows: self.windows.iter()
                .map(|(&id, window)| WindowDefinition {
                    id,
                    x: window.x,
                    y: window.y,
                    width: window.width,
                    height: window.height,
                })
                .collect(),
        }
    }

    fn palette_segment(&self, vid: Vid<u8>, palette: &Palette) -> PaletteDefinitionSegment {
        PaletteDefinitionSegment {
            pts: self.pts,
            dts: self.dts,
            id: vid.id,
            version: vid.version,
            entries: palette.entries.iter()
                .map(|(&id, entry)| SegmentPaletteEntry {
                    id,
                    y: entry.y,
                    cr: entry.cr,
                    cb: entry.cb,
                    alpha: entry.alpha,
                })
                .collect(),
        }
    }

    /// One segment when the compressed object fits, otherwise an initial fragment, any number
    /// of middle fragments, and a final one.
    fn object_segments(&self, vid: Vid<u16>, object: &Object) -> Vec<Segment> {

        let data = rle_compress(&object.lines);

        if data.len() <= FIRST_FRAGMENT_SIZE {
            return vec![
                Segment::SingleObjectDefinition(
                    SingleObjectDefinitionSegment {
                        pts: self.pts,
                        dts: self.dts,
                        id: vid.id,
                        version: vid.version,
                        width: object.width,
                        height: object.height,
                        data,
                    }
                )
            ]
        }

        let (first, rest) = data.split_at(FIRST_FRAGMENT_SIZE);
        let mut fragments = rest.chunks(FRAGMENT_SIZE).collect::<Vec<&[u8]>>();
        let last = fragments.pop().unwrap_or_default();
        let mut segments = Vec::with_capacity(fragments.len() + 2);

        segments.push(Segment::InitialObjectDefinition(
            InitialObjectDefinitionSegment {
                pts: self.pts,
                dts: self.dts,
                id: vid.id,
                version: vid.version,
                width: object.width,
                height: object.height,
                length: data.len() + 4,
                data: first.to_vec(),
            }
        ));
        segments.extend(
            fragments.iter().map(|fragment|
                Segment::MiddleObjectDefinition(
                    MiddleObjectDefinitionSegment {
                        pts: self.pts,
                        dts: self.dts,
                        id: vid.id,
                        version: vid.version,
                        data: fragment.to_vec(),
                    }
                )
            )
        );
        segments.push(Segment::FinalObjectDefinition(
            FinalObjectDefinitionSegment {
                pts: self.pts,
                dts: self.dts,
                id: vid.id,
                version: vid.version,
                data: last.to_vec(),
            }
        ));

        segments
    }
}

/// Compresses lines of palette indexes using PGS run-length encoding.
///
/// Every line ends with an end-of-line code. Runs longer than one code can carry are written
/// as several codes back to back.
pub fn rle_compress(lines: &[Vec<u8>]) -> Vec<u8> {

    let mut output = Vec::<u8>::new();

    for line in lines.iter() {

        let mut rest = line.as_slice();

        while let Some(&index) = rest.first() {

            let run = rest.iter().take_while(|&&next| next == index).count();
            let mut remaining = run;

            while remaining > 0 {
                let count = remaining.min(MAX_RUN);
                push_code(&mut output, index, count);
                remaining -= count;
            }

            rest = &rest[run..];
        }

        output.extend_from_slice(&[0x00, 0x00]);
    }

    output
}

fn push_code(output: &mut Vec<u8>, index: u8, count: usize) {
    match (index, count) {
        (0x00, 1..=63) => output.extend_from_slice(&[0x00, count as u8]),
        (0x00, _) => output.extend_from_slice(&[0x00, 0x40 | (count >> 8) as u8, count as u8]),
        (_, 1..=2) => output.extend(std::iter::repeat(index).take(count)),
        (_, 3..=63) => output.extend_from_slice(&[0x00, 0x80 | count as u8, index]),
        _ => output.extend_from_slice(&[0x00, 0xC0 | (count >> 8) as u8, count as u8, index]),
    }
}
