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
    PaletteEntry,
    Vid,
    Window,
    super::segment::{
        ReadError as SegmentReadError,
        ReadSegmentExt,
        Segment,
    },
};
use std::{
    collections::BTreeMap,
    io::Read,
};
use thiserror::Error as ThisError;

/// A specialized [`Result`](std::result::Result) type for display set-reading operations.
pub type ReadResult<T> = Result<T, ReadError>;

/// The error type for [ReadDisplaySetExt].
#[derive(ThisError, Debug)]
pub enum ReadError {
    #[error("segment value error")]
    SegmentError {
        #[from]
        source: SegmentReadError,
    },
    #[error("first segment is not a presentation composition segment")]
    MissingPresentationCompositionSegment,
    #[error("PTS is not consistent with presentation composition segment")]
    InconsistentPts,
    #[error("DTS is not consistent with presentation composition segment")]
    InconsistentDts,
    #[error("unexpected presentation composition segment within display set")]
    UnexpectedPresentationCompositionSegment,
    #[error("duplicate window ID detected")]
    DuplicateWindowId,
    #[error("duplicate palette ID and version detected")]
    DuplicatePaletteVid,
    #[error("duplicate object ID and version detected")]
    DuplicateObjectVid,
    #[error("object fragment does not continue the object being defined")]
    UnexpectedObjectFragment,
}

impl ReadError {

    /// Returns `true` when the source simply ran out of data.
    pub fn is_end_of_input(&self) -> bool {
        match self {
            ReadError::SegmentError { source: SegmentReadError::IoError { source } } => {
                source.kind() == std::io::ErrorKind::UnexpectedEof
            }
            _ => false,
        }
    }
}

/// Allows reading display sets from a source.
pub trait ReadDisplaySetExt {
    /// Reads the next display set from `.sup` framed segments.
    fn read_display_set(&mut self) -> ReadResult<DisplaySet>;
    /// Reads the next display set from bare (Matroska) segments.
    fn read_bare_display_set(&mut self) -> ReadResult<DisplaySet>;
}

impl<T> ReadDisplaySetExt for T where
    T: Read,
{

    fn read_display_set(&mut self) -> ReadResult<DisplaySet> {
        assemble(|| self.read_segment())
    }

    fn read_bare_display_set(&mut self) -> ReadResult<DisplaySet> {
        assemble(|| self.read_bare_segment())
    }
}

struct PartialObject {
    vid: Vid<u16>,
    width: u16,
    height: u16,
    data: Vec<u8>,
}

fn assemble<F>(mut next_segment: F) -> ReadResult<DisplaySet> where
    F: FnMut() -> Result<Segment, SegmentReadError>,
{

    let mut windows = BTreeMap::<u8, Window>::new();
    let mut palettes = BTreeMap::<Vid<u8>, Palette>::new();
    let mut objects = BTreeMap::<Vid<u16>, Object>::new();
    let mut composition_objects = BTreeMap::<Cid, CompositionObject>::new();
    let mut partial: Option<PartialObject> = None;
    let pcs = match next_segment()? {
        Segment::PresentationComposition(pcs) => pcs,
        _ => return Err(ReadError::MissingPresentationCompositionSegment),
    };
    let pts = pcs.pts;
    let dts = pcs.dts;

    loop {

        let segment = next_segment()?;

        if segment.pts() != pts {
            return Err(ReadError::InconsistentPts)
        }
        if segment.dts() != dts {
            return Err(ReadError::InconsistentDts)
        }

        match segment {
            Segment::PresentationComposition(_) => {
                return Err(ReadError::UnexpectedPresentationCompositionSegment)
            }
            Segment::WindowDefinition(wds) => {
                for wd in wds.windows.iter() {
                    if windows.contains_key(&wd.id) {
                        return Err(ReadError::DuplicateWindowId)
                    }
                    windows.insert(
                        wd.id,
                        Window {
                            x: wd.x,
                            y: wd.y,
                            width: wd.width,
                            height: wd.height,
                        },
                    );
                }
            }
            Segment::PaletteDefinition(pds) => {
                let vid = Vid {
                    id: pds.id,
                    version: pds.version,
                };
                if palettes.contains_key(&vid) {
                    return Err(ReadError::DuplicatePaletteVid)
                }
                palettes.insert(
                    vid,
                    Palette {
                        entries: pds.entries.iter().map(|pe|
                            (pe.id, PaletteEntry {
                                y: pe.y,
                                cr: pe.cr,
                                cb: pe.cb,
                                alpha: pe.alpha,
                            })
                        ).collect::<BTreeMap<u8, PaletteEntry>>()
                    },
                );
            }
            Segment::SingleObjectDefinition(ods) => {
                let vid = Vid {
                    id: ods.id,
                    version: ods.version,
                };
                insert_object(&mut objects, vid, ods.width, ods.height, &ods.data)?;
            }
            Segment::InitialObjectDefinition(ods) => {
                partial = Some(
                    PartialObject {
                        vid: Vid {
                            id: ods.id,
                            version: ods.version,
                        },
                        width: ods.width,
                        height: ods.height,
                        data: ods.data,
                    }
                );
            }
            Segment::MiddleObjectDefinition(ods) => {
                match partial.as_mut() {
                    Some(po) if po.vid.id == ods.id && po.vid.version == ods.version => {
                        po.data.extend_from_slice(&ods.data);
                    }
                    _ => return Err(ReadError::UnexpectedObjectFragment),
                }
            }
            Segment::FinalObjectDefinition(ods) => {
                match partial.take() {
                    Some(mut po) if po.vid.id == ods.id && po.vid.version == ods.version => {
                        po.data.extend_from_slice(&ods.data);
                        insert_object(&mut objects, po.vid, po.width, po.height, &po.data)?;
                    }
                    _ => return Err(ReadError::UnexpectedObjectFragment),
                }
            }
            Segment::End(_) => {
                break
            }
        }
    }

    for co in pcs.composition_objects.iter() {
        composition_objects.insert(
            Cid {
                object_id: co.object_id,
                window_id: co.window_id,
            },
            CompositionObject {
                x: co.x,
                y: co.y,
                forced: co.forced,
                crop: co.crop.clone(),
            },
        );
    }

    Ok(
        DisplaySet {
            pts,
            dts,
            width: pcs.width,
            height: pcs.height,
            frame_rate: pcs.frame_rate,
            palette_update: pcs.palette_update,
            palette_id: pcs.palette_id,
            windows,
            palettes,
            objects,
            composition: Composition {
                number: pcs.composition_number,
                state: pcs.composition_state,
                objects: composition_objects,
            },
        }
    )
}

fn insert_object(
    objects: &mut BTreeMap<Vid<u16>, Object>,
    vid: Vid<u16>,
    width: u16,
    height: u16,
    data: &[u8],
) -> ReadResult<()> {

    if objects.contains_key(&vid) {
        return Err(ReadError::DuplicateObjectVid)
    }

    objects.insert(
        vid,
        Object {
            width,
            height,
            lines: rle_decompress(data, width as usize, height as usize),
        },
    );

    Ok(())
}

/// Expands PGS run-length data into lines of palette indexes.
///
/// Lines are padded or cut to `width` and the result to `height` so that damaged data still
/// yields an object of its declared size.
fn rle_decompress(data: &[u8], width: usize, height: usize) -> Vec<Vec<u8>> {

    let mut lines = Vec::with_capacity(height);
    let mut line = Vec::with_capacity(width);
    let mut input = data.iter().copied();

    while let Some(byte) = input.next() {

        if byte != 0x00 {
            line.push(byte);
            continue
        }

        let flags = match input.next() {
            Some(flags) => flags,
            None => break,
        };

        if flags == 0x00 {
            line.resize(width, 0);
            lines.push(line);
            line = Vec::with_capacity(width);
            continue
        }

        let count = if flags & 0x40 != 0 {
            ((flags as usize & 0x3F) << 8) | input.next().unwrap_or(0) as usize
        } else {
            flags as usize & 0x3F
        };
        let color = if flags & 0x80 != 0 {
            input.next().unwrap_or(0)
        } else {
            0
        };

        line.extend(std::iter::repeat(color).take(count));
    }

    if !line.is_empty() {
        line.resize(width, 0);
        lines.push(line);
    }

    lines.resize(height, vec![0; width]);

    lines
}
