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
    CompositionObject,
    CompositionState,
    Crop,
    EndSegment,
    FinalObjectDefinitionSegment,
    InitialObjectDefinitionSegment,
    MiddleObjectDefinitionSegment,
    PaletteDefinitionSegment,
    PaletteEntry,
    PresentationCompositionSegment,
    Segment,
    SingleObjectDefinitionSegment,
    WindowDefinition,
    WindowDefinitionSegment,
    ES_KIND,
    ODS_KIND,
    PCS_KIND,
    PDS_KIND,
    WDS_KIND,
};
use std::io::{Cursor, Error as IoError, Read};
use byteorder::{BigEndian, ReadBytesExt};
use thiserror::Error as ThisError;

/// A specialized [`Result`](std::result::Result) type for segment-reading operations.
pub type ReadResult<T> = Result<T, ReadError>;

/// The error type for [ReadSegmentExt].
#[derive(ThisError, Debug)]
pub enum ReadError {
    #[error("segment IO error")]
    IoError {
        #[from]
        source: IoError,
    },
    #[error("segment has unrecognized magic number")]
    UnrecognizedMagicNumber,
    #[error("segment has unrecognized kind 0x{0:02X}")]
    UnrecognizedKind(u8),
    #[error("presentation composition segment has unrecognized composition state")]
    UnrecognizedCompositionState,
    #[error("presentation composition segment has unrecognized palette update flag")]
    UnrecognizedPaletteUpdateFlag,
    #[error("composition object has unrecognized flags")]
    UnrecognizedCompositionObjectFlags,
    #[error("unrecognized object definition sequence flag")]
    UnrecognizedObjectSequenceFlag,
}

/// Allows reading segments from a source.
pub trait ReadSegmentExt {
    /// Reads the next segment using `.sup` framing (`PG`, PTS, DTS, kind, size).
    fn read_segment(&mut self) -> ReadResult<Segment>;
    /// Reads the next segment using Matroska framing (kind, size). Both timestamps are zero.
    fn read_bare_segment(&mut self) -> ReadResult<Segment>;
}

impl<T> ReadSegmentExt for T where
    T: Read,
{

    fn read_segment(&mut self) -> ReadResult<Segment> {

        if self.read_u16::<BigEndian>()? != 0x5047 {
            return Err(ReadError::UnrecognizedMagicNumber)
        }

        let pts = self.read_u32::<BigEndian>()?;
        let dts = self.read_u32::<BigEndian>()?;

        read_body(self, pts, dts)
    }

    fn read_bare_segment(&mut self) -> ReadResult<Segment> {
        read_body(self, 0, 0)
    }
}

fn read_body<T: Read + ?Sized>(input: &mut T, pts: u32, dts: u32) -> ReadResult<Segment> {

    let kind = input.read_u8()?;
    let size = input.read_u16::<BigEndian>()? as usize;
    let mut payload = vec![0u8; size];

    input.read_exact(&mut payload)?;

    Ok(
        match kind {
            PDS_KIND => Segment::PaletteDefinition(parse_pds(pts, dts, &payload)?),
            ODS_KIND => parse_ods(pts, dts, &payload)?,
            PCS_KIND => Segment::PresentationComposition(parse_pcs(pts, dts, &payload)?),
            WDS_KIND => Segment::WindowDefinition(parse_wds(pts, dts, &payload)?),
            ES_KIND => Segment::End(EndSegment { pts, dts }),
            _ => return Err(ReadError::UnrecognizedKind(kind)),
        }
    )
}

fn parse_pcs(
    pts: u32,
    dts: u32,
    payload: &[u8],
) -> ReadResult<PresentationCompositionSegment> {

    let mut pos = 11;
    let mut input = Cursor::new(payload);
    let width = input.read_u16::<BigEndian>()?;
    let height = input.read_u16::<BigEndian>()?;
    let frame_rate = input.read_u8()?;
    let composition_number = input.read_u16::<BigEndian>()?;
    let composition_state = match input.read_u8()? {
        0x00 => CompositionState::Normal,
        0x40 => CompositionState::AcquisitionPoint,
        0x80 => CompositionState::EpochStart,
        _ => return Err(ReadError::UnrecognizedCompositionState),
    };
    let palette_update = match input.read_u8()? {
        0x00 => false,
        0x80 => true,
        _ => return Err(ReadError::UnrecognizedPaletteUpdateFlag),
    };
    let palette_id = input.read_u8()?;
    let comp_obj_count = input.read_u8()? as usize;
    let mut composition_objects = Vec::new();

    for _ in 0..comp_obj_count {
        if payload.len().saturating_sub(pos) >= 8 {

            let object_id = input.read_u16::<BigEndian>()?;
            let window_id = input.read_u8()?;
            let flags = input.read_u8()?;

            if flags & 0x3F != 0 {
                return Err(ReadError::UnrecognizedCompositionObjectFlags)
            }

            let cropped = flags & 0x80 != 0;
            let forced = flags & 0x40 != 0;
            let x = input.read_u16::<BigEndian>()?;
            let y = input.read_u16::<BigEndian>()?;

            pos += 8;

            // For some reason, the U.S. release of Final Fantasy VII: Advent Children Complete
            // declares that the object is cropped, but then the segment's payload ends.
            let crop = if cropped && payload.len() - pos >= 8 {
                pos += 8;
                Some(
                    Crop {
                        x: input.read_u16::<BigEndian>()?,
                        y: input.read_u16::<BigEndian>()?,
                        width: input.read_u16::<BigEndian>()?,
                        height: input.read_u16::<BigEndian>()?,
                    }
                )
            } else {
                None
            };

            composition_objects.push(
                CompositionObject {
                    object_id,
                    window_id,
                    x,
                    y,
                    forced,
                    crop,
                }
            );
        }
    }

    Ok(
        PresentationCompositionSegment {
            pts,
            dts,
            width,
            height,
            frame_rate,
            composition_number,
            composition_state,
            palette_update,
            palette_id,
            composition_objects,
        }
    )
}

fn parse_wds(
    pts: u32,
    dts: u32,
    payload: &[u8],
) -> ReadResult<WindowDefinitionSegment> {

    let mut input = Cursor::new(payload);
    let mut windows = Vec::new();
    let count = input.read_u8()?;

    for _ in 0..count {
        windows.push(
            WindowDefinition {
                id: input.read_u8()?,
                x: input.read_u16::<BigEndian>()?,
                y: input.read_u16::<BigEndian>()?,
                width: input.read_u16::<BigEndian>()?,
                height: input.read_u16::<BigEndian>()?,
            }
        );
    }

    Ok(
        WindowDefinitionSegment {
            pts,
            dts,
            windows,
        }
    )
}

fn parse_pds(
    pts: u32,
    dts: u32,
    payload: &[u8],
) -> ReadResult<PaletteDefinitionSegment> {

    let mut input = Cursor::new(payload);
    let count = payload.len().saturating_sub(2) / 5;
    let id = input.read_u8()?;
    let version = input.read_u8()?;
    let mut entries = Vec::with_capacity(count);

    for _ in 0..count {

        let id = input.read_u8()?;
        let y = input.read_u8()?;
        let cr = input.read_u8()?;
        let cb = input.read_u8()?;
        let alpha = input.read_u8()?;

        entries.push(PaletteEntry { id, y, cr, cb, alpha });
    }

    Ok(
        PaletteDefinitionSegment {
            pts,
            dts,
            id,
            version,
            entries,
        }
    )
}

fn parse_ods(
    pts: u32,
    dts: u32,
    payload: &[u8],
) -> ReadResult<Segment> {

    let mut input = Cursor::new(payload);
    let id = input.read_u16::<BigEndian>()?;
    let version = input.read_u8()?;
    let sequence = input.read_u8()?;

    Ok(
        match sequence {
            0xC0 | 0x80 => {

                let length = input.read_u24::<BigEndian>()? as usize;
                let width = input.read_u16::<BigEndian>()?;
                let height = input.read_u16::<BigEndian>()?;
                let mut data = vec![];

                input.read_to_end(&mut data)?;

                if sequence == 0xC0 {
                    Segment::SingleObjectDefinition(
                        SingleObjectDefinitionSegment {
                            pts,
                            dts,
                            id,
                            version,
                            width,
                            height,
                            data,
                        }
                    )
                } else {
                    Segment::InitialObjectDefinition(
                        InitialObjectDefinitionSegment {
                            pts,
                            dts,
                            id,
                            version,
                            width,
                            height,
                            length,
                            data,
                        }
                    )
                }
            }
            0x00 => {

                let mut data = vec![];

                input.read_to_end(&mut data)?;

                Segment::MiddleObjectDefinition(
                    MiddleObjectDefinitionSegment { pts, dts, id, version, data }
                )
            }
            0x40 => {

                let mut data = vec![];

                input.read_to_end(&mut data)?;

                Segment::FinalObjectDefinition(
                    FinalObjectDefinitionSegment { pts, dts, id, version, data }
                )
            }
            _ => return Err(ReadError::UnrecognizedObjectSequenceFlag),
        }
    )
}
