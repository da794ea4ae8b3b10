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
    CompositionState,
    PaletteDefinitionSegment,
    PresentationCompositionSegment,
    Segment,
    WindowDefinitionSegment,
    ES_KIND,
    ODS_KIND,
    PCS_KIND,
    PDS_KIND,
    WDS_KIND,
};
use std::io::{
    Error as IoError,
    Write,
};
use byteorder::{BigEndian, WriteBytesExt};
use thiserror::Error as ThisError;

/// A specialized [`Result`](std::result::Result) type for segment-writing operations.
pub type WriteResult<T> = Result<T, WriteError>;

/// The error type for [WriteSegmentExt].
///
/// Errors are caused by either invalid state or by an underlying I/O error.
#[derive(ThisError, Debug)]
pub enum WriteError {
    /// The [`Segment`] could not be written because of an underlying I/O error.
    #[error("segment IO error")]
    IoError {
        /// The underlying I/O error.
        #[from]
        source: IoError,
    },
    /// The [`Segment`] ([`PresentationCompositionSegment`]) being written has more than 255
    /// composition objects.
    #[error("too many composition objects in presentation composition segment")]
    TooManyCompositionObjects,
    /// The [`Segment`] ([`WindowDefinitionSegment`]) being written has more than 255 window
    /// definitions.
    #[error("too many window definitions")]
    TooManyWindowDefinitions,
    /// The [`Segment`] ([`PaletteDefinitionSegment`]) being written has more than 256
    /// entries.
    #[error("too many palette entries")]
    TooManyPaletteEntries,
    /// The [`Segment`] (one of the object definition segments) being written has more than
    /// 16,777,211 compressed bytes of data.
    #[error("object data is too large")]
    ObjectDataTooLarge,
    /// The payload of the [`Segment`] does not fit within 65,535 bytes.
    #[error("segment payload is too large")]
    PayloadTooLarge,
}

/// Allows writing segments to a destination.
pub trait WriteSegmentExt {
    /// Writes a segment using `.sup` framing.
    fn write_segment(&mut self, segment: &Segment) -> WriteResult<()>;
    /// Writes a segment using Matroska framing, omitting the magic number and timestamps.
    fn write_bare_segment(&mut self, segment: &Segment) -> WriteResult<()>;
}

impl<T> WriteSegmentExt for T where
    T: Write,
{

    fn write_segment(&mut self, segment: &Segment) -> WriteResult<()> {

        self.write_u16::<BigEndian>(0x5047)?;
        self.write_u32::<BigEndian>(segment.pts())?;
        self.write_u32::<BigEndian>(segment.dts())?;

        self.write_bare_segment(segment)
    }

    fn write_bare_segment(&mut self, segment: &Segment) -> WriteResult<()> {

        let (kind, payload) = match segment {
            Segment::PresentationComposition(pcs) => (PCS_KIND, generate_pcs(pcs)?),
            Segment::WindowDefinition(wds) => (WDS_KIND, generate_wds(wds)?),
            Segment::PaletteDefinition(pds) => (PDS_KIND, generate_pds(pds)?),
            Segment::SingleObjectDefinition(ods) => {
                (ODS_KIND, generate_ods(
                    ods.id, ods.version, 0xC0, Some((ods.data.len() + 4, ods.width, ods.height)),
                    &ods.data,
                )?)
            }
            Segment::InitialObjectDefinition(ods) => {
                (ODS_KIND, generate_ods(
                    ods.id, ods.version, 0x80, Some((ods.length, ods.width, ods.height)),
                    &ods.data,
                )?)
            }
            Segment::MiddleObjectDefinition(ods) => {
                (ODS_KIND, generate_ods(ods.id, ods.version, 0x00, None, &ods.data)?)
            }
            Segment::FinalObjectDefinition(ods) => {
                (ODS_KIND, generate_ods(ods.id, ods.version, 0x40, None, &ods.data)?)
            }
            Segment::End(_) => (ES_KIND, vec![]),
        };

        if payload.len() > u16::MAX as usize {
            return Err(WriteError::PayloadTooLarge)
        }

        self.write_u8(kind)?;
        self.write_u16::<BigEndian>(payload.len() as u16)?;
        self.write_all(&payload)?;

        Ok(())
    }
}

fn generate_pcs(pcs: &PresentationCompositionSegment) -> WriteResult<Vec<u8>> {

    let mut payload = vec![];

    payload.write_u16::<BigEndian>(pcs.width)?;
    payload.write_u16::<BigEndian>(pcs.height)?;
    payload.write_u8(pcs.frame_rate)?;
    payload.write_u16::<BigEndian>(pcs.composition_number)?;
    payload.write_u8(
        match pcs.composition_state {
            CompositionState::Normal => 0x00,
            CompositionState::AcquisitionPoint => 0x40,
            CompositionState::EpochStart => 0x80,
        }
    )?;
    payload.write_u8(if pcs.palette_update { 0x80 } else { 0x00 })?;
    payload.write_u8(pcs.palette_id)?;

    if pcs.composition_objects.len() <= 255 {
        payload.write_u8(pcs.composition_objects.len() as u8)?;
    } else {
        return Err(WriteError::TooManyCompositionObjects)
    }

    for comp_obj in &pcs.composition_objects {

        let mut flags = 0x00;

        if comp_obj.crop.is_some() {
            flags |= 0x80;
        }
        if comp_obj.forced {
            flags |= 0x40;
        }

        payload.write_u16::<BigEndian>(comp_obj.object_id)?;
        payload.write_u8(comp_obj.window_id)?;
        payload.write_u8(flags)?;
        payload.write_u16::<BigEndian>(comp_obj.x)?;
        payload.write_u16::<BigEndian>(comp_obj.y)?;

        if let Some(crop) = &comp_obj.crop {
            payload.write_u16::<BigEndian>(crop.x)?;
            payload.write_u16::<BigEndian>(crop.y)?;
            payload.write_u16::<BigEndian>(crop.width)?;
            payload.write_u16::<BigEndian>(crop.height)?;
        }
    }

    Ok(payload)
}

fn generate_wds(wds: &WindowDefinitionSegment) -> WriteResult<Vec<u8>> {

    let mut payload = vec![];

    if wds.windows.len() <= 255 {
        payload.write_u8(wds.windows.len() as u8)?;
    } else {
        return Err(WriteError::TooManyWindowDefinitions)
    }

    for window in wds.windows.iter() {
        payload.write_u8(window.id)?;
        payload.write_u16::<BigEndian>(window.x)?;
        payload.write_u16::<BigEndian>(window.y)?;
        payload.write_u16::<BigEndian>(window.width)?;
        payload.write_u16::<BigEndian>(window.height)?;
    }

    Ok(payload)
}

fn generate_pds(pds: &PaletteDefinitionSegment) -> WriteResult<Vec<u8>> {

    let mut payload = vec![];

    if pds.entries.len() > 256 {
        return Err(WriteError::TooManyPaletteEntries)
    }

    payload.write_u8(pds.id)?;
    payload.write_u8(pds.version)?;

    for entry in &pds.entries {
        payload.write_u8(entry.id)?;
        payload.write_u8(entry.y)?;
        payload.write_u8(entry.cr)?;
        payload.write_u8(entry.cb)?;
        payload.write_u8(entry.alpha)?;
    }

    Ok(payload)
}

fn generate_ods(
    id: u16,
    version: u8,
    sequence: u8,
    header: Option<(usize, u16, u16)>,
    data: &[u8],
) -> WriteResult<Vec<u8>> {

    let mut payload = vec![];

    payload.write_u16::<BigEndian>(id)?;
    payload.write_u8(version)?;
    payload.write_u8(sequence)?;

    if let Some((length, width, height)) = header {

        if length <= 16_777_215 {
            payload.write_u24::<BigEndian>(length as u32)?;
        } else {
            return Err(WriteError::ObjectDataTooLarge)
        }

        payload.write_u16::<BigEndian>(width)?;
        payload.write_u16::<BigEndian>(height)?;
    }

    payload.write_all(data)?;

    Ok(payload)
}
