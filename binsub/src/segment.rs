/*
 * Copyright 2022 William Swartzendruber
 *
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Operates on individual segments.
//!
//! # Overview
//!
//! A segment is the most fundamental data structure within a PGS bitstream. Multiple segments
//! come together in a well-defined manner to form a display set (DS).
//!
//! There are five types that typically appear in this order:
//!
//! 1. Presentation Composition Segment (PCS)
//! 2. Window Definition Segment (WDS)
//! 3. Palette Definition Segment (PDS)
//! 4. Object Definition Segment (ODS)
//! 5. End Segment (ES)
//!
//! # Framing
//!
//! Two framings are supported. A standalone `.sup` file prefixes every segment with the `PG`
//! magic number followed by its PTS and DTS. Matroska blocks carry bare segments: only the
//! one-byte kind and the two-byte size, with timing supplied by the container instead. The
//! bare reader reports zero for both timestamps.

#[cfg(test)]
mod tests;

mod segmentread;
mod segmentwrite;

pub use segmentread::*;
pub use segmentwrite::*;

/// The kind byte of a Palette Definition Segment.
pub const PDS_KIND: u8 = 0x14;
/// The kind byte of an Object Definition Segment.
pub const ODS_KIND: u8 = 0x15;
/// The kind byte of a Presentation Composition Segment.
pub const PCS_KIND: u8 = 0x16;
/// The kind byte of a Window Definition Segment.
pub const WDS_KIND: u8 = 0x17;
/// The kind byte of an End Segment.
pub const ES_KIND: u8 = 0x80;

/// Represents a PGS segment.
#[derive(Clone, Debug, Hash, PartialEq)]
pub enum Segment {
    /// Represents a Presentation Composition Segment (PCS).
    PresentationComposition(PresentationCompositionSegment),
    /// Represents a Window Definition Segment (WDS).
    WindowDefinition(WindowDefinitionSegment),
    /// Represents a Palette Definition Segment (PDS).
    PaletteDefinition(PaletteDefinitionSegment),
    /// Represents an Object Definition Segment (ODS) holding a complete object.
    SingleObjectDefinition(SingleObjectDefinitionSegment),
    /// Represents the first ODS of an object spread across several segments.
    InitialObjectDefinition(InitialObjectDefinitionSegment),
    /// Represents a continuation ODS of an object spread across several segments.
    MiddleObjectDefinition(MiddleObjectDefinitionSegment),
    /// Represents the last ODS of an object spread across several segments.
    FinalObjectDefinition(FinalObjectDefinitionSegment),
    /// Represents an End Segment (ES).
    End(EndSegment),
}

impl Segment {

    /// The presentation timestamp shared by every segment kind.
    pub fn pts(&self) -> u32 {
        match self {
            Segment::PresentationComposition(pcs) => pcs.pts,
            Segment::WindowDefinition(wds) => wds.pts,
            Segment::PaletteDefinition(pds) => pds.pts,
            Segment::SingleObjectDefinition(ods) => ods.pts,
            Segment::InitialObjectDefinition(ods) => ods.pts,
            Segment::MiddleObjectDefinition(ods) => ods.pts,
            Segment::FinalObjectDefinition(ods) => ods.pts,
            Segment::End(es) => es.pts,
        }
    }

    /// The decoding timestamp shared by every segment kind.
    pub fn dts(&self) -> u32 {
        match self {
            Segment::PresentationComposition(pcs) => pcs.dts,
            Segment::WindowDefinition(wds) => wds.dts,
            Segment::PaletteDefinition(pds) => pds.dts,
            Segment::SingleObjectDefinition(ods) => ods.dts,
            Segment::InitialObjectDefinition(ods) => ods.dts,
            Segment::MiddleObjectDefinition(ods) => ods.dts,
            Segment::FinalObjectDefinition(ods) => ods.dts,
            Segment::End(es) => es.dts,
        }
    }
}

/// Defines the role of a PCS (and thereby the associated DS) within an epoch.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum CompositionState {
    /// Indicates that the associated PCS (and the DS it belongs to) defines the start of a new
    /// epoch. As such, the associated DS should contain all other segments necessary to render
    /// a composition onto the screen.
    EpochStart,
    /// Similar to `EpochStart`, except used to refresh the screen with the current composition.
    AcquisitionPoint,
    /// This updates the composition that is on the screen. This is typically used to clear the
    /// current composition from the screen by defining a PCS with no composition objects,
    /// thereby effectively closing out the current epoch.
    Normal,
}

impl Default for CompositionState {
    fn default() -> Self { Self::EpochStart }
}

/// Defines a Presentation Composition Segment (PCS).
///
/// A PCS marks the beginning of a display set (DS).
#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct PresentationCompositionSegment {
    /// The timestamp indicating when composition decoding should start. In practice, this is
    /// the time at which the composition is displayed. All segments within a DS typically have
    /// identical values here.
    pub pts: u32,
    /// The timestamp indicating when the composition should be displayed. In practice, this
    /// value is always zero.
    pub dts: u32,
    /// The width of the display in pixels. This value should be consistent within a
    /// presentation.
    pub width: u16,
    /// The height of the display in pixels. This value should be consistent within a
    /// presentation.
    pub height: u16,
    /// The frame rate code of the presentation. See [`FrameRate`](crate::timing::FrameRate).
    pub frame_rate: u8,
    pub composition_number: u16,
    pub composition_state: CompositionState,
    /// Set when this DS only updates the palette of the current composition.
    pub palette_update: bool,
    /// The palette the composition objects are drawn with. This is meaningful whether or not
    /// `palette_update` is set.
    pub palette_id: u8,
    pub composition_objects: Vec<CompositionObject>,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct CompositionObject {
    pub object_id: u16,
    pub window_id: u8,
    pub x: u16,
    pub y: u16,
    pub forced: bool,
    pub crop: Option<Crop>,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct Crop {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct WindowDefinitionSegment {
    pub pts: u32,
    pub dts: u32,
    pub windows: Vec<WindowDefinition>,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct WindowDefinition {
    pub id: u8,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct PaletteDefinitionSegment {
    pub pts: u32,
    pub dts: u32,
    pub id: u8,
    pub version: u8,
    pub entries: Vec<PaletteEntry>,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct PaletteEntry {
    pub id: u8,
    pub y: u8,
    pub cr: u8,
    pub cb: u8,
    pub alpha: u8,
}

/// An object small enough to fit within a single segment.
#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct SingleObjectDefinitionSegment {
    pub pts: u32,
    pub dts: u32,
    pub id: u16,
    pub version: u8,
    pub width: u16,
    pub height: u16,
    /// The RLE-compressed pixel data.
    pub data: Vec<u8>,
}

/// The first portion of an object spread across several segments.
#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct InitialObjectDefinitionSegment {
    pub pts: u32,
    pub dts: u32,
    pub id: u16,
    pub version: u8,
    pub width: u16,
    pub height: u16,
    /// The declared size of the complete object's data, plus four for the dimensions.
    pub length: usize,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct MiddleObjectDefinitionSegment {
    pub pts: u32,
    pub dts: u32,
    pub id: u16,
    pub version: u8,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct FinalObjectDefinitionSegment {
    pub pts: u32,
    pub dts: u32,
    pub id: u16,
    pub version: u8,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct EndSegment {
    pub pts: u32,
    pub dts: u32,
}

/// Walks a buffer of bare segments and returns the offset of the first segment whose kind byte
/// is `0x80`.
///
/// Each bare segment occupies its one-byte kind, its two-byte big-endian size, and then `size`
/// bytes of payload. A segment running past the end of the buffer is not yet complete, so the
/// walk stops there and more data must be awaited.
pub fn find_epoch_start(buffer: &[u8]) -> Option<usize> {

    let mut position = 0;

    while position + 3 <= buffer.len() {

        if buffer[position] == ES_KIND {
            return Some(position)
        }

        let size = u16::from_be_bytes([buffer[position + 1], buffer[position + 2]]) as usize;

        position += 3 + size;
    }

    None
}
