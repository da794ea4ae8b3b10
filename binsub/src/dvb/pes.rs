/*
 * Copyright 2022 William Swartzendruber
 *
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

use super::{DecodeError, DecodeResult};
use std::io::{Cursor, Read};
use byteorder::{BigEndian, ReadBytesExt};

pub const SYNC_BYTE: u8 = 0x0F;
pub const PAGE_COMPOSITION_SEGMENT: u8 = 0x10;
pub const REGION_COMPOSITION_SEGMENT: u8 = 0x11;
pub const CLUT_DEFINITION_SEGMENT: u8 = 0x12;
pub const OBJECT_DATA_SEGMENT: u8 = 0x13;
pub const DISPLAY_DEFINITION_SEGMENT: u8 = 0x14;
pub const END_OF_DISPLAY_SET_SEGMENT: u8 = 0x80;

const DATA_IDENTIFIER: u8 = 0x20;
const END_OF_DATA_MARKER: u8 = 0xFF;
const MPEG2_PACK_HEADER_LENGTH: usize = 14;

/// How a packet's payload is wrapped.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PacketKind {
    /// Bare subtitle segments starting with the sync byte.
    RawSegments,
    /// A PES behind an MPEG-2 program stream pack header.
    PackHeader,
    /// A private stream 1 PES.
    PrivateStream1,
    /// A subtitle data field (data identifier and stream ID) without PES header.
    DataField,
    /// Nothing decodable. Marks the end of whatever is on screen.
    Clear,
}

/// Works out how a payload is wrapped. The first matching rule wins.
pub fn classify(payload: &[u8]) -> PacketKind {
    if payload.len() > 9
        && payload[0] == SYNC_BYTE
        && (PAGE_COMPOSITION_SEGMENT..=DISPLAY_DEFINITION_SEGMENT).contains(&payload[1])
    {
        PacketKind::RawSegments
    } else if is_mpeg2_pack_header(payload) {
        PacketKind::PackHeader
    } else if is_private_stream_1(payload, 0) {
        PacketKind::PrivateStream1
    } else if payload.len() > 9 && payload[..4] == [0x20, 0x00, 0x0E, 0x10] {
        PacketKind::DataField
    } else {
        PacketKind::Clear
    }
}

fn is_mpeg2_pack_header(buffer: &[u8]) -> bool {
    buffer.len() > 4 && buffer[..4] == [0x00, 0x00, 0x01, 0xBA] && buffer[4] & 0x40 == 0x40
}

fn is_private_stream_1(buffer: &[u8], offset: usize) -> bool {
    buffer.len() >= offset + 4 && buffer[offset..offset + 4] == [0x00, 0x00, 0x01, 0xBD]
}

/// Decodes one packet. A clear marker yields `None`.
pub fn decode_packet(payload: &[u8]) -> DecodeResult<Option<SubtitlePes>> {
    Ok(
        match classify(payload) {
            PacketKind::RawSegments => {

                let mut buffer = vec![0u8; payload.len() + 3];

                buffer[2..payload.len() + 2].copy_from_slice(payload);
                buffer[0] = DATA_IDENTIFIER;
                buffer[1] = 0x00;
                buffer[payload.len() + 2] = END_OF_DATA_MARKER;

                Some(SubtitlePes::from_data_field(&buffer)?)
            }
            PacketKind::PackHeader => {
                Some(SubtitlePes::from_pes(payload, MPEG2_PACK_HEADER_LENGTH)?)
            }
            PacketKind::PrivateStream1 => Some(SubtitlePes::from_pes(payload, 0)?),
            PacketKind::DataField => Some(SubtitlePes::from_data_field(payload)?),
            PacketKind::Clear => None,
        }
    )
}

/// The segments carried by one subtitle PES.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubtitlePes {
    pub stream_id: u8,
    pub page_compositions: Vec<PageComposition>,
    pub region_compositions: Vec<RegionComposition>,
    pub clut_definitions: Vec<ClutDefinition>,
    pub objects: Vec<ObjectData>,
    pub display_definition: Option<DisplayDefinition>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageComposition {
    pub page_id: u16,
    pub timeout: u8,
    pub version: u8,
    pub state: u8,
    pub regions: Vec<PageRegion>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageRegion {
    pub id: u8,
    pub x: u16,
    pub y: u16,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegionComposition {
    pub page_id: u16,
    pub id: u8,
    pub version: u8,
    pub fill: bool,
    pub width: u16,
    pub height: u16,
    /// Bits per pixel: 2, 4, or 8.
    pub depth: u8,
    pub clut_id: u8,
    pub pixel_code_8: u8,
    pub pixel_code_4: u8,
    pub pixel_code_2: u8,
    pub objects: Vec<RegionObject>,
}

impl RegionComposition {

    /// The pixel code the region is filled with, at the region's depth.
    pub fn fill_code(&self) -> u8 {
        match self.depth {
            2 => self.pixel_code_2,
            4 => self.pixel_code_4,
            _ => self.pixel_code_8,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegionObject {
    pub id: u16,
    pub kind: u8,
    pub x: u16,
    pub y: u16,
    pub foreground: Option<u8>,
    pub background: Option<u8>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClutDefinition {
    pub id: u8,
    pub version: u8,
    pub entries: Vec<ClutEntry>,
}

/// A CLUT entry. `t` is transparency, the inverse of alpha.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ClutEntry {
    pub id: u8,
    pub for_2_bit: bool,
    pub for_4_bit: bool,
    pub for_8_bit: bool,
    pub y: u8,
    pub cr: u8,
    pub cb: u8,
    pub t: u8,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectData {
    pub id: u16,
    pub version: u8,
    pub coding_method: u8,
    pub non_modifying_colour: bool,
    pub top_field: Vec<u8>,
    pub bottom_field: Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DisplayDefinition {
    pub version: u8,
    pub width: u16,
    pub height: u16,
}

impl SubtitlePes {

    /// Parses a full PES packet starting at `offset`.
    pub fn from_pes(buffer: &[u8], offset: usize) -> DecodeResult<Self> {

        if buffer.len() < offset + 9 {
            return Err(DecodeError::TruncatedPes)
        }
        if buffer[offset..offset + 3] != [0x00, 0x00, 0x01] {
            return Err(DecodeError::MissingStartCode)
        }

        let header_data_length = buffer[offset + 8] as usize;
        let data_index = offset + 9 + header_data_length;

        if data_index >= buffer.len() {
            return Err(DecodeError::TruncatedPes)
        }

        Self::from_data_field(&buffer[data_index..])
    }

    /// Parses a subtitle data field: data identifier, stream ID, then segments.
    pub fn from_data_field(buffer: &[u8]) -> DecodeResult<Self> {

        if buffer.len() < 2 {
            return Err(DecodeError::TruncatedPes)
        }
        if buffer[0] != DATA_IDENTIFIER {
            return Err(DecodeError::UnrecognizedDataIdentifier(buffer[0]))
        }

        let mut pes = SubtitlePes {
            stream_id: buffer[1],
            ..Default::default()
        };
        let mut position = 2;

        while position + 6 <= buffer.len() && buffer[position] == SYNC_BYTE {

            let kind = buffer[position + 1];
            let page_id = u16::from_be_bytes([buffer[position + 2], buffer[position + 3]]);
            let length = u16::from_be_bytes([buffer[position + 4], buffer[position + 5]]) as usize;
            let end = position + 6 + length;

            if end > buffer.len() {
                return Err(DecodeError::TruncatedSegment(kind))
            }

            let payload = &buffer[position + 6..end];

            match kind {
                PAGE_COMPOSITION_SEGMENT => {
                    pes.page_compositions.push(parse_page_composition(page_id, payload)?);
                }
                REGION_COMPOSITION_SEGMENT => {
                    pes.region_compositions.push(parse_region_composition(page_id, payload)?);
                }
                CLUT_DEFINITION_SEGMENT => {
                    pes.clut_definitions.push(parse_clut_definition(payload)?);
                }
                OBJECT_DATA_SEGMENT => {
                    pes.objects.push(parse_object_data(payload)?);
                }
                DISPLAY_DEFINITION_SEGMENT => {
                    pes.display_definition = Some(parse_display_definition(payload)?);
                }
                _ => { }
            }

            position = end;
        }

        Ok(pes)
    }
}

fn parse_page_composition(page_id: u16, payload: &[u8]) -> DecodeResult<PageComposition> {

    let mut input = Cursor::new(payload);
    let timeout = input.read_u8()?;
    let flags = input.read_u8()?;
    let mut regions = vec![];

    while payload.len() - input.position() as usize >= 6 {

        let id = input.read_u8()?;

        input.read_u8()?;

        regions.push(
            PageRegion {
                id,
                x: input.read_u16::<BigEndian>()?,
                y: input.read_u16::<BigEndian>()?,
            }
        );
    }

    Ok(
        PageComposition {
            page_id,
            timeout,
            version: flags >> 4,
            state: (flags >> 2) & 0x03,
            regions,
        }
    )
}

fn parse_region_composition(page_id: u16, payload: &[u8]) -> DecodeResult<RegionComposition> {

    let mut input = Cursor::new(payload);
    let id = input.read_u8()?;
    let flags = input.read_u8()?;
    let width = input.read_u16::<BigEndian>()?;
    let height = input.read_u16::<BigEndian>()?;
    let depth = match (input.read_u8()? >> 2) & 0x07 {
        1 => 2,
        2 => 4,
        _ => 8,
    };
    let clut_id = input.read_u8()?;
    let pixel_code_8 = input.read_u8()?;
    let codes = input.read_u8()?;
    let mut objects = vec![];

    while payload.len() - input.position() as usize >= 6 {

        let id = input.read_u16::<BigEndian>()?;
        let horizontal = input.read_u16::<BigEndian>()?;
        let vertical = input.read_u16::<BigEndian>()?;
        let kind = (horizontal >> 14) as u8;
        let (foreground, background) = if kind == 0x01 || kind == 0x02 {
            (Some(input.read_u8()?), Some(input.read_u8()?))
        } else {
            (None, None)
        };

        objects.push(
            RegionObject {
                id,
                kind,
                x: horizontal & 0x0FFF,
                y: vertical & 0x0FFF,
                foreground,
                background,
            }
        );
    }

    Ok(
        RegionComposition {
            page_id,
            id,
            version: flags >> 4,
            fill: flags & 0x08 != 0,
            width,
            height,
            depth,
            clut_id,
            pixel_code_8,
            pixel_code_4: codes >> 4,
            pixel_code_2: (codes >> 2) & 0x03,
            objects,
        }
    )
}

fn parse_clut_definition(payload: &[u8]) -> DecodeResult<ClutDefinition> {

    let mut input = Cursor::new(payload);
    let id = input.read_u8()?;
    let version = input.read_u8()? >> 4;
    let mut entries = vec![];

    while payload.len() - input.position() as usize >= 4 {

        let entry_id = input.read_u8()?;
        let flags = input.read_u8()?;
        let (y, cr, cb, t) = if flags & 0x01 != 0 {
            (input.read_u8()?, input.read_u8()?, input.read_u8()?, input.read_u8()?)
        } else {
            let value = input.read_u16::<BigEndian>()?;
            (
                ((value >> 10) as u8) << 2,
                (((value >> 6) & 0x0F) as u8) << 4,
                (((value >> 2) & 0x0F) as u8) << 4,
                ((value & 0x03) as u8) << 6,
            )
        };

        entries.push(
            ClutEntry {
                id: entry_id,
                for_2_bit: flags & 0x80 != 0,
                for_4_bit: flags & 0x40 != 0,
                for_8_bit: flags & 0x20 != 0,
                y,
                cr,
                cb,
                t,
            }
        );
    }

    Ok(ClutDefinition { id, version, entries })
}

fn parse_object_data(payload: &[u8]) -> DecodeResult<ObjectData> {

    let mut input = Cursor::new(payload);
    let id = input.read_u16::<BigEndian>()?;
    let flags = input.read_u8()?;
    let coding_method = (flags >> 2) & 0x03;
    let mut top_field = vec![];
    let mut bottom_field = vec![];

    if coding_method == 0 {

        let top_length = input.read_u16::<BigEndian>()? as usize;
        let bottom_length = input.read_u16::<BigEndian>()? as usize;

        top_field.resize(top_length, 0);
        input.read_exact(&mut top_field)?;
        bottom_field.resize(bottom_length, 0);
        input.read_exact(&mut bottom_field)?;
    }

    Ok(
        ObjectData {
            id,
            version: flags >> 4,
            coding_method,
            non_modifying_colour: flags & 0x02 != 0,
            top_field,
            bottom_field,
        }
    )
}

fn parse_display_definition(payload: &[u8]) -> DecodeResult<DisplayDefinition> {

    let mut input = Cursor::new(payload);
    let version = input.read_u8()? >> 4;
    let width = input.read_u16::<BigEndian>()?.saturating_add(1);
    let height = input.read_u16::<BigEndian>()?.saturating_add(1);

    Ok(DisplayDefinition { version, width, height })
}
