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
    ClutDefinition,
    ObjectData,
    RegionComposition,
    SubtitlePes,
    super::{
        bitmap::{empty_bitmap, Bitmap},
        displayset::PaletteEntry,
        rgb::rgba_pixel,
    },
};
use image::{imageops, Rgba, RgbaImage};

const DEFAULT_SCREEN_WIDTH: u32 = 720;
const DEFAULT_SCREEN_HEIGHT: u32 = 576;

const PIXELS_2_BIT: u8 = 0x10;
const PIXELS_4_BIT: u8 = 0x11;
const PIXELS_8_BIT: u8 = 0x12;
const MAP_2_TO_4: u8 = 0x20;
const MAP_2_TO_8: u8 = 0x21;
const MAP_4_TO_8: u8 = 0x22;
const END_OF_LINE: u8 = 0xF0;

/// A page drawn into a single bitmap.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedPage {
    pub bitmap: Bitmap,
    pub x: i32,
    pub y: i32,
    pub screen_width: u32,
    pub screen_height: u32,
}

/// Draws the first page composition that names any regions.
///
/// Regions the packet does not define are skipped. If none can be drawn the result is a single
/// transparent pixel at the first region's origin.
pub fn render_page(pes: &SubtitlePes) -> Option<RenderedPage> {

    let page = pes.page_compositions.iter().find(|page| !page.regions.is_empty())?;
    let (screen_width, screen_height) = match &pes.display_definition {
        Some(dd) => (dd.width as u32, dd.height as u32),
        None => (DEFAULT_SCREEN_WIDTH, DEFAULT_SCREEN_HEIGHT),
    };
    let mut drawn = vec![];

    for page_region in page.regions.iter() {
        if let Some(region) = pes.region_compositions.iter().find(|rc| rc.id == page_region.id) {
            if region.width > 0 && region.height > 0 {
                drawn.push((page_region.x as u32, page_region.y as u32, draw_region(pes, region)));
            }
        }
    }

    let left = drawn.iter().map(|(x, _, _)| *x).min();
    let top = drawn.iter().map(|(_, y, _)| *y).min();
    let (left, top) = match (left, top) {
        (Some(left), Some(top)) => (left, top),
        _ => {
            return Some(
                RenderedPage {
                    bitmap: empty_bitmap(),
                    x: page.regions[0].x as i32,
                    y: page.regions[0].y as i32,
                    screen_width,
                    screen_height,
                }
            )
        }
    };
    let right = drawn.iter().map(|(x, _, bitmap)| x + bitmap.width()).max().unwrap_or(left);
    let bottom = drawn.iter().map(|(_, y, bitmap)| y + bitmap.height()).max().unwrap_or(top);
    let mut bitmap = RgbaImage::new(right - left, bottom - top);

    for (x, y, region) in drawn.iter() {
        imageops::replace(
            &mut bitmap,
            region,
            (x - left) as i64,
            (y - top) as i64,
        );
    }

    Some(
        RenderedPage {
            bitmap,
            x: left as i32,
            y: top as i32,
            screen_width,
            screen_height,
        }
    )
}

/// Pixel codes of one region, before colour lookup.
struct RegionCanvas {
    width: usize,
    height: usize,
    depth: u8,
    codes: Vec<u8>,
}

impl RegionCanvas {

    fn put_run(&mut self, x: usize, y: usize, run: usize, code: u8) {
        if y < self.height && x < self.width {
            let end = (x + run).min(self.width);
            self.codes[y * self.width + x..y * self.width + end].fill(code);
        }
    }
}

fn draw_region(pes: &SubtitlePes, region: &RegionComposition) -> Bitmap {

    let mut canvas = RegionCanvas {
        width: region.width as usize,
        height: region.height as usize,
        depth: region.depth,
        codes: vec![
            if region.fill { region.fill_code() } else { 0 };
            region.width as usize * region.height as usize
        ],
    };

    for region_object in region.objects.iter().filter(|ro| ro.kind == 0) {
        if let Some(object) = pes.objects.iter().find(|od| od.id == region_object.id) {
            draw_object(&mut canvas, object, region_object.x as usize, region_object.y as usize);
        }
    }

    let clut = build_clut(pes.clut_definitions.iter().find(|cd| cd.id == region.clut_id), region.depth);

    RgbaImage::from_fn(region.width as u32, region.height as u32, |x, y| {
        Rgba(clut[canvas.codes[y as usize * canvas.width + x as usize] as usize])
    })
}

fn draw_object(canvas: &mut RegionCanvas, object: &ObjectData, x: usize, y: usize) {

    if object.coding_method != 0 {
        return
    }

    let bottom = if object.bottom_field.is_empty() {
        &object.top_field
    } else {
        &object.bottom_field
    };

    draw_field(canvas, &object.top_field, x, y);
    draw_field(canvas, bottom, x, y + 1);
}

/// Decodes one interlaced field. Lines advance by two.
fn draw_field(canvas: &mut RegionCanvas, data: &[u8], origin_x: usize, origin_y: usize) {

    let mut map_2_to_4 = [0x0, 0x7, 0x8, 0xF];
    let mut map_2_to_8 = [0x00, 0x77, 0x88, 0xFF];
    let mut map_4_to_8 = [
        0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77,
        0x88, 0x99, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF,
    ];
    let mut x = origin_x;
    let mut y = origin_y;
    let mut position = 0;

    while position < data.len() {

        let kind = data[position];

        position += 1;

        match kind {
            PIXELS_2_BIT | PIXELS_4_BIT | PIXELS_8_BIT => {

                let mut reader = BitReader::new(&data[position..]);
                let runs = match kind {
                    PIXELS_2_BIT => read_2_bit_string(&mut reader),
                    PIXELS_4_BIT => read_4_bit_string(&mut reader),
                    _ => read_8_bit_string(&mut reader),
                };

                position += reader.bytes_read();

                for (code, run) in runs {
                    let code = match (kind, canvas.depth) {
                        (PIXELS_2_BIT, 4) => map_2_to_4[code as usize],
                        (PIXELS_2_BIT, 8) => map_2_to_8[code as usize],
                        (PIXELS_4_BIT, 2) => code >> 2,
                        (PIXELS_4_BIT, 8) => map_4_to_8[code as usize],
                        (PIXELS_8_BIT, 2) => code >> 6,
                        (PIXELS_8_BIT, 4) => code >> 4,
                        _ => code,
                    };
                    canvas.put_run(x, y, run, code);
                    x += run;
                }
            }
            MAP_2_TO_4 => {
                if let Some(table) = data.get(position..position + 2) {
                    map_2_to_4 = [table[0] >> 4, table[0] & 0x0F, table[1] >> 4, table[1] & 0x0F];
                }
                position += 2;
            }
            MAP_2_TO_8 => {
                if let Some(table) = data.get(position..position + 4) {
                    map_2_to_8.copy_from_slice(table);
                }
                position += 4;
            }
            MAP_4_TO_8 => {
                if let Some(table) = data.get(position..position + 16) {
                    map_4_to_8.copy_from_slice(table);
                }
                position += 16;
            }
            END_OF_LINE => {
                x = origin_x;
                y += 2;
            }
            _ => break,
        }
    }
}

/// Reads bits most significant first. Reading past the end yields zeros.
pub(super) struct BitReader<'a> {
    data: &'a [u8],
    position: usize,
    n: u32,
    value: u32,
    exhausted: bool,
}

impl<'a> BitReader<'a> {

    pub(super) fn new(data: &'a [u8]) -> Self {
        BitReader {
            data,
            position: 0,
            n: 0,
            value: 0,
            exhausted: false,
        }
    }

    fn read(&mut self, n: u32) -> u32 {

        while self.n < n {
            match self.data.get(self.position) {
                Some(&byte) => {
                    self.position += 1;
                    self.value = (self.value << 8) | byte as u32;
                    self.n += 8;
                }
                None => {
                    self.exhausted = true;
                    return 0
                }
            }
        }

        let value = self.value >> (self.n - n);

        self.n -= n;
        self.value &= (1 << self.n) - 1;

        value
    }

    /// Whole bytes consumed, counting a partly read byte as consumed.
    pub(super) fn bytes_read(&self) -> usize {
        self.position
    }
}

pub(super) fn read_2_bit_string(reader: &mut BitReader) -> Vec<(u8, usize)> {

    let mut runs = vec![];

    while !reader.exhausted {

        let code = reader.read(2) as u8;

        if code != 0 {
            runs.push((code, 1));
        } else if reader.read(1) == 1 {
            let run = reader.read(3) as usize + 3;
            runs.push((reader.read(2) as u8, run));
        } else if reader.read(1) == 1 {
            runs.push((0, 1));
        } else {
            match reader.read(2) {
                0 => break,
                1 => runs.push((0, 2)),
                2 => {
                    let run = reader.read(4) as usize + 12;
                    runs.push((reader.read(2) as u8, run));
                }
                _ => {
                    let run = reader.read(8) as usize + 29;
                    runs.push((reader.read(2) as u8, run));
                }
            }
        }
    }

    runs
}

pub(super) fn read_4_bit_string(reader: &mut BitReader) -> Vec<(u8, usize)> {

    let mut runs = vec![];

    while !reader.exhausted {

        let code = reader.read(4) as u8;

        if code != 0 {
            runs.push((code, 1));
        } else if reader.read(1) == 0 {
            match reader.read(3) as usize {
                0 => break,
                run => runs.push((0, run + 2)),
            }
        } else if reader.read(1) == 0 {
            let run = reader.read(2) as usize + 4;
            runs.push((reader.read(4) as u8, run));
        } else {
            match reader.read(2) {
                0 => runs.push((0, 1)),
                1 => runs.push((0, 2)),
                2 => {
                    let run = reader.read(4) as usize + 9;
                    runs.push((reader.read(4) as u8, run));
                }
                _ => {
                    let run = reader.read(8) as usize + 25;
                    runs.push((reader.read(4) as u8, run));
                }
            }
        }
    }

    runs
}

pub(super) fn read_8_bit_string(reader: &mut BitReader) -> Vec<(u8, usize)> {

    let mut runs = vec![];

    while !reader.exhausted {

        let code = reader.read(8) as u8;

        if code != 0 {
            runs.push((code, 1));
        } else if reader.read(1) == 0 {
            match reader.read(7) as usize {
                0 => break,
                run => runs.push((0, run)),
            }
        } else {
            let run = reader.read(7) as usize;
            runs.push((reader.read(8) as u8, run));
        }
    }

    runs
}

/// Builds the RGBA lookup table for a region, starting from the default CLUT for its depth.
fn build_clut(definition: Option<&ClutDefinition>, depth: u8) -> Vec<[u8; 4]> {

    let mut clut = default_clut(depth);

    if let Some(definition) = definition {
        for entry in definition.entries.iter() {

            let applies = match depth {
                2 => entry.for_2_bit,
                4 => entry.for_4_bit,
                _ => entry.for_8_bit,
            };

            if applies && (entry.id as usize) < clut.len() {
                clut[entry.id as usize] = if entry.y == 0 {
                    [0, 0, 0, 0]
                } else {
                    rgba_pixel(
                        PaletteEntry {
                            y: entry.y,
                            cr: entry.cr,
                            cb: entry.cb,
                            alpha: 255 - entry.t,
                        }
                    )
                };
            }
        }
    }

    clut
}

/// The CLUTs a decoder assumes before any CLUT definition arrives.
pub fn default_clut(depth: u8) -> Vec<[u8; 4]> {
    match depth {
        2 => vec![[0, 0, 0, 0], [255, 255, 255, 255], [0, 0, 0, 255], [127, 127, 127, 255]],
        4 => (0..16u32).map(|i| {
            let level = if i < 8 { 255 } else { 127 };
            match i {
                0 => [0, 0, 0, 0],
                _ => [
                    if i & 1 != 0 { level } else { 0 },
                    if i & 2 != 0 { level } else { 0 },
                    if i & 4 != 0 { level } else { 0 },
                    255,
                ],
            }
        }).collect(),
        _ => (0..256u32).map(|i| {
            let bits = |low: u32, high: u32, low_level: u32, high_level: u32| {
                (if i & low != 0 { low_level } else { 0 }) + (if i & high != 0 { high_level } else { 0 })
            };
            match i {
                0 => [0, 0, 0, 0],
                1..=7 => [
                    if i & 1 != 0 { 255 } else { 0 },
                    if i & 2 != 0 { 255 } else { 0 },
                    if i & 4 != 0 { 255 } else { 0 },
                    63,
                ],
                _ => {
                    let (base, low_level, high_level, alpha) = match i & 0x88 {
                        0x00 => (0, 85, 170, 255),
                        0x08 => (0, 85, 170, 127),
                        0x80 => (127, 43, 85, 255),
                        _ => (0, 43, 85, 255),
                    };
                    [
                        (base + bits(0x01, 0x10, low_level, high_level)) as u8,
                        (base + bits(0x02, 0x20, low_level, high_level)) as u8,
                        (base + bits(0x04, 0x40, low_level, high_level)) as u8,
                        alpha,
                    ]
                }
            }
        }).collect(),
    }
}
