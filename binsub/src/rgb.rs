/*
 * Copyright 2022 William Swartzendruber
 *
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Converts between palette entries (limited-range BT.601 YCbCr plus alpha) and RGBA pixels.


use super::displayset::PaletteEntry;

/// Converts a palette entry into an RGBA pixel. Fully transparent entries become `[0, 0, 0, 0]`.
pub fn rgba_pixel(entry: PaletteEntry) -> [u8; 4] {

    if entry.alpha == 0 {
        return [0, 0, 0, 0]
    }

    let y = expand(entry.y as f64);
    let cb = (entry.cb as f64 - 128.0) / 224.0;
    let cr = (entry.cr as f64 - 128.0) / 224.0;

    [
        quantize(y + 1.402 * cr),
        quantize(y - 0.344136 * cb - 0.714136 * cr),
        quantize(y + 1.772 * cb),
        entry.alpha,
    ]
}

/// Converts an RGBA pixel into a palette entry.
pub fn palette_entry(pixel: [u8; 4]) -> PaletteEntry {

    let red = pixel[0] as f64 / 255.0;
    let green = pixel[1] as f64 / 255.0;
    let blue = pixel[2] as f64 / 255.0;
    let y = 0.299 * red + 0.587 * green + 0.114 * blue;

    PaletteEntry {
        y: compress(y),
        cr: chroma((red - y) / 1.402),
        cb: chroma((blue - y) / 1.772),
        alpha: pixel[3],
    }
}

/// Finds the palette entry that converts back to `pixel` exactly, or as closely as possible.
///
/// Limited-range YCbCr cannot express every RGB colour, so the codes around the direct
/// conversion are searched. Whatever is found is never more than one step off in any colour
/// channel. Alpha is carried over unchanged.
pub fn closest_palette_entry(pixel: [u8; 4]) -> PaletteEntry {

    let direct = palette_entry(pixel);

    if pixel[3] == 0 {
        return direct
    }

    let mut closest = direct;
    let mut closest_distance = distance(rgba_pixel(direct), pixel);

    for dy in -SEARCH_RADIUS..=SEARCH_RADIUS {
        for dcr in -SEARCH_RADIUS..=SEARCH_RADIUS {
            for dcb in -SEARCH_RADIUS..=SEARCH_RADIUS {

                if closest_distance == 0 {
                    return closest
                }

                let candidate = match (step(direct.y, dy), step(direct.cr, dcr), step(direct.cb, dcb)) {
                    (Some(y), Some(cr), Some(cb)) => PaletteEntry { y, cr, cb, alpha: pixel[3] },
                    _ => continue,
                };
                let candidate_distance = distance(rgba_pixel(candidate), pixel);

                if candidate_distance < closest_distance {
                    closest = candidate;
                    closest_distance = candidate_distance;
                }
            }
        }
    }

    closest
}

const SEARCH_RADIUS: i16 = 2;

fn step(code: u8, delta: i16) -> Option<u8> {
    u8::try_from(code as i16 + delta).ok()
}

fn distance(a: [u8; 4], b: [u8; 4]) -> i32 {
    a.iter().zip(b.iter()).take(3).map(|(&a, &b)| (a as i32 - b as i32).pow(2)).sum()
}

fn quantize(value: f64) -> u8 {
    (value * 255.0).max(0.0).min(255.0).round() as u8
}

fn chroma(value: f64) -> u8 {
    (value * 224.0 + 128.0).max(16.0).min(240.0).round() as u8
}

fn compress(value: f64) -> u8 {
    (value * 219.0 + 16.0).max(16.0).min(235.0).round() as u8
}

fn expand(value: f64) -> f64 {
    match value {
        v if v < 16.0 => 0.0,
        v if v > 235.0 => 1.0,
        _ => (value - 16.0) / 219.0,
    }
}
