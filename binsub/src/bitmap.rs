/*
 * Copyright 2022 William Swartzendruber
 *
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */


use image::{imageops, RgbaImage};

/// A decoded subtitle image with straight (non-premultiplied) alpha.
pub type Bitmap = RgbaImage;

/// Removes fully transparent rows and columns from every edge of a bitmap.
///
/// Returns the trimmed bitmap together with the number of columns removed from the left and
/// rows removed from the top. Adding those offsets to the bitmap's position keeps its visible
/// content where it was. A bitmap with no visible content comes back unchanged with zero
/// offsets.
pub fn trim_transparent_border(bitmap: &Bitmap) -> (Bitmap, u32, u32) {

    let (width, height) = bitmap.dimensions();
    let row_visible = |y: u32| (0..width).any(|x| bitmap.get_pixel(x, y)[3] != 0);
    let column_visible = |x: u32, top: u32, bottom: u32| {
        (top..bottom).any(|y| bitmap.get_pixel(x, y)[3] != 0)
    };

    let top = match (0..height).find(|&y| row_visible(y)) {
        Some(top) => top,
        None => return (bitmap.clone(), 0, 0),
    };
    let bottom = (top..height).rev().find(|&y| row_visible(y)).unwrap_or(top) + 1;
    let left = (0..width).find(|&x| column_visible(x, top, bottom)).unwrap_or(0);
    let right = (left..width).rev().find(|&x| column_visible(x, top, bottom)).unwrap_or(left) + 1;

    if top == 0 && left == 0 && bottom == height && right == width {
        return (bitmap.clone(), 0, 0)
    }

    let trimmed = imageops::crop_imm(bitmap, left, top, right - left, bottom - top).to_image();

    (trimmed, left, top)
}

/// A single transparent pixel, used where an event has nothing to show.
pub fn empty_bitmap() -> Bitmap {
    RgbaImage::new(1, 1)
}
