/*
 * Copyright 2022 William Swartzendruber
 *
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

use super::super::{
    bitmap::Bitmap,
    displayset::{DisplaySet, Object, Palette},
    rgb::rgba_pixel,
};
use image::{Rgba, RgbaImage};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

/// The error type for [PgsCache::render].
#[derive(ThisError, Debug, PartialEq)]
pub enum RenderError {
    #[error("composition refers to undefined object {0}")]
    UndefinedObject(u16),
    #[error("composition refers to undefined palette {0}")]
    UndefinedPalette(u8),
    #[error("composition covers no pixels")]
    EmptyComposition,
}

/// A composition flattened into a single bitmap.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedComposition {
    pub bitmap: Bitmap,
    pub x: i32,
    pub y: i32,
    pub forced: bool,
}

struct Placement<'a> {
    object: &'a Object,
    source_x: u32,
    source_y: u32,
    width: u32,
    height: u32,
    x: u32,
    y: u32,
}

/// Palettes and objects carried from one display set to the next.
///
/// A display set may use a palette or object defined by an earlier one. Definitions are keyed
/// by ID; a newer definition under the same ID replaces the older one regardless of version.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PgsCache {
    pub palettes: BTreeMap<u8, Palette>,
    pub objects: BTreeMap<u16, Object>,
}

impl PgsCache {

    /// Takes in every palette and object the display set defines.
    pub fn absorb(&mut self, display_set: &DisplaySet) {

        for (vid, palette) in display_set.palettes.iter() {
            self.palettes.insert(vid.id, palette.clone());
        }

        for (vid, object) in display_set.objects.iter() {
            self.objects.insert(vid.id, object.clone());
        }
    }

    /// Draws the display set's composition, resolving references through the cache.
    ///
    /// Returns `None` for a composition with no objects, which clears the screen.
    pub fn render(
        &self,
        display_set: &DisplaySet,
    ) -> Result<Option<RenderedComposition>, RenderError> {

        if display_set.composition.objects.is_empty() {
            return Ok(None)
        }

        let palette = self.palettes.get(&display_set.palette_id)
            .ok_or(RenderError::UndefinedPalette(display_set.palette_id))?;
        let mut placements = Vec::<Placement>::with_capacity(
            display_set.composition.objects.len()
        );
        let mut forced = false;

        for (cid, co) in display_set.composition.objects.iter() {

            let object = self.objects.get(&cid.object_id)
                .ok_or(RenderError::UndefinedObject(cid.object_id))?;
            let (source_x, source_y, width, height) = match &co.crop {
                Some(crop) => {
                    let x = crop.x.min(object.width) as u32;
                    let y = crop.y.min(object.height) as u32;
                    (
                        x,
                        y,
                        (crop.width as u32).min(object.width as u32 - x),
                        (crop.height as u32).min(object.height as u32 - y),
                    )
                }
                None => (0, 0, object.width as u32, object.height as u32),
            };

            forced |= co.forced;

            if width > 0 && height > 0 {
                placements.push(
                    Placement {
                        object,
                        source_x,
                        source_y,
                        width,
                        height,
                        x: co.x as u32,
                        y: co.y as u32,
                    }
                );
            }
        }

        let left = placements.iter().map(|p| p.x).min().ok_or(RenderError::EmptyComposition)?;
        let top = placements.iter().map(|p| p.y).min().ok_or(RenderError::EmptyComposition)?;
        let right = placements.iter().map(|p| p.x + p.width).max().unwrap_or(left);
        let bottom = placements.iter().map(|p| p.y + p.height).max().unwrap_or(top);
        let mut bitmap = RgbaImage::new(right - left, bottom - top);

        for placement in placements.iter() {
            for row in 0..placement.height {
                for column in 0..placement.width {

                    let index = placement.object.lines
                        .get((placement.source_y + row) as usize)
                        .and_then(|line| line.get((placement.source_x + column) as usize))
                        .copied()
                        .unwrap_or(0);
                    let pixel = match palette.entries.get(&index) {
                        Some(entry) => rgba_pixel(*entry),
                        None => [0, 0, 0, 0],
                    };

                    bitmap.put_pixel(
                        placement.x - left + column,
                        placement.y - top + row,
                        Rgba(pixel),
                    );
                }
            }
        }

        Ok(
            Some(
                RenderedComposition {
                    bitmap,
                    x: left as i32,
                    y: top as i32,
                    forced,
                }
            )
        )
    }
}
