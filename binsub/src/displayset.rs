/*
 * Copyright 2022 William Swartzendruber
 *
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Operates on display sets.
//!
//! # Overview
//!
//! A display set (DS) is a group of segments running from a presentation composition segment
//! (PCS) through the next end segment (ES). Palettes and objects are keyed by ID and version;
//! windows by ID alone. Objects are held decompressed, one `Vec<u8>` of palette indexes per
//! line.
//!
//! A composition may refer to windows, palettes, and objects that an earlier DS defined, so
//! reading a DS does not require those references to be resolvable on their own.

#[cfg(test)]
mod tests;

mod displaysetread;
mod displaysetwrite;

pub use displaysetread::*;
pub use displaysetwrite::*;

use super::segment::{CompositionState, Crop};
use std::collections::BTreeMap;

/// A versioned ID.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Vid<T> {
    pub id: T,
    pub version: u8,
}

/// The composition ID of an object placed into a window.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Cid {
    pub object_id: u16,
    pub window_id: u8,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct DisplaySet {
    pub pts: u32,
    pub dts: u32,
    pub width: u16,
    pub height: u16,
    pub frame_rate: u8,
    pub palette_update: bool,
    pub palette_id: u8,
    pub windows: BTreeMap<u8, Window>,
    pub palettes: BTreeMap<Vid<u8>, Palette>,
    pub objects: BTreeMap<Vid<u16>, Object>,
    pub composition: Composition,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct Window {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct Palette {
    pub entries: BTreeMap<u8, PaletteEntry>,
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct PaletteEntry {
    pub y: u8,
    pub cr: u8,
    pub cb: u8,
    pub alpha: u8,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct Object {
    pub width: u16,
    pub height: u16,
    pub lines: Vec<Vec<u8>>,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct Composition {
    pub number: u16,
    pub state: CompositionState,
    pub objects: BTreeMap<Cid, CompositionObject>,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct CompositionObject {
    pub x: u16,
    pub y: u16,
    pub forced: bool,
    pub crop: Option<Crop>,
}
