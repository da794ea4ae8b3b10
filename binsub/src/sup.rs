/*
 * Copyright 2022 William Swartzendruber
 *
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Writes subtitle events as a Blu-ray `.sup` stream.
//!
//! # Overview
//!
//! Every event becomes two display sets. The first starts an epoch at the event's start time
//! and redraws the whole bitmap as a single object. The second, at the event's end time,
//! composes nothing and so clears the screen. Nothing is shared between
//! events; each one is drawn from scratch.


use super::{
    bitmap::Bitmap,
    displayset::{
        DisplaySet,
        Object,
        Palette,
        PaletteEntry,
        Placement,
        WriteDisplaySetExt,
        WriteError as DisplaySetWriteError,
    },
    event::{ScreenGeometry, Session, SubtitleEvent},
    progress::{WriteControl, WriteSummary},
    rgb::{closest_palette_entry, rgba_pixel},
    timing::milliseconds_to_ticks,
};
use std::{
    collections::{BTreeMap, HashMap},
    io::{Error as IoError, Write},
};
use thiserror::Error as ThisError;

const TRANSPARENT_INDEX: u8 = 0;
const TRANSPARENT_ENTRY: PaletteEntry = PaletteEntry { y: 16, cr: 128, cb: 128, alpha: 0 };

/// A specialized [`Result`](std::result::Result) type for `.sup` writing operations.
pub type WriteResult<T> = Result<T, WriteError>;

/// The error type for [SupWriter].
#[derive(ThisError, Debug)]
pub enum WriteError {
    #[error("display set write error")]
    DisplaySetError {
        #[from]
        source: DisplaySetWriteError,
    },
    #[error("SUP output IO error")]
    IoError {
        #[from]
        source: IoError,
    },
    /// The bitmap is wider or taller than a PGS object can be.
    #[error("bitmap of {0}x{1} pixels is too large")]
    BitmapTooLarge(u32, u32),
}

/// Writes events to a `.sup` byte stream in order.
pub struct SupWriter<W> {
    output: W,
    control: WriteControl,
}

impl<W> SupWriter<W> where
    W: Write,
{

    pub fn new(output: W) -> Self {
        SupWriter {
            output,
            control: WriteControl::default(),
        }
    }

    pub fn with_control(mut self, control: WriteControl) -> Self {
        self.control = control;
        self
    }

    /// Appends one event.
    pub fn write_event(
        &mut self,
        event: &SubtitleEvent,
        geometry: &ScreenGeometry,
    ) -> WriteResult<()> {

        let [start, end] = event_display_sets(event, geometry)?;

        self.output.write_display_set(&start)?;
        self.output.write_display_set(&end)?;

        Ok(())
    }

    /// Appends every event of a session, checking for cancellation before each one.
    ///
    /// A cancelled write leaves the events already written in the output.
    pub fn write_session(&mut self, session: &Session) -> WriteResult<WriteSummary> {

        let total = session.events.len();
        let mut summary = WriteSummary::default();

        for event in session.events.iter() {

            if self.control.is_cancelled() {
                summary.cancelled = true;
                break
            }

            self.write_event(event, &session.geometry)?;
            summary.written += 1;
            self.control.report(summary.written, total);
        }

        self.output.flush()?;

        log::debug!("wrote {} of {} events as SUP", summary.written, total);

        Ok(summary)
    }

    pub fn into_inner(self) -> W {
        self.output
    }
}

/// Builds the two display sets that show and then clear an event.
pub fn event_display_sets(
    event: &SubtitleEvent,
    geometry: &ScreenGeometry,
) -> WriteResult<[DisplaySet; 2]> {

    let (palette, object) = encode_bitmap(&event.bitmap)?;
    let start = DisplaySet::full_redraw(
        milliseconds_to_ticks(event.start_ms),
        geometry.width.min(u16::MAX as u32) as u16,
        geometry.height.min(u16::MAX as u32) as u16,
        geometry.frame_rate.code(),
        event.index.wrapping_mul(2) as u16,
        Placement {
            x: event.x.clamp(0, u16::MAX as i32) as u16,
            y: event.y.clamp(0, u16::MAX as i32) as u16,
            forced: event.is_forced,
            palette,
            object,
        },
    );
    let end = start.clearing(milliseconds_to_ticks(event.end_ms));

    Ok([start, end])
}

/// Converts a bitmap into a palette and an object of palette indexes.
///
/// Every fully transparent pixel shares entry zero. Other colours get an entry each in order of
/// appearance until the palette is full, after which they take the nearest entry. An empty
/// bitmap becomes a single transparent pixel.
pub fn encode_bitmap(bitmap: &Bitmap) -> WriteResult<(Palette, Object)> {

    let (width, height) = bitmap.dimensions();

    if width > u16::MAX as u32 || height > u16::MAX as u32 {
        return Err(WriteError::BitmapTooLarge(width, height))
    }

    let mut entries = BTreeMap::<u8, PaletteEntry>::new();
    let mut indexes = HashMap::<[u8; 4], u8>::new();
    let mut colours = Vec::<([u8; 4], u8)>::new();

    entries.insert(TRANSPARENT_INDEX, TRANSPARENT_ENTRY);

    if width == 0 || height == 0 {
        return Ok((Palette { entries }, Object { width: 1, height: 1, lines: vec![vec![0]] }))
    }

    let lines = bitmap.rows().map(|row| {
        row.map(|pixel| {

            let pixel = pixel.0;

            if pixel[3] == 0 {
                return TRANSPARENT_INDEX
            }
            if let Some(&index) = indexes.get(&pixel) {
                return index
            }

            let index = if colours.len() < 255 {

                let index = colours.len() as u8 + 1;
                let entry = closest_palette_entry(pixel);

                entries.insert(index, entry);
                colours.push((rgba_pixel(entry), index));

                index
            } else {
                nearest(&colours, pixel)
            };

            indexes.insert(pixel, index);

            index
        }).collect::<Vec<u8>>()
    }).collect::<Vec<Vec<u8>>>();

    Ok(
        (
            Palette { entries },
            Object {
                width: width as u16,
                height: height as u16,
                lines,
            },
        )
    )
}

fn nearest(colours: &[([u8; 4], u8)], pixel: [u8; 4]) -> u8 {
    colours.iter()
        .min_by_key(|(colour, _)| {
            colour.iter().zip(pixel.iter())
                .map(|(&a, &b)| (a as i32 - b as i32).pow(2))
                .sum::<i32>()
        })
        .map_or(TRANSPARENT_INDEX, |&(_, index)| index)
}
