/*
 * Copyright 2022 William Swartzendruber
 *
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Reassembles PGS display sets spread across Matroska blocks into subtitle pictures.
//!
//! # Overview
//!
//! Matroska carries PGS as bare segments (kind and size, no `PG` header or timestamps), and a
//! display set may span several blocks. Payloads are accumulated until the buffer holds a
//! segment tagged `0x80`, at which point everything buffered is decoded and the resulting
//! pictures are timed from the block that completed them. Timestamps are kept on the 90 kHz PGS
//! clock.
//!
//! Palettes and objects survive from one decode to the next in a [`PgsCache`], since a display
//! set need not redefine what an earlier one already defined.


mod picture;
mod supread;

pub use picture::*;
pub use supread::*;

use super::{
    bitmap::Bitmap,
    diagnostic::{record, Diagnostic},
    displayset::ReadDisplaySetExt,
    event::{BinaryParagraph, TrackBlock},
    segment::find_epoch_start,
    timing::TICKS_PER_MILLISECOND,
};
use std::io::Cursor;

/// Durations beyond this many ticks when closing an open picture are treated as bogus.
const MAX_CLOSING_DURATION: i64 = 1_000_000;

/// A decoded PGS picture, timed on the 90 kHz clock.
#[derive(Clone, Debug, PartialEq)]
pub struct PgsPicture {
    pub start: i64,
    pub end: i64,
    pub screen_width: u16,
    pub screen_height: u16,
    pub frame_rate: u8,
    pub composition_number: u16,
    pub x: i32,
    pub y: i32,
    pub bitmap: Bitmap,
    pub forced: bool,
}

impl BinaryParagraph for PgsPicture {

    fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    fn start_time(&self) -> f64 {
        self.start as f64 / TICKS_PER_MILLISECOND
    }

    fn end_time(&self) -> f64 {
        self.end as f64 / TICKS_PER_MILLISECOND
    }

    fn is_forced(&self) -> bool {
        self.forced
    }

    fn screen_size(&self) -> (u32, u32) {
        (self.screen_width as u32, self.screen_height as u32)
    }

    fn frame_rate_code(&self) -> u8 {
        self.frame_rate
    }
}

/// A picture along with the container timestamps of the block that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingPicture {
    pub picture: PgsPicture,
    pub block_start: i64,
    pub block_end: i64,
}

/// Everything carried from one Matroska block to the next while decoding a PGS track.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReassemblyState {
    pub cluster_buffer: Vec<u8>,
    pub cache: PgsCache,
    pub pending: Vec<PendingPicture>,
    pub diagnostics: Vec<Diagnostic>,
    blocks: usize,
}

impl ReassemblyState {

    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one block into the state.
    pub fn push_block(mut self, block: &TrackBlock) -> Self {

        let position = self.blocks;

        self.blocks += 1;

        if block.data.len() > 2 {

            self.cluster_buffer.extend_from_slice(&block.data);

            if find_epoch_start(&self.cluster_buffer).is_some() {

                let start = container_to_ticks(block.start);
                let end = container_to_ticks(block.end);

                if let Some(last) = self.pending.last_mut() {
                    if last.picture.start == last.picture.end {
                        last.picture.end = start;
                    }
                }

                let buffer = std::mem::take(&mut self.cluster_buffer);

                for mut picture in decode_bare_display_sets(
                    &buffer,
                    position,
                    &mut self.cache,
                    &mut self.diagnostics,
                ) {

                    picture.start = start;
                    picture.end = end;

                    self.pending.push(
                        PendingPicture {
                            picture,
                            block_start: block.start,
                            block_end: block.end,
                        }
                    );

                    let count = self.pending.len();

                    // Pictures decoded from the same block share its start, so clamping the
                    // earlier one leaves it ending a tick before it starts. The reconciler later
                    // turns that into a zero-length event.
                    if count > 1 {
                        let current_start = self.pending[count - 1].picture.start;
                        let previous = &mut self.pending[count - 2];
                        if previous.block_end > block.start {
                            previous.picture.end = current_start - 1;
                        }
                    }
                }
            }
        } else if let Some(last) = self.pending.last_mut() {
            if last.picture.start == last.picture.end {
                last.picture.end = container_to_ticks(block.start);
                if last.picture.end - last.picture.start > MAX_CLOSING_DURATION {
                    last.picture.end = last.picture.start;
                }
            }
        }

        self
    }

    /// Ends the track, yielding its pictures and diagnostics.
    pub fn finish(self) -> (Vec<PgsPicture>, Vec<Diagnostic>) {
        log::debug!(
            "reassembled {} PGS pictures from {} blocks",
            self.pending.len(),
            self.blocks,
        );
        (
            self.pending.into_iter().map(|pending| pending.picture).collect(),
            self.diagnostics,
        )
    }
}

/// Converts a container timestamp (milliseconds) to the PGS clock, one millisecond early.
fn container_to_ticks(timestamp: i64) -> i64 {
    (timestamp - 1) * TICKS_PER_MILLISECOND as i64
}

/// Decodes every bare display set in a buffer. Pictures come back untimed.
fn decode_bare_display_sets(
    buffer: &[u8],
    position: usize,
    cache: &mut PgsCache,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<PgsPicture> {

    let mut input = Cursor::new(buffer);
    let mut pictures = vec![];

    while (input.position() as usize) < buffer.len() {

        let display_set = match input.read_bare_display_set() {
            Ok(display_set) => display_set,
            Err(err) => {
                record(diagnostics, Diagnostic::malformed_segment(position, err.to_string()));
                break
            }
        };

        log::debug!(
            "decoded display set {} with {} composition objects",
            display_set.composition.number,
            display_set.composition.objects.len(),
        );

        cache.absorb(&display_set);

        match cache.render(&display_set) {
            Ok(Some(rendered)) => {
                pictures.push(
                    PgsPicture {
                        start: 0,
                        end: 0,
                        screen_width: display_set.width,
                        screen_height: display_set.height,
                        frame_rate: display_set.frame_rate,
                        composition_number: display_set.composition.number,
                        x: rendered.x,
                        y: rendered.y,
                        bitmap: rendered.bitmap,
                        forced: rendered.forced,
                    }
                );
            }
            Ok(None) => { }
            Err(err) => {
                record(diagnostics, Diagnostic::malformed_segment(position, err.to_string()));
            }
        }
    }

    pictures
}
