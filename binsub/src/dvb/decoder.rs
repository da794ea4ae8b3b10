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
    decode_packet,
    render_page,
    super::{
        bitmap::{trim_transparent_border, Bitmap},
        config::Settings,
        diagnostic::{record, Diagnostic},
        event::{BinaryParagraph, TrackBlock},
    },
};

/// DVB subtitles declare no frame rate; this code maps to the 23.976 default.
pub const DVB_FRAME_RATE_CODE: u8 = 0x10;

/// A clear marker only closes a picture that has been up for less than this.
const CLEAR_MARKER_WINDOW_MS: f64 = 100.0;
/// Pictures shorter than this after all packets are read get the fallback duration.
const MIN_DURATION_MS: f64 = 200.0;

/// A decoded DVB picture, timed in milliseconds.
#[derive(Clone, Debug, PartialEq)]
pub struct DvbPicture {
    pub start: f64,
    pub end: f64,
    pub screen_width: u32,
    pub screen_height: u32,
    pub x: i32,
    pub y: i32,
    pub bitmap: Bitmap,
}

impl BinaryParagraph for DvbPicture {

    fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    fn start_time(&self) -> f64 {
        self.start
    }

    fn end_time(&self) -> f64 {
        self.end
    }

    fn is_forced(&self) -> bool {
        false
    }

    fn screen_size(&self) -> (u32, u32) {
        (self.screen_width, self.screen_height)
    }

    fn frame_rate_code(&self) -> u8 {
        DVB_FRAME_RATE_CODE
    }
}

/// Everything carried from one DVB packet to the next while decoding a track.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DvbDecodeState {
    pub carry_events: Vec<DvbPicture>,
    /// Whether the newest picture is still short enough for a clear marker to close it.
    pub last_event_incomplete: bool,
    pub diagnostics: Vec<Diagnostic>,
    packets: usize,
}

impl DvbDecodeState {

    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one packet into the state. A packet that fails to decode is recorded and skipped.
    pub fn push_packet(mut self, block: &TrackBlock, settings: &Settings) -> Self {

        let position = self.packets;

        self.packets += 1;

        match decode_packet(&block.data) {
            Ok(None) => {
                if self.last_event_incomplete {
                    if let Some(last) = self.carry_events.last_mut() {
                        last.end = block.start as f64;
                        if last.end - last.start > settings.max_display_ms {
                            last.end = last.start + settings.fallback_duration_ms;
                        }
                    }
                }
            }
            Ok(Some(pes)) => {
                if pes.page_compositions.iter().any(|page| !page.regions.is_empty()) {
                    if let Some(page) = render_page(&pes) {

                        let (bitmap, offset_x, offset_y) = trim_transparent_border(&page.bitmap);

                        self.carry_events.push(
                            DvbPicture {
                                start: block.start as f64,
                                end: block.end as f64,
                                screen_width: page.screen_width,
                                screen_height: page.screen_height,
                                x: page.x + offset_x as i32,
                                y: page.y + offset_y as i32,
                                bitmap,
                            }
                        );
                    }
                }
            }
            Err(err) => {
                record(&mut self.diagnostics, Diagnostic::malformed_segment(position, err.to_string()));
            }
        }

        self.last_event_incomplete = self.carry_events.last()
            .map_or(false, |last| last.end - last.start < CLEAR_MARKER_WINDOW_MS);

        self
    }

    /// Ends the track: stretches short pictures, pulls each end back from the next start, and
    /// rounds to whole milliseconds.
    pub fn finish(self, settings: &Settings) -> (Vec<DvbPicture>, Vec<Diagnostic>) {

        let mut pictures = self.carry_events;

        for index in 0..pictures.len() {

            let next_start = pictures.get(index + 1).map(|next| next.start);
            let picture = &mut pictures[index];

            if picture.end - picture.start < MIN_DURATION_MS {
                picture.end = picture.start + settings.fallback_duration_ms;
            }

            if let Some(next_start) = next_start {
                if next_start < picture.end {
                    picture.end = next_start - settings.min_gap_ms;
                }
            }

            picture.start = picture.start.round();
            picture.end = picture.end.round();
        }

        log::debug!("decoded {} DVB pictures from {} packets", pictures.len(), self.packets);

        (pictures, self.diagnostics)
    }
}
