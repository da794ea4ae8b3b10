/*
 * Copyright 2022 William Swartzendruber
 *
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Subtitle events and the decode session that holds them.


use super::{
    bitmap::Bitmap,
    diagnostic::Diagnostic,
    timing::FrameRate,
};

/// One block of a subtitle track as delivered by a container demuxer.
///
/// Timestamps are in the container's unit, milliseconds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrackBlock {
    pub data: Vec<u8>,
    pub start: i64,
    pub end: i64,
}

impl TrackBlock {
    pub fn new(data: Vec<u8>, start: i64, end: i64) -> Self {
        TrackBlock { data, start, end }
    }
}

/// What every decoded bitmap subtitle exposes, whichever codec it came from.
pub trait BinaryParagraph {
    fn bitmap(&self) -> &Bitmap;
    /// The on-screen position of the bitmap's top-left corner.
    fn position(&self) -> (i32, i32);
    /// Milliseconds.
    fn start_time(&self) -> f64;
    /// Milliseconds.
    fn end_time(&self) -> f64;
    fn is_forced(&self) -> bool;
    fn screen_size(&self) -> (u32, u32);
    fn frame_rate_code(&self) -> u8;
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubtitleEvent {
    /// One-based.
    pub index: u32,
    pub start_ms: f64,
    pub end_ms: f64,
    pub bitmap: Bitmap,
    pub x: i32,
    pub y: i32,
    pub is_forced: bool,
}

impl SubtitleEvent {

    pub fn duration_ms(&self) -> f64 {
        self.end_ms - self.start_ms
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenGeometry {
    pub width: u32,
    pub height: u32,
    pub frame_rate: FrameRate,
}

impl Default for ScreenGeometry {
    fn default() -> Self {
        ScreenGeometry {
            width: 1920,
            height: 1080,
            frame_rate: FrameRate::default(),
        }
    }
}

/// The outcome of decoding one track.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    pub events: Vec<SubtitleEvent>,
    pub geometry: ScreenGeometry,
    pub diagnostics: Vec<Diagnostic>,
}

impl Session {

    /// Builds a session from decoded paragraphs, numbering events from one.
    ///
    /// Screen geometry comes from the first paragraph whose bitmap is larger than one pixel in
    /// both directions. Failing that, the first paragraph's screen is used.
    pub fn from_paragraphs<P>(paragraphs: &[P], diagnostics: Vec<Diagnostic>) -> Self where
        P: BinaryParagraph,
    {

        let geometry_source = paragraphs.iter()
            .find(|paragraph| {
                let (width, height) = paragraph.bitmap().dimensions();
                width > 1 && height > 1
            })
            .or_else(|| paragraphs.first());
        let geometry = match geometry_source {
            Some(paragraph) => {
                let (width, height) = paragraph.screen_size();
                ScreenGeometry {
                    width,
                    height,
                    frame_rate: FrameRate::from_code(paragraph.frame_rate_code()),
                }
            }
            None => ScreenGeometry::default(),
        };
        let events = paragraphs.iter().enumerate().map(|(index, paragraph)| {
            let (x, y) = paragraph.position();
            SubtitleEvent {
                index: index as u32 + 1,
                start_ms: paragraph.start_time(),
                end_ms: paragraph.end_time(),
                bitmap: paragraph.bitmap().clone(),
                x,
                y,
                is_forced: paragraph.is_forced(),
            }
        }).collect::<Vec<SubtitleEvent>>();

        Session {
            events,
            geometry,
            diagnostics,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
