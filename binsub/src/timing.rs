/*
 * Copyright 2022 William Swartzendruber
 *
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Timestamp arithmetic shared by the decoders and writers.
//!
//! PGS timestamps tick at 90 kHz. Container timestamps and event times are milliseconds.


use std::fmt;
use thiserror::Error as ThisError;

/// PGS clock ticks per millisecond.
pub const TICKS_PER_MILLISECOND: f64 = 90.0;

/// A specialized [`Result`](std::result::Result) type for timing operations.
pub type TimingResult<T> = Result<T, TimingError>;

/// The error type for timing operations.
#[derive(ThisError, Debug, PartialEq)]
pub enum TimingError {
    /// A negative or non-finite number of milliseconds was given.
    #[error("invalid millisecond input: {0}")]
    InvalidInput(f64),
}

/// The frame rates a PGS composition can declare.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FrameRate {
    Fps23_976,
    Fps24,
    Fps25,
    Fps29_97,
    Fps30,
    Fps50,
    Fps59_94,
    Fps60,
}

impl FrameRate {

    /// Maps a PGS frame rate code. Unknown codes fall back to 23.976.
    pub fn from_code(code: u8) -> Self {
        match code {
            0x20 => FrameRate::Fps24,
            0x30 => FrameRate::Fps25,
            0x40 => FrameRate::Fps29_97,
            0x50 => FrameRate::Fps30,
            0x60 => FrameRate::Fps50,
            0x70 => FrameRate::Fps59_94,
            0x80 => FrameRate::Fps60,
            _ => FrameRate::Fps23_976,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            FrameRate::Fps23_976 => 0x10,
            FrameRate::Fps24 => 0x20,
            FrameRate::Fps25 => 0x30,
            FrameRate::Fps29_97 => 0x40,
            FrameRate::Fps30 => 0x50,
            FrameRate::Fps50 => 0x60,
            FrameRate::Fps59_94 => 0x70,
            FrameRate::Fps60 => 0x80,
        }
    }

    pub fn fps(&self) -> f64 {
        match self {
            FrameRate::Fps23_976 => 23.976,
            FrameRate::Fps24 => 24.0,
            FrameRate::Fps25 => 25.0,
            FrameRate::Fps29_97 => 29.97,
            FrameRate::Fps30 => 30.0,
            FrameRate::Fps50 => 50.0,
            FrameRate::Fps59_94 => 59.94,
            FrameRate::Fps60 => 60.0,
        }
    }
}

impl Default for FrameRate {
    fn default() -> Self { Self::Fps23_976 }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fps())
    }
}

/// Maps a PGS frame rate code to frames per second.
pub fn map_frame_rate_code(code: u8) -> f64 {
    FrameRate::from_code(code).fps()
}

/// Converts milliseconds into a frame index, rounding to the nearest frame.
///
/// The result never reaches the nominal frame rate, so that a value just short of a whole
/// second stays within that second.
pub fn frames_for_milliseconds(ms: f64, frame_rate: f64) -> TimingResult<u32> {

    if !ms.is_finite() || ms < 0.0 {
        return Err(TimingError::InvalidInput(ms))
    }

    let mut frames = (ms / (1_000.0 / frame_rate)).round();

    if frames >= frame_rate {
        frames = (frame_rate - 0.01).trunc();
    }

    Ok(frames as u32)
}

/// Formats milliseconds as an `HH:MM:SS:FF` timecode.
pub fn format_timecode(ms: f64, frame_rate: f64) -> TimingResult<String> {

    if !ms.is_finite() || ms < 0.0 {
        return Err(TimingError::InvalidInput(ms))
    }

    let total = ms.round() as u64;
    let hours = total / 3_600_000;
    let minutes = total / 60_000 % 60;
    let seconds = total / 1_000 % 60;
    let frames = frames_for_milliseconds((total % 1_000) as f64, frame_rate)?;

    Ok(format!("{:02}:{:02}:{:02}:{:02}", hours, minutes, seconds, frames))
}

/// Converts milliseconds to PGS clock ticks, wrapping like the 32-bit timestamp field.
pub fn milliseconds_to_ticks(ms: f64) -> u32 {
    ((ms.max(0.0) * TICKS_PER_MILLISECOND).round() as u64 & 0xFFFF_FFFF) as u32
}

/// Converts PGS clock ticks to milliseconds.
pub fn ticks_to_milliseconds(ticks: u32) -> f64 {
    ticks as f64 / TICKS_PER_MILLISECOND
}
