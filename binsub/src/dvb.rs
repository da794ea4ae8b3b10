/*
 * Copyright 2022 William Swartzendruber
 *
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Decodes DVB subtitle packets.
//!
//! # Overview
//!
//! Each packet is classified and decoded on its own: a packet may hold bare subtitle segments,
//! a PES wrapped in an MPEG-2 pack header, a private stream 1 PES, or an already unwrapped
//! subtitle data field. Anything else is a clear marker. A decoded packet whose page
//! composition names at least one region becomes a picture; the regions are drawn, trimmed of
//! their transparent border, and placed at the region origin plus the trimmed offset.
//!
//! DVB carries no end times worth trusting, so durations are reconstructed afterward from the
//! gaps between packets.

#[cfg(test)]
mod tests;

mod decoder;
mod pes;
mod render;

pub use decoder::*;
pub use pes::*;
pub use render::*;

use std::io::Error as IoError;
use thiserror::Error as ThisError;

/// A specialized [`Result`](std::result::Result) type for DVB decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// The error type for DVB packet decoding.
#[derive(ThisError, Debug)]
pub enum DecodeError {
    #[error("DVB packet IO error")]
    IoError {
        #[from]
        source: IoError,
    },
    #[error("PES packet is truncated")]
    TruncatedPes,
    #[error("PES packet has no start code")]
    MissingStartCode,
    #[error("unrecognized data identifier 0x{0:02X}")]
    UnrecognizedDataIdentifier(u8),
    #[error("subtitle segment of kind 0x{0:02X} runs past the end of the packet")]
    TruncatedSegment(u8),
}
