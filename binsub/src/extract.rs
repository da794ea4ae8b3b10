/*
 * Copyright 2022 William Swartzendruber
 *
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Picks the decode path for a subtitle track and turns its blocks into a reconciled session.
//!
//! Demuxing is left to the caller, who hands over a track's blocks in arrival order along with
//! its codec ID. Blocks of one track are decoded strictly in order; separate tracks share no
//! state and may be decoded on separate threads.

#[cfg(test)]
mod tests;

use super::{
    config::Settings,
    diagnostic::Diagnostic,
    dvb::DvbDecodeState,
    event::{BinaryParagraph, Session, TrackBlock},
    reassembly::{read_sup, ReassemblyState},
    reconcile::reconcile,
};
use std::io::Read;
use thiserror::Error as ThisError;

pub const PGS_CODEC_ID: &str = "S_HDMV/PGS";
pub const DVB_CODEC_ID: &str = "S_DVBSUB";

/// A specialized [`Result`](std::result::Result) type for track extraction.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// The error type for track extraction.
#[derive(ThisError, Debug, Eq, PartialEq)]
pub enum ExtractError {
    /// The whole input was read without producing a single event. Whatever was skipped on the
    /// way is kept in `diagnostics`.
    #[error("no subtitles found ({} diagnostics)", .diagnostics.len())]
    NoSubtitlesFound {
        diagnostics: Vec<Diagnostic>,
    },
    /// The track cannot be decoded, either for its codec or for its content encoding.
    #[error("unsupported track: {0}")]
    UnsupportedTrack(String),
}

/// The bitmap subtitle codecs that can be decoded.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TrackCodec {
    Pgs,
    Dvb,
}

impl TrackCodec {

    /// Recognizes a Matroska codec ID, ignoring case.
    pub fn from_codec_id(codec_id: &str) -> ExtractResult<Self> {
        if codec_id.eq_ignore_ascii_case(PGS_CODEC_ID) {
            Ok(TrackCodec::Pgs)
        } else if codec_id.eq_ignore_ascii_case(DVB_CODEC_ID) {
            Ok(TrackCodec::Dvb)
        } else {
            Err(ExtractError::UnsupportedTrack(codec_id.to_string()))
        }
    }
}

/// What the demuxer knows about a subtitle track.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TrackInfo {
    pub codec_id: String,
    /// Whether the track's blocks carry a content encoding that must be undone first.
    pub compressed: bool,
}

impl TrackInfo {
    pub fn new(codec_id: impl Into<String>) -> Self {
        TrackInfo {
            codec_id: codec_id.into(),
            compressed: false,
        }
    }
}

/// Decodes the blocks of one Matroska subtitle track.
pub fn decode_matroska_track<'a, I>(
    track: &TrackInfo,
    blocks: I,
    settings: &Settings,
) -> ExtractResult<Session> where
    I: IntoIterator<Item = &'a TrackBlock>,
{

    let codec = TrackCodec::from_codec_id(&track.codec_id)?;

    if track.compressed {
        return Err(
            ExtractError::UnsupportedTrack(format!("{} with content encoding", track.codec_id))
        )
    }

    log::debug!("decoding {} track", track.codec_id);

    match codec {
        TrackCodec::Pgs => {

            let (pictures, diagnostics) = blocks.into_iter()
                .fold(ReassemblyState::new(), |state, block| state.push_block(block))
                .finish();

            assemble(&pictures, diagnostics, settings)
        }
        TrackCodec::Dvb => decode_dvb(blocks, settings),
    }
}

/// Decodes the DVB subtitle packets of one transport stream PID, each with its timestamp in
/// milliseconds.
pub fn decode_transport_stream<I>(packets: I, settings: &Settings) -> ExtractResult<Session> where
    I: IntoIterator<Item = (Vec<u8>, i64)>,
{

    let blocks = packets.into_iter()
        .map(|(data, timestamp)| TrackBlock::new(data, timestamp, timestamp))
        .collect::<Vec<TrackBlock>>();

    log::debug!("decoding {} transport stream packets", blocks.len());

    decode_dvb(blocks.iter(), settings)
}

/// Decodes a standalone `.sup` stream.
pub fn decode_sup<R: Read>(input: R, settings: &Settings) -> ExtractResult<Session> {

    let (pictures, diagnostics) = read_sup(input);

    assemble(&pictures, diagnostics, settings)
}

fn decode_dvb<'a, I>(blocks: I, settings: &Settings) -> ExtractResult<Session> where
    I: IntoIterator<Item = &'a TrackBlock>,
{

    let (pictures, diagnostics) = blocks.into_iter()
        .fold(DvbDecodeState::new(), |state, block| state.push_packet(block, settings))
        .finish(settings);

    assemble(&pictures, diagnostics, settings)
}

fn assemble<P>(
    paragraphs: &[P],
    diagnostics: Vec<Diagnostic>,
    settings: &Settings,
) -> ExtractResult<Session> where
    P: BinaryParagraph,
{

    let mut session = Session::from_paragraphs(paragraphs, diagnostics);

    reconcile(&mut session, settings);

    log::debug!(
        "session holds {} events at {}x{} with {} diagnostics",
        session.events.len(),
        session.geometry.width,
        session.geometry.height,
        session.diagnostics.len(),
    );

    if session.is_empty() {
        Err(ExtractError::NoSubtitlesFound { diagnostics: session.diagnostics })
    } else {
        Ok(session)
    }
}
