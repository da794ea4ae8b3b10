/*
 * Copyright 2022 William Swartzendruber
 *
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Decodes and re-encodes bitmap subtitles.
//!
//! # Overview
//!
//! Two kinds of bitmap subtitle tracks are understood: Presentation Graphics Streams (PGS) as
//! found on Blu-ray discs and in Matroska files, and DVB subtitles as found in transport
//! streams and Matroska files. Either is decoded into a [Session](event::Session) of timed,
//! positioned RGBA bitmaps, whose timing is then made consistent by [reconcile]. A session can
//! be written back out as a `.sup` stream or as BDN XML with PNG images.
//!
//! The [segment] and [displayset] modules work on the PGS bitstream directly and can be used
//! on their own.

#![deny(rustdoc::broken_intra_doc_links)]

pub mod bdn;
pub mod bitmap;
pub mod config;
pub mod diagnostic;
pub mod displayset;
pub mod dvb;
pub mod event;
pub mod extract;
pub mod progress;
pub mod reassembly;
pub mod reconcile;
pub mod rgb;
pub mod segment;
pub mod sup;
pub mod timing;
