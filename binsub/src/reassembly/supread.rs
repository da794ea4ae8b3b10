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
    PgsCache,
    PgsPicture,
    super::{
        diagnostic::{record, Diagnostic},
        displayset::ReadDisplaySetExt,
    },
};
use std::io::{BufRead, BufReader, Read};

/// Reads a standalone `.sup` stream, which times itself through each segment's PTS.
///
/// A display set with a composition opens a picture at its PTS and the next display set closes
/// it. The last picture of the stream is left open with zero duration. Reading stops at the end
/// of the stream or at the first display set that cannot be read.
pub fn read_sup<R: Read>(input: R) -> (Vec<PgsPicture>, Vec<Diagnostic>) {

    let mut input = BufReader::new(input);
    let mut cache = PgsCache::default();
    let mut pictures = Vec::<PgsPicture>::new();
    let mut diagnostics = vec![];
    let mut position = 0;

    loop {

        match input.fill_buf() {
            Ok(buffer) if buffer.is_empty() => break,
            Ok(_) => { }
            Err(err) => {
                record(&mut diagnostics, Diagnostic::malformed_segment(position, err.to_string()));
                break
            }
        }

        let display_set = match input.read_display_set() {
            Ok(display_set) => display_set,
            Err(err) => {
                record(&mut diagnostics, Diagnostic::malformed_segment(position, err.to_string()));
                break
            }
        };
        let pts = display_set.pts as i64;

        if let Some(last) = pictures.last_mut() {
            if last.start == last.end {
                last.end = pts;
            }
        }

        cache.absorb(&display_set);

        match cache.render(&display_set) {
            Ok(Some(rendered)) => {
                pictures.push(
                    PgsPicture {
                        start: pts,
                        end: pts,
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
                record(&mut diagnostics, Diagnostic::malformed_segment(position, err.to_string()));
            }
        }

        position += 1;
    }

    log::debug!("read {} PGS pictures from {} display sets", pictures.len(), position);

    (pictures, diagnostics)
}
