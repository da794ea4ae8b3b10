/*
 * Copyright 2022 William Swartzendruber
 *
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Final timing pass applied to every decoded session.
//!
//! Both decoders already correct the timing they reconstruct. This pass only guarantees the
//! invariants writers rely on: events ordered by start, `start <= end`, and no event running
//! into its successor. Anything still overlapping at this point is shortened and reported.


use super::{
    config::Settings,
    diagnostic::{record, Diagnostic},
    event::Session,
};

/// Normalizes the timing of a session's events in place and renumbers them from one.
///
/// A zero-length event is only kept as such when it is the last one. Earlier zero-length or
/// inverted events get the fallback duration, cut short of the next start.
pub fn reconcile(session: &mut Session, settings: &Settings) {

    let events = &mut session.events;

    events.sort_by(|a, b| a.start_ms.total_cmp(&b.start_ms));

    for event in events.iter_mut() {
        if event.start_ms < 0.0 {
            event.start_ms = 0.0;
        }
    }

    let count = events.len();

    for index in 0..count {

        let next_start = events.get(index + 1).map(|next| next.start_ms);
        let event = &mut events[index];

        event.index = index as u32 + 1;

        if event.end_ms < event.start_ms || (event.end_ms == event.start_ms && next_start.is_some()) {
            event.end_ms = match next_start {
                Some(next_start) => {
                    (event.start_ms + settings.fallback_duration_ms).min(next_start - 1.0)
                }
                None => event.start_ms,
            }.max(event.start_ms);
        }

        if let Some(next_start) = next_start {
            if event.end_ms > next_start {

                let original_end = event.end_ms;

                event.end_ms = (next_start - 1.0).max(event.start_ms);
                record(
                    &mut session.diagnostics,
                    Diagnostic::timing_invariant_violation(
                        index,
                        format!(
                            "event {} ended at {} ms, after the next start at {} ms",
                            event.index, original_end, next_start,
                        ),
                    ),
                );
            }
        }
    }

    log::debug!("reconciled {} events", count);
}
