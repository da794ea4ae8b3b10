/*
 * Copyright 2022 William Swartzendruber
 *
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Records of problems that were worked around rather than reported as errors.
//!
//! A damaged packet or segment is skipped and decoding carries on; a timing breach found after
//! decoding is corrected in place. Either way a [`Diagnostic`] is kept so that callers (and
//! tests) can see what happened.

use std::fmt;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DiagnosticKind {
    /// A segment or packet failed its own structural checks and was skipped.
    MalformedSegment,
    /// An event still overlapped its successor after decoding and was shortened.
    TimingInvariantViolation,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Zero-based position of the offending block, packet, or event.
    pub position: usize,
    pub message: String,
}

impl Diagnostic {

    pub fn malformed_segment(position: usize, message: impl Into<String>) -> Self {
        Diagnostic {
            kind: DiagnosticKind::MalformedSegment,
            position,
            message: message.into(),
        }
    }

    pub fn timing_invariant_violation(position: usize, message: impl Into<String>) -> Self {
        Diagnostic {
            kind: DiagnosticKind::TimingInvariantViolation,
            position,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            DiagnosticKind::MalformedSegment => "malformed segment",
            DiagnosticKind::TimingInvariantViolation => "timing invariant violation",
        };
        write!(f, "{} at {}: {}", kind, self.position, self.message)
    }
}

/// Logs a diagnostic and appends it to a list.
pub(crate) fn record(diagnostics: &mut Vec<Diagnostic>, diagnostic: Diagnostic) {
    log::warn!("{}", diagnostic);
    diagnostics.push(diagnostic);
}
