/*
 * Copyright 2022 William Swartzendruber
 *
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

/// Tunables for decoding and export.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// Longest an event closed by a DVB clear marker may stay on screen.
    pub max_display_ms: f64,
    /// Gap left between a DVB event and the one following it.
    pub min_gap_ms: f64,
    /// Duration given to DVB events that are too short or implausibly long.
    pub fallback_duration_ms: f64,
    pub bdn_title: String,
    pub bdn_language: String,
}

impl Settings {

    pub fn with_max_display_ms(mut self, max_display_ms: f64) -> Self {
        self.max_display_ms = max_display_ms;
        self
    }

    pub fn with_min_gap_ms(mut self, min_gap_ms: f64) -> Self {
        self.min_gap_ms = min_gap_ms;
        self
    }

    pub fn with_fallback_duration_ms(mut self, fallback_duration_ms: f64) -> Self {
        self.fallback_duration_ms = fallback_duration_ms;
        self
    }

    pub fn with_bdn_title(mut self, bdn_title: impl Into<String>) -> Self {
        self.bdn_title = bdn_title.into();
        self
    }

    pub fn with_bdn_language(mut self, bdn_language: impl Into<String>) -> Self {
        self.bdn_language = bdn_language.into();
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            max_display_ms: 8_000.0,
            min_gap_ms: 24.0,
            fallback_duration_ms: 3_000.0,
            bdn_title: "subtitle_exp".to_string(),
            bdn_language: "eng".to_string(),
        }
    }
}
