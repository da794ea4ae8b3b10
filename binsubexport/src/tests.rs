/*
 * Copyright 2022 William Swartzendruber
 *
 * Any copyright is dedicated to the Public Domain.
 *
 * SPDX-License-Identifier: CC0-1.0
 */

use super::*;
use binsub::bitmap::Bitmap;

#[test]
fn test_dvb_timing_flags_are_not_offered() {
    assert!(
        app()
            .get_matches_from_safe(vec!["binsubexport", "--max-display-ms", "5000", "in.sup", "out.sup"])
            .is_err()
    );
    assert!(
        app()
            .get_matches_from_safe(vec!["binsubexport", "--min-gap-ms", "24", "in.sup", "out.sup"])
            .is_err()
    );
}

#[test]
fn test_arguments() {

    let matches = app()
        .get_matches_from_safe(vec!["binsubexport", "-t", "Film", "-l", "deu", "in.sup", "out.xml"])
        .unwrap();

    assert_eq!(matches.value_of("title"), Some("Film"));
    assert_eq!(matches.value_of("language"), Some("deu"));
    assert_eq!(matches.value_of("input"), Some("in.sup"));
    assert_eq!(matches.value_of("output"), Some("out.xml"));

    assert!(app().get_matches_from_safe(vec!["binsubexport", "--list", "in.sup"]).is_ok());
    assert!(app().get_matches_from_safe(vec!["binsubexport", "in.sup"]).is_err());
}

#[test]
fn test_bdn_output_detection() {
    assert!(is_bdn_output("out/subtitles.xml"));
    assert!(is_bdn_output("SUBTITLES.XML"));
    assert!(!is_bdn_output("subtitles.sup"));
    assert!(!is_bdn_output("-"));
}

#[test]
fn test_event_line() {

    let event = SubtitleEvent {
        index: 7,
        start_ms: 61_000.0,
        end_ms: 62_500.0,
        bitmap: Bitmap::new(320, 40),
        x: 800,
        y: 960,
        is_forced: true,
    };

    assert_eq!(
        event_line(&event, 25.0),
        "   7  00:01:01:00 --> 00:01:02:13  320x40 at (800, 960)  forced",
    );
}
