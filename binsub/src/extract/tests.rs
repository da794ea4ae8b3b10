/*
 * SPDX-FileCopyrightText: 2022 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: CC0-1.0
 */

use super::*;
use super::super::{
    diagnostic::DiagnosticKind,
    displayset::WriteDisplaySetExt,
    event::{ScreenGeometry, SubtitleEvent},
    sup::{event_display_sets, SupWriter},
    timing::FrameRate,
};
use image::{Rgba, RgbaImage};
use std::io::Cursor;

/// A page with one 6x6 region at (100, 50) holding a 4x2 object drawn with the default CLUT.
const DVB_PACKET: [u8; 53] = [
    0x0F, 0x10, 0x00, 0x01, 0x00, 0x08,
    0x05, 0x00, 0x00, 0x00, 0x00, 0x64, 0x00, 0x32,
    0x0F, 0x11, 0x00, 0x01, 0x00, 0x10,
    0x00, 0x00, 0x00, 0x06, 0x00, 0x06, 0x48, 0x00, 0x00, 0x00,
    0x00, 0x07, 0x00, 0x01, 0x00, 0x02,
    0x0F, 0x13, 0x00, 0x01, 0x00, 0x0C,
    0x00, 0x07, 0x00, 0x00, 0x05, 0x00, 0x00, 0x11, 0x11, 0x11, 0x00,
];

fn dvb_packet() -> Vec<u8> {
    [&DVB_PACKET[..], &[0xF0]].concat()
}

fn events() -> Vec<SubtitleEvent> {
    (1..=3).map(|index| {
        SubtitleEvent {
            index,
            start_ms: index as f64 * 2_000.0,
            end_ms: index as f64 * 2_000.0 + 1_000.0,
            bitmap: RgbaImage::from_pixel(8, 4, Rgba([255, 255, 255, 255])),
            x: 100,
            y: 800,
            is_forced: false,
        }
    }).collect()
}

fn geometry() -> ScreenGeometry {
    ScreenGeometry {
        width: 1280,
        height: 720,
        frame_rate: FrameRate::Fps24,
    }
}

#[test]
fn test_codec_ids() {
    assert_eq!(TrackCodec::from_codec_id("S_HDMV/PGS"), Ok(TrackCodec::Pgs));
    assert_eq!(TrackCodec::from_codec_id("s_hdmv/pgs"), Ok(TrackCodec::Pgs));
    assert_eq!(TrackCodec::from_codec_id("S_DVBSUB"), Ok(TrackCodec::Dvb));
    assert_eq!(
        TrackCodec::from_codec_id("S_TEXT/UTF8"),
        Err(ExtractError::UnsupportedTrack("S_TEXT/UTF8".to_string())),
    );
}

#[test]
fn test_compressed_track_is_unsupported() {

    let track = TrackInfo {
        codec_id: PGS_CODEC_ID.to_string(),
        compressed: true,
    };

    assert!(matches!(
        decode_matroska_track(&track, &[], &Settings::default()),
        Err(ExtractError::UnsupportedTrack(_)),
    ));
}

#[test]
fn test_empty_track() {
    assert_eq!(
        decode_matroska_track(&TrackInfo::new(DVB_CODEC_ID), &[], &Settings::default()),
        Err(ExtractError::NoSubtitlesFound { diagnostics: vec![] }),
    );
}

#[test]
fn test_no_subtitles_keeps_diagnostics() {

    let blocks = [
        TrackBlock::new(vec![0x0F, 0x10, 0x00, 0x01, 0x00, 0x20, 0x00, 0x00, 0x00, 0x00], 0, 0),
    ];

    match decode_matroska_track(&TrackInfo::new(DVB_CODEC_ID), &blocks, &Settings::default()) {
        Err(ExtractError::NoSubtitlesFound { diagnostics }) => {
            assert_eq!(diagnostics.len(), 1);
            assert_eq!(diagnostics[0].kind, DiagnosticKind::MalformedSegment);
            assert_eq!(diagnostics[0].position, 0);
        }
        other => panic!("expected no subtitles, got {:?}", other),
    }
}

#[test]
fn test_pgs_track() {

    let mut blocks = vec![];

    for event in events().iter() {
        for (display_set, time) in event_display_sets(event, &geometry())
            .unwrap()
            .iter()
            .zip([event.start_ms, event.end_ms])
        {

            let mut data = vec![];
            let timestamp = time as i64 + 1;

            data.write_bare_display_set(display_set).unwrap();
            blocks.push(TrackBlock::new(data, timestamp, timestamp));
        }
    }

    let session = decode_matroska_track(
        &TrackInfo::new(PGS_CODEC_ID),
        &blocks,
        &Settings::default(),
    ).unwrap();

    assert_eq!(session.geometry, geometry());
    assert_eq!(session.events.len(), 3);
    assert!(session.diagnostics.is_empty());

    for (decoded, original) in session.events.iter().zip(events().iter()) {
        assert_eq!(decoded.index, original.index);
        assert_eq!(decoded.start_ms, original.start_ms);
        assert_eq!(decoded.end_ms, original.end_ms);
        assert_eq!((decoded.x, decoded.y), (100, 800));
        assert_eq!(decoded.bitmap, original.bitmap);
    }
}

#[test]
fn test_dvb_track() {

    let blocks = vec![
        TrackBlock::new(dvb_packet(), 1_000, 1_000),
        TrackBlock::new(vec![], 1_050, 1_050),
        TrackBlock::new(vec![0x0F, 0x10], 1_400, 1_400),
        TrackBlock::new(dvb_packet(), 8_000, 8_000),
    ];
    let session = decode_matroska_track(
        &TrackInfo::new("s_dvbsub"),
        &blocks,
        &Settings::default(),
    ).unwrap();

    assert_eq!(session.geometry.width, 720);
    assert_eq!(session.geometry.height, 576);
    assert_eq!(session.geometry.frame_rate, FrameRate::Fps23_976);
    assert_eq!(session.events.len(), 2);
    assert_eq!((session.events[0].start_ms, session.events[0].end_ms), (1_000.0, 1_400.0));
    assert_eq!((session.events[0].x, session.events[0].y), (101, 52));
    assert_eq!(session.events[0].bitmap.dimensions(), (4, 2));
    assert_eq!(session.events[1].index, 2);
}

#[test]
fn test_transport_stream() {

    let session = decode_transport_stream(
        vec![(dvb_packet(), 500), (vec![], 520), (dvb_packet(), 1_000)],
        &Settings::default(),
    ).unwrap();

    assert_eq!(session.events.len(), 2);
    assert_eq!((session.events[0].start_ms, session.events[0].end_ms), (500.0, 976.0));
    assert_eq!((session.events[1].start_ms, session.events[1].end_ms), (1_000.0, 4_000.0));
}

#[test]
fn test_standalone_sup() {

    let session = Session {
        events: events(),
        geometry: geometry(),
        diagnostics: vec![],
    };
    let mut writer = SupWriter::new(vec![]);

    writer.write_session(&session).unwrap();

    let decoded = decode_sup(Cursor::new(writer.into_inner()), &Settings::default()).unwrap();

    assert_eq!(decoded.geometry, geometry());
    assert_eq!(decoded.events.len(), 3);
    assert_eq!(decoded.events[2].start_ms, 6_000.0);
    assert_eq!(decoded.events[2].end_ms, 7_000.0);
}

#[test]
fn test_empty_sup() {
    assert_eq!(
        decode_sup(Cursor::new(vec![]), &Settings::default()).unwrap_err(),
        ExtractError::NoSubtitlesFound { diagnostics: vec![] },
    );
}

#[test]
fn test_damaged_sup_keeps_diagnostics() {

    match decode_sup(Cursor::new(vec![0u8; 13]), &Settings::default()) {
        Err(ExtractError::NoSubtitlesFound { diagnostics }) => {
            assert_eq!(diagnostics.len(), 1);
            assert_eq!(diagnostics[0].kind, DiagnosticKind::MalformedSegment);
        }
        other => panic!("expected no subtitles, got {:?}", other),
    }
}
