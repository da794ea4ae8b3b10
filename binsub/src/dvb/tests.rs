/*
 * SPDX-FileCopyrightText: 2022 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: CC0-1.0
 */

use super::*;
use super::render::{read_2_bit_string, read_8_bit_string, BitReader};
use super::super::{
    config::Settings,
    diagnostic::DiagnosticKind,
    event::TrackBlock,
};
use image::Rgba;

fn segment(kind: u8, payload: &[u8]) -> Vec<u8> {

    let mut buffer = vec![SYNC_BYTE, kind, 0x00, 0x01];

    buffer.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    buffer.extend_from_slice(payload);

    buffer
}

fn page_segment(regions: &[(u8, u16, u16)]) -> Vec<u8> {

    let mut payload = vec![5, 0x00];

    for &(id, x, y) in regions {
        payload.extend_from_slice(&[id, 0x00]);
        payload.extend_from_slice(&x.to_be_bytes());
        payload.extend_from_slice(&y.to_be_bytes());
    }

    segment(PAGE_COMPOSITION_SEGMENT, &payload)
}

/// A 4-bit region holding one object.
fn region_segment(id: u8, width: u16, height: u16, object: (u16, u16, u16)) -> Vec<u8> {

    let mut payload = vec![id, 0x00];

    payload.extend_from_slice(&width.to_be_bytes());
    payload.extend_from_slice(&height.to_be_bytes());
    payload.extend_from_slice(&[(2 << 5) | (2 << 2), 0, 0, 0]);
    payload.extend_from_slice(&object.0.to_be_bytes());
    payload.extend_from_slice(&object.1.to_be_bytes());
    payload.extend_from_slice(&object.2.to_be_bytes());

    segment(REGION_COMPOSITION_SEGMENT, &payload)
}

fn white_clut_segment() -> Vec<u8> {
    segment(CLUT_DEFINITION_SEGMENT, &[0, 0x00, 1, 0x40 | 0x01, 235, 128, 128, 0])
}

/// Two lines of four pixels with code 1, drawn into both fields.
fn object_segment(id: u16) -> Vec<u8> {

    let top = [0x11, 0x11, 0x11, 0x00, 0xF0];
    let mut payload = id.to_be_bytes().to_vec();

    payload.push(0x00);
    payload.extend_from_slice(&(top.len() as u16).to_be_bytes());
    payload.extend_from_slice(&0u16.to_be_bytes());
    payload.extend_from_slice(&top);

    segment(OBJECT_DATA_SEGMENT, &payload)
}

fn raw_packet() -> Vec<u8> {
    [
        page_segment(&[(0, 100, 50)]),
        region_segment(0, 6, 6, (7, 1, 2)),
        white_clut_segment(),
        object_segment(7),
        segment(END_OF_DISPLAY_SET_SEGMENT, &[]),
    ].concat()
}

fn private_stream_1_packet() -> Vec<u8> {

    let mut data = vec![0x20, 0x00];

    data.extend_from_slice(&raw_packet());
    data.push(0xFF);

    let mut packet = vec![0x00, 0x00, 0x01, 0xBD];

    packet.extend_from_slice(&((data.len() + 8) as u16).to_be_bytes());
    packet.extend_from_slice(&[0x81, 0x80, 0x05, 0x21, 0x00, 0x01, 0x00, 0x01]);
    packet.extend_from_slice(&data);

    packet
}

fn block(data: Vec<u8>, start: i64, end: i64) -> TrackBlock {
    TrackBlock::new(data, start, end)
}

#[test]
fn test_classify_raw_segments() {
    assert_eq!(classify(&raw_packet()), PacketKind::RawSegments);
}

#[test]
fn test_classify_data_field() {
    assert_eq!(classify(&[32, 0, 14, 16, 0, 0, 0, 0, 0, 0, 0]), PacketKind::DataField);
}

#[test]
fn test_classify_pes_wrappers() {

    let mut pack = vec![0x00, 0x00, 0x01, 0xBA, 0x44, 0, 0, 0, 0, 0, 0, 0, 0, 0];

    pack.extend_from_slice(&private_stream_1_packet());

    assert_eq!(classify(&pack), PacketKind::PackHeader);
    assert_eq!(classify(&private_stream_1_packet()), PacketKind::PrivateStream1);
}

#[test]
fn test_classify_clear_marker() {
    assert_eq!(classify(&[]), PacketKind::Clear);
    assert_eq!(classify(&[1, 2, 3]), PacketKind::Clear);
    assert_eq!(classify(&[SYNC_BYTE, PAGE_COMPOSITION_SEGMENT, 0, 1]), PacketKind::Clear);
}

#[test]
fn test_decode_raw_segments() {

    let pes = decode_packet(&raw_packet()).unwrap().unwrap();

    assert_eq!(pes.page_compositions.len(), 1);
    assert_eq!(pes.page_compositions[0].timeout, 5);
    assert_eq!(pes.page_compositions[0].regions, vec![PageRegion { id: 0, x: 100, y: 50 }]);
    assert_eq!(pes.region_compositions[0].depth, 4);
    assert_eq!(pes.region_compositions[0].objects[0].id, 7);
    assert_eq!((pes.region_compositions[0].objects[0].x, pes.region_compositions[0].objects[0].y), (1, 2));
    assert_eq!(pes.clut_definitions[0].entries[0].y, 235);
    assert!(pes.clut_definitions[0].entries[0].for_4_bit);
    assert_eq!(pes.objects[0].top_field.len(), 5);
    assert!(pes.objects[0].bottom_field.is_empty());
    assert_eq!(pes.display_definition, None);
}

#[test]
fn test_decode_wrapped_packets_agree() {

    let raw = decode_packet(&raw_packet()).unwrap();
    let mut pack = vec![0x00, 0x00, 0x01, 0xBA, 0x44, 0, 0, 0, 0, 0, 0, 0, 0, 0];

    pack.extend_from_slice(&private_stream_1_packet());

    assert_eq!(decode_packet(&private_stream_1_packet()).unwrap(), raw);
    assert_eq!(decode_packet(&pack).unwrap(), raw);
}

#[test]
fn test_decode_clear_marker() {
    assert_eq!(decode_packet(&[0xAB; 4]).unwrap(), None);
}

#[test]
fn test_truncated_segment() {

    let mut packet = raw_packet();

    packet.truncate(20);

    assert!(matches!(decode_packet(&packet), Err(DecodeError::TruncatedSegment(_))));
}

#[test]
fn test_render_page() {

    let pes = decode_packet(&raw_packet()).unwrap().unwrap();
    let page = render_page(&pes).unwrap();

    assert_eq!((page.x, page.y), (100, 50));
    assert_eq!((page.screen_width, page.screen_height), (720, 576));
    assert_eq!(page.bitmap.dimensions(), (6, 6));
    assert_eq!(page.bitmap.get_pixel(1, 2), &Rgba([255, 255, 255, 255]));
    assert_eq!(page.bitmap.get_pixel(4, 3), &Rgba([255, 255, 255, 255]));
    assert_eq!(page.bitmap.get_pixel(0, 2), &Rgba([0, 0, 0, 0]));
    assert_eq!(page.bitmap.get_pixel(1, 4), &Rgba([0, 0, 0, 0]));
}

#[test]
fn test_render_uses_default_clut() {

    let packet = [
        page_segment(&[(0, 0, 0)]),
        region_segment(0, 4, 2, (7, 0, 0)),
        object_segment(7),
    ].concat();
    let page = render_page(&decode_packet(&packet).unwrap().unwrap()).unwrap();

    assert_eq!(page.bitmap.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
}

#[test]
fn test_render_honours_display_definition() {

    let mut display = vec![0x00];

    display.extend_from_slice(&1919u16.to_be_bytes());
    display.extend_from_slice(&1079u16.to_be_bytes());

    let packet = [segment(DISPLAY_DEFINITION_SEGMENT, &display), raw_packet()].concat();
    let pes = decode_packet(&packet).unwrap().unwrap();
    let page = render_page(&pes).unwrap();

    assert_eq!(pes.display_definition, Some(DisplayDefinition { version: 0, width: 1920, height: 1080 }));
    assert_eq!((page.screen_width, page.screen_height), (1920, 1080));
}

#[test]
fn test_2_bit_string() {

    let data = [0x4B, 0x84, 0x00, 0xF0];
    let mut reader = BitReader::new(&data);

    assert_eq!(read_2_bit_string(&mut reader), vec![(1, 1), (2, 6), (0, 1)]);
    assert_eq!(reader.bytes_read(), 3);
}

#[test]
fn test_8_bit_string() {

    let data = [0x05, 0x00, 0x83, 0x07, 0x00, 0x00];
    let mut reader = BitReader::new(&data);

    assert_eq!(read_8_bit_string(&mut reader), vec![(5, 1), (7, 3)]);
    assert_eq!(reader.bytes_read(), 6);
}

#[test]
fn test_default_cluts() {

    assert_eq!(default_clut(2).len(), 4);
    assert_eq!(default_clut(4)[9], [127, 0, 0, 255]);
    assert_eq!(default_clut(8)[0], [0, 0, 0, 0]);
    assert_eq!(default_clut(8)[3], [255, 255, 0, 63]);
    assert_eq!(default_clut(8)[0x11], [255, 0, 0, 255]);
    assert_eq!(default_clut(8)[0x80], [127, 127, 127, 255]);
}

#[test]
fn test_picture_is_trimmed_and_placed() {

    let (pictures, diagnostics) = DvbDecodeState::new()
        .push_packet(&block(raw_packet(), 1_000, 2_000), &Settings::default())
        .finish(&Settings::default());

    assert!(diagnostics.is_empty());
    assert_eq!(pictures.len(), 1);
    assert_eq!((pictures[0].x, pictures[0].y), (101, 52));
    assert_eq!(pictures[0].bitmap.dimensions(), (4, 2));
    assert_eq!((pictures[0].start, pictures[0].end), (1_000.0, 2_000.0));
}

#[test]
fn test_clear_marker_then_short_event_extended() {

    let settings = Settings::default();
    let (pictures, _) = DvbDecodeState::new()
        .push_packet(&block(raw_packet(), 0, 0), &settings)
        .push_packet(&block(vec![], 50, 50), &settings)
        .finish(&settings);

    assert_eq!(pictures.len(), 1);
    assert_eq!((pictures[0].start, pictures[0].end), (0.0, 3_000.0));
}

#[test]
fn test_extended_event_clamped_by_next() {

    let settings = Settings::default();
    let (pictures, _) = DvbDecodeState::new()
        .push_packet(&block(raw_packet(), 0, 0), &settings)
        .push_packet(&block(vec![], 50, 50), &settings)
        .push_packet(&block(raw_packet(), 2_000, 2_000), &settings)
        .finish(&settings);

    assert_eq!(pictures.len(), 2);
    assert_eq!((pictures[0].start, pictures[0].end), (0.0, 1_976.0));
    assert_eq!((pictures[1].start, pictures[1].end), (2_000.0, 5_000.0));
}

#[test]
fn test_clear_marker_state() {

    let settings = Settings::default();
    let state = DvbDecodeState::new()
        .push_packet(&block(raw_packet(), 0, 0), &settings);

    assert!(state.last_event_incomplete);

    let state = state.push_packet(&block(vec![], 150, 150), &settings);

    assert!(!state.last_event_incomplete);
    assert_eq!(state.carry_events[0].end, 150.0);
}

#[test]
fn test_clear_marker_ignored_for_long_event() {

    let settings = Settings::default();
    let state = DvbDecodeState::new()
        .push_packet(&block(raw_packet(), 0, 500), &settings)
        .push_packet(&block(vec![], 600, 600), &settings);

    assert_eq!(state.carry_events[0].end, 500.0);
}

#[test]
fn test_clear_marker_after_long_gap_uses_fallback() {

    let settings = Settings::default();
    let state = DvbDecodeState::new()
        .push_packet(&block(raw_packet(), 0, 0), &settings)
        .push_packet(&block(vec![], 10_000, 10_000), &settings);

    assert_eq!(state.carry_events[0].end, 3_000.0);
}

#[test]
fn test_bad_packet_is_skipped() {

    let settings = Settings::default();
    let mut broken = private_stream_1_packet();

    broken.truncate(8);

    let (pictures, diagnostics) = DvbDecodeState::new()
        .push_packet(&block(broken, 0, 0), &settings)
        .push_packet(&block(raw_packet(), 1_000, 1_500), &settings)
        .finish(&settings);

    assert_eq!(pictures.len(), 1);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::MalformedSegment);
    assert_eq!(diagnostics[0].position, 0);
}

#[test]
fn test_page_without_regions_is_no_event() {

    let settings = Settings::default();
    let packet = [page_segment(&[]), segment(END_OF_DISPLAY_SET_SEGMENT, &[])].concat();

    assert_eq!(classify(&packet), PacketKind::RawSegments);

    let (pictures, diagnostics) = DvbDecodeState::new()
        .push_packet(&block(packet, 0, 0), &settings)
        .finish(&settings);

    assert!(pictures.is_empty());
    assert!(diagnostics.is_empty());
}
