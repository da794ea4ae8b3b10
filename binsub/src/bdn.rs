/*
 * Copyright 2022 William Swartzendruber
 *
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Writes subtitle events as BDN XML with one PNG image per event.
//!
//! Images are named after the event's one-based index, zero-padded to four digits, and are
//! placed next to the XML descriptor. The descriptor is written last, after every image, and
//! lists only the images that were actually written.


use super::{
    bitmap::{empty_bitmap, Bitmap},
    config::Settings,
    event::{ScreenGeometry, Session, SubtitleEvent},
    progress::{WriteControl, WriteSummary},
    timing::{format_timecode, TimingError},
};
use std::{
    fs,
    io::Error as IoError,
    path::Path,
};
use image::{ImageError, ImageFormat};
use thiserror::Error as ThisError;

/// A specialized [`Result`](std::result::Result) type for BDN writing operations.
pub type WriteResult<T> = Result<T, WriteError>;

/// The error type for [BdnXmlWriter].
#[derive(ThisError, Debug)]
pub enum WriteError {
    #[error("BDN output IO error")]
    IoError {
        #[from]
        source: IoError,
    },
    #[error("PNG encoding error")]
    ImageError {
        #[from]
        source: ImageError,
    },
    #[error("timecode error")]
    TimingError {
        #[from]
        source: TimingError,
    },
}

/// Writes a session as a BDN XML descriptor plus PNG images.
pub struct BdnXmlWriter {
    title: String,
    language: String,
    control: WriteControl,
}

impl BdnXmlWriter {

    pub fn new(settings: &Settings) -> Self {
        BdnXmlWriter {
            title: settings.bdn_title.clone(),
            language: settings.bdn_language.clone(),
            control: WriteControl::default(),
        }
    }

    pub fn with_control(mut self, control: WriteControl) -> Self {
        self.control = control;
        self
    }

    /// Writes every event's image into the descriptor's folder, then the descriptor itself.
    ///
    /// Cancellation is checked before each image. A cancelled write keeps the images already
    /// written and still produces a descriptor listing them.
    pub fn write<P: AsRef<Path>>(&self, session: &Session, xml_path: P) -> WriteResult<WriteSummary> {

        let xml_path = xml_path.as_ref();
        let folder = match xml_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => Path::new(".").to_path_buf(),
        };
        let written = self.write_images(&session.events, &folder)?;
        let cancelled = written.len() < session.events.len();
        let document = self.document(&written, &session.geometry)?;

        fs::write(xml_path, document)?;

        log::debug!(
            "wrote {} of {} events as BDN XML to {}",
            written.len(),
            session.events.len(),
            xml_path.display(),
        );

        Ok(
            WriteSummary {
                written: written.len(),
                cancelled,
            }
        )
    }

    #[cfg(not(feature = "rayon"))]
    fn write_images<'a>(
        &self,
        events: &'a [SubtitleEvent],
        folder: &Path,
    ) -> WriteResult<Vec<&'a SubtitleEvent>> {

        let mut written = Vec::with_capacity(events.len());

        for event in events.iter() {

            if self.control.is_cancelled() {
                break
            }

            save_image(event, folder)?;
            written.push(event);
            self.control.report(written.len(), events.len());
        }

        Ok(written)
    }

    #[cfg(feature = "rayon")]
    fn write_images<'a>(
        &self,
        events: &'a [SubtitleEvent],
        folder: &Path,
    ) -> WriteResult<Vec<&'a SubtitleEvent>> {

        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
        use std::sync::atomic::{AtomicUsize, Ordering};

        let done = AtomicUsize::new(0);
        let results: WriteResult<Vec<Option<&'a SubtitleEvent>>> = events
            .par_iter()
            .map(|event| -> WriteResult<Option<&'a SubtitleEvent>> {
                if self.control.is_cancelled() {
                    return Ok(None)
                }
                save_image(event, folder)?;
                self.control.report(done.fetch_add(1, Ordering::AcqRel) + 1, events.len());
                Ok(Some(event))
            })
            .collect();

        Ok(results?.into_iter().flatten().collect())
    }

    /// Renders the XML descriptor for the given events.
    pub fn document(
        &self,
        events: &[&SubtitleEvent],
        geometry: &ScreenGeometry,
    ) -> WriteResult<String> {

        let fps = geometry.frame_rate.fps();
        let first_in = match events.first() {
            Some(event) => format_timecode(event.start_ms, fps)?,
            None => format_timecode(0.0, fps)?,
        };
        let last_out = match events.last() {
            Some(event) => format_timecode(event.end_ms, fps)?,
            None => format_timecode(0.0, fps)?,
        };
        let mut lines = vec![
            r#"<?xml version="1.0" encoding="utf-8"?>"#.to_string(),
            concat!(
                r#"<BDN Version="0.93" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#,
                r#" xsi:noNamespaceSchemaLocation="BD-03-006-0093b BDN File Format.xsd">"#,
            ).to_string(),
            "  <Description>".to_string(),
            format!(r#"    <Name Title="{}" Content="" />"#, escape(&self.title)),
            format!(r#"    <Language Code="{}" />"#, escape(&self.language)),
            format!(
                r#"    <Format VideoFormat="{}" FrameRate="{}" DropFrame="False" />"#,
                video_format(geometry.width, geometry.height),
                geometry.frame_rate,
            ),
            format!(
                r#"    <Events Type="Graphic" FirstEventInTC="{}" LastEventOutTC="{}" NumberofEvents="{}" />"#,
                first_in,
                last_out,
                events.len(),
            ),
            "  </Description>".to_string(),
            "  <Events>".to_string(),
        ];

        for event in events.iter() {

            let (width, height) = image_dimensions(&event.bitmap);

            lines.push(
                format!(
                    r#"    <Event InTC="{}" OutTC="{}" Forced="{}">"#,
                    format_timecode(event.start_ms, fps)?,
                    format_timecode(event.end_ms, fps)?,
                    event.is_forced,
                )
            );
            lines.push(
                format!(
                    r#"      <Graphic Width="{}" Height="{}" X="{}" Y="{}">{}</Graphic>"#,
                    width,
                    height,
                    event.x,
                    event.y,
                    image_file_name(event.index),
                )
            );
            lines.push("    </Event>".to_string());
        }

        lines.push("  </Events>".to_string());
        lines.push("</BDN>".to_string());

        Ok(lines.join("\n"))
    }
}

/// Names the video format of a screen size, using the standard names where they exist.
pub fn video_format(width: u32, height: u32) -> String {
    match (width, height) {
        (1920, 1080) => "1080p".to_string(),
        (1280, 720) => "720p".to_string(),
        (848, 480) => "480p".to_string(),
        (0, _) | (_, 0) => "1080p".to_string(),
        _ => format!("{}x{}", width, height),
    }
}

pub fn image_file_name(index: u32) -> String {
    format!("{:04}.png", index)
}

fn save_image(event: &SubtitleEvent, folder: &Path) -> WriteResult<()> {

    let path = folder.join(image_file_name(event.index));

    if event.bitmap.width() == 0 || event.bitmap.height() == 0 {
        empty_bitmap().save_with_format(path, ImageFormat::Png)?;
    } else {
        event.bitmap.save_with_format(path, ImageFormat::Png)?;
    }

    Ok(())
}

fn image_dimensions(bitmap: &Bitmap) -> (u32, u32) {
    match bitmap.dimensions() {
        (0, _) | (_, 0) => empty_bitmap().dimensions(),
        dimensions => dimensions,
    }
}

fn escape(text: &str) -> String {

    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }

    escaped
}
