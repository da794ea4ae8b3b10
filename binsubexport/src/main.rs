/*
 * Copyright 2022 William Swartzendruber
 *
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

#[cfg(test)]
mod tests;

use binsub::{
    bdn::BdnXmlWriter,
    config::Settings,
    event::SubtitleEvent,
    extract::{decode_sup, ExtractError},
    progress::{ProgressInfo, WriteControl},
    sup::SupWriter,
    timing::format_timecode,
};
use std::{
    fs::File,
    io::{stdin, stdout, BufReader, BufWriter, Read, Write},
    path::Path,
    process::exit,
    sync::Arc,
};
use clap::{
    app_from_crate,
    crate_authors,
    crate_description,
    crate_name,
    crate_version,
    App,
    Arg,
};
use log::LevelFilter;

fn main() {

    let matches = app().get_matches();

    env_logger::Builder::new()
        .filter_level(
            if matches.is_present("verbose") {
                LevelFilter::Debug
            } else {
                LevelFilter::Warn
            }
        )
        .init();

    let mut settings = Settings::default();

    if let Some(title) = matches.value_of("title") {
        settings = settings.with_bdn_title(title);
    }
    if let Some(language) = matches.value_of("language") {
        settings = settings.with_bdn_language(language);
    }

    let input_value = matches.value_of("input").unwrap_or("-");
    let (mut stdin_read, mut file_read);
    let input = BufReader::<&mut dyn Read>::new(
        if input_value == "-" {
            stdin_read = stdin();
            &mut stdin_read
        } else {
            file_read = File::open(input_value)
                .expect("Could not open input file for reading.");
            &mut file_read
        }
    );
    let session = match decode_sup(input, &settings) {
        Ok(session) => session,
        Err(ExtractError::NoSubtitlesFound { diagnostics }) => {
            for diagnostic in diagnostics.iter() {
                eprintln!("{}", diagnostic);
            }
            eprintln!("No subtitles found.");
            exit(1)
        }
        Err(err) => panic!("Could not decode input: {}", err),
    };

    if matches.is_present("list") {
        for event in session.events.iter() {
            println!("{}", event_line(event, session.geometry.frame_rate.fps()));
        }
        return
    }

    let output_value = matches.value_of("output").unwrap_or("-");
    let control = WriteControl::default()
        .with_progress(Arc::new(|info: &ProgressInfo| {
            log::debug!("wrote event {} of {}", info.current, info.total);
        }));

    if is_bdn_output(output_value) {

        let summary = BdnXmlWriter::new(&settings)
            .with_control(control)
            .write(&session, output_value)
            .expect("Could not write BDN XML output.");

        eprintln!("Wrote {} events to {}.", summary.written, output_value);
    } else {

        let (mut stdout_write, mut file_write);
        let output = BufWriter::<&mut dyn Write>::new(
            if output_value == "-" {
                stdout_write = stdout();
                &mut stdout_write
            } else {
                file_write = File::create(output_value)
                    .expect("Could not open output file for writing.");
                &mut file_write
            }
        );
        let summary = SupWriter::new(output)
            .with_control(control)
            .write_session(&session)
            .expect("Could not write SUP output.");

        eprintln!("Wrote {} events.", summary.written);
    }
}

fn app() -> App<'static, 'static> {
    app_from_crate!()
        .arg(Arg::with_name("title")
            .long("title")
            .short("t")
            .value_name("TITLE")
            .help("Title to put into BDN XML output")
            .takes_value(true)
            .required(false)
        )
        .arg(Arg::with_name("language")
            .long("language")
            .short("l")
            .value_name("CODE")
            .help("Language code to put into BDN XML output")
            .takes_value(true)
            .required(false)
        )
        .arg(Arg::with_name("list")
            .long("list")
            .help("Lists the decoded events instead of writing them")
        )
        .arg(Arg::with_name("verbose")
            .long("verbose")
            .short("v")
            .help("Logs decoding details to STDERR")
        )
        .arg(Arg::with_name("input")
            .index(1)
            .value_name("INPUT-FILE")
            .help("Input SUP file; use - for STDIN")
            .required(true)
        )
        .arg(Arg::with_name("output")
            .index(2)
            .value_name("OUTPUT-FILE")
            .help("Output SUP file, or BDN XML file if it ends in .xml; use - for STDOUT")
            .required_unless("list")
        )
        .after_help(concat!("This utility decodes bitmap subtitles and writes them back out \
            either as a Blu-ray SUP stream or as BDN XML with one PNG image per subtitle. \
            Subtitle timing is checked and corrected on the way through.\n\n\
            Copyright © 2022 William Swartzendruber\n\
            Licensed under the Mozilla Public License 2.0\n\
            <", env!("CARGO_PKG_REPOSITORY"), ">"))
}

fn is_bdn_output(path: &str) -> bool {
    Path::new(path)
        .extension()
        .map_or(false, |extension| extension.eq_ignore_ascii_case("xml"))
}

fn event_line(event: &SubtitleEvent, fps: f64) -> String {

    let timecode = |ms: f64| format_timecode(ms, fps).unwrap_or_else(|_| "--:--:--:--".to_string());
    let (width, height) = event.bitmap.dimensions();

    format!(
        "{:>4}  {} --> {}  {}x{} at ({}, {}){}",
        event.index,
        timecode(event.start_ms),
        timecode(event.end_ms),
        width,
        height,
        event.x,
        event.y,
        if event.is_forced { "  forced" } else { "" },
    )
}
