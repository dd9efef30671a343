//! Reference movie serializer (FM2-style text header with text or raw records).
//!
//! ## Layout
//!
//! ```text
//! version 3
//! emuVersion 100
//! ...                      key/value header lines, unknown keys skipped
//! binary 1                 only in raw mode
//! length N                 always last, terminates the header
//! |0|R..U....|........|    text mode: N record lines
//! |<N * (1 + pads) bytes>  raw mode: one '|' then packed records
//! ```

use std::io::{BufRead, ErrorKind, Write};

use byteorder::{ReadBytesExt, WriteBytesExt};

use super::{Movie, PortDevice, Record, Subtitle, BUTTON_LETTERS};
use crate::core::MovieFormat;
use crate::util::{Error, Result};

/// Marker that opens a record (text line start, or the raw section).
const RECORD_MARKER: u8 = b'|';

/// Upper bound for preallocating records from an untrusted `length`.
const MAX_PREALLOC_RECORDS: usize = 1 << 16;

/// FM2-style movie reader/writer.
#[derive(Debug, Default, Clone, Copy)]
pub struct Fm2Format;

impl MovieFormat for Fm2Format {
    fn parse(&self, input: &mut dyn BufRead) -> Result<Movie> {
        let mut movie = Movie { emu_version: 0, ..Default::default() };
        let (length, binary) = parse_header(input, &mut movie)?;

        let pads = movie.input_type().joypads();
        movie.records.reserve(length.min(MAX_PREALLOC_RECORDS));
        if binary {
            let marker = input.read_u8().map_err(eof_as_dataset)?;
            if marker != RECORD_MARKER {
                return Err(Error::dataset(format!("expected '|' before raw records, got 0x{marker:02x}")));
            }
            for frame in 0..length {
                movie.records.push(read_raw_record(input, pads, frame)?);
            }
        } else {
            let mut line = String::new();
            for frame in 0..length {
                line.clear();
                if input.read_line(&mut line).map_err(eof_as_dataset)? == 0 {
                    return Err(Error::dataset(format!("movie ends at frame {frame} of {length}")));
                }
                movie.records.push(parse_text_record(line.trim_end_matches(['\r', '\n']), pads, frame)?);
            }
        }

        movie.load_frame_count = length;
        Ok(movie)
    }

    fn serialize(&self, movie: &Movie, out: &mut dyn Write, binary: bool) -> Result<()> {
        writeln!(out, "version {}", movie.version)?;
        writeln!(out, "emuVersion {}", movie.emu_version)?;
        writeln!(out, "rerecordCount {}", movie.rerecord_count)?;
        writeln!(out, "palFlag {}", movie.pal as u8)?;
        writeln!(out, "romFilename {}", single_line(&movie.rom_filename))?;
        writeln!(out, "romChecksum {}", single_line(&movie.rom_checksum))?;
        writeln!(out, "guid {}", single_line(&movie.guid))?;
        writeln!(out, "fourscore {}", movie.fourscore as u8)?;
        writeln!(out, "microphone {}", movie.microphone as u8)?;
        writeln!(out, "port0 {}", movie.ports[0].code())?;
        writeln!(out, "port1 {}", movie.ports[1].code())?;
        writeln!(out, "FDS {}", movie.fds as u8)?;
        for comment in &movie.comments {
            writeln!(out, "comment {}", single_line(comment))?;
        }
        for subtitle in &movie.subtitles {
            writeln!(out, "subtitle {} {}", subtitle.frame, single_line(&subtitle.text))?;
        }
        if binary {
            writeln!(out, "binary 1")?;
        }
        writeln!(out, "length {}", movie.records.len())?;

        let pads = movie.input_type().joypads();
        if binary {
            out.write_u8(RECORD_MARKER)?;
            for record in &movie.records {
                out.write_u8(record.commands)?;
                out.write_all(&record.joypads[..pads])?;
            }
        } else {
            for record in &movie.records {
                writeln!(out, "{}", format_text_record(record, pads))?;
            }
        }
        Ok(())
    }
}

/// Read header lines into `movie`. Returns (record count, raw mode).
fn parse_header(input: &mut dyn BufRead, movie: &mut Movie) -> Result<(usize, bool)> {
    let mut binary = false;
    let mut line = String::new();
    loop {
        line.clear();
        if input.read_line(&mut line).map_err(eof_as_dataset)? == 0 {
            return Err(Error::dataset("header has no 'length' line"));
        }
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            continue;
        }
        if line.starts_with(RECORD_MARKER as char) {
            return Err(Error::dataset("records found before 'length' line"));
        }

        let (key, value) = line.split_once(' ').unwrap_or((line, ""));
        match key {
            "version" => movie.version = parse_num(key, value)?,
            "emuVersion" => movie.emu_version = parse_num(key, value)?,
            "rerecordCount" => movie.rerecord_count = parse_num(key, value)?,
            "palFlag" => movie.pal = parse_flag(key, value)?,
            "romFilename" => movie.rom_filename = value.to_string(),
            "romChecksum" => movie.rom_checksum = value.to_string(),
            "guid" => movie.guid = value.to_string(),
            "fourscore" => movie.fourscore = parse_flag(key, value)?,
            "microphone" => movie.microphone = parse_flag(key, value)?,
            "port0" => movie.ports[0] = PortDevice::from_code(parse_num(key, value)?),
            "port1" => movie.ports[1] = PortDevice::from_code(parse_num(key, value)?),
            "FDS" => movie.fds = parse_flag(key, value)?,
            "comment" => movie.comments.push(value.to_string()),
            "subtitle" => movie.subtitles.push(parse_subtitle(value)?),
            "binary" => binary = parse_flag(key, value)?,
            "length" => {
                let length: u32 = parse_num(key, value)?;
                return Ok((length as usize, binary));
            }
            _ => tracing::trace!(key, "skipping unknown movie header key"),
        }
    }
}

fn parse_num(key: &str, value: &str) -> Result<u32> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::dataset(format!("bad value for '{key}': {value:?}")))
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    Ok(parse_num(key, value)? != 0)
}

fn parse_subtitle(value: &str) -> Result<Subtitle> {
    let (frame, text) = value.split_once(' ').unwrap_or((value, ""));
    Ok(Subtitle { frame: parse_num("subtitle", frame)?, text: text.to_string() })
}

fn read_raw_record(input: &mut dyn BufRead, pads: usize, frame: usize) -> Result<Record> {
    let mut record = Record { commands: input.read_u8().map_err(eof_as_dataset)?, ..Default::default() };
    input.read_exact(&mut record.joypads[..pads]).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => Error::dataset(format!("raw record {frame} is truncated")),
        _ => Error::Io(e),
    })?;
    Ok(record)
}

fn parse_text_record(line: &str, pads: usize, frame: usize) -> Result<Record> {
    let bad = |what: &str| Error::dataset(format!("record {frame}: {what}"));

    let body = line.strip_prefix(RECORD_MARKER as char).ok_or_else(|| bad("missing leading '|'"))?;
    let mut fields = body.split(RECORD_MARKER as char);
    let commands = fields
        .next()
        .and_then(|c| c.trim().parse().ok())
        .ok_or_else(|| bad("bad command field"))?;

    let mut record = Record { commands, ..Default::default() };
    for pad in record.joypads.iter_mut().take(pads) {
        let field = fields.next().ok_or_else(|| bad("too few joypad fields"))?;
        *pad = parse_buttons(field).ok_or_else(|| bad("joypad field must have 8 buttons"))?;
    }
    Ok(record)
}

fn parse_buttons(field: &str) -> Option<u8> {
    if field.len() != BUTTON_LETTERS.len() {
        return None;
    }
    Some(field.bytes().enumerate().fold(0u8, |acc, (i, c)| {
        if c == b'.' || c == b' ' {
            acc
        } else {
            acc | (0x80 >> i)
        }
    }))
}

fn format_text_record(record: &Record, pads: usize) -> String {
    let mut line = format!("|{}|", record.commands);
    for &pad in &record.joypads[..pads] {
        for (i, &letter) in BUTTON_LETTERS.iter().enumerate() {
            line.push(if pad & (0x80 >> i) != 0 { letter as char } else { '.' });
        }
        line.push('|');
    }
    line
}

fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

fn eof_as_dataset(err: std::io::Error) -> Error {
    match err.kind() {
        ErrorKind::UnexpectedEof => Error::dataset("unexpected end of movie data"),
        ErrorKind::InvalidData => Error::dataset("movie header is not valid UTF-8"),
        _ => Error::Io(err),
    }
}
