use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, VigilError};
use crate::events::{EventKind, InteractionEvent};

pub const BOM: &str = "\u{FEFF}";
pub const HEADER: &str = "Timestamp (ms),Event Type,Details";
pub const DEFAULT_FILENAME: &str = "proctoring_data.csv";

/// UTF-8 with a leading BOM, the header line, then one
/// `timestamp,type,"details"` line per event in log order.
pub fn write_events<W: Write>(events: &[InteractionEvent], mut out: W) -> io::Result<()> {
    write!(out, "{}", BOM)?;
    writeln!(out, "{}", HEADER)?;
    for event in events {
        writeln!(
            out,
            "{},{},\"{}\"",
            event.timestamp(),
            event.kind(),
            event.details().replace('"', "\"\"")
        )?;
    }
    out.flush()
}

pub fn export_events(events: &[InteractionEvent]) -> Vec<u8> {
    let mut buf = Vec::new();
    // writing into a Vec cannot fail
    let _ = write_events(events, &mut buf);
    buf
}

/// Write `proctoring_data.csv` into `dir`, creating it if needed
pub fn save<P: AsRef<Path>>(events: &[InteractionEvent], dir: P) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let path = dir.join(DEFAULT_FILENAME);
    let file = fs::File::create(&path)?;
    write_events(events, io::BufWriter::new(file))?;
    Ok(path)
}

/// Parse an export back into events.
///
/// The file carries neither the click button nor the physical key code; they
/// come back as `0` and the key identifier. Key gaps are recomputed from the
/// recorded key releases. Timestamps must not decrease from row to row.
pub fn read_events<R: Read>(mut input: R) -> Result<Vec<InteractionEvent>> {
    let mut text = String::new();
    input.read_to_string(&mut text)?;
    let text = text.strip_prefix(BOM).unwrap_or(&text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let mut events = Vec::new();
    let mut last_key_up: Option<u64> = None;
    let mut previous = 0;

    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let row = idx + 2;
        let malformed = |reason: String| VigilError::MalformedRow { row, reason };
        if record.len() < 3 {
            return Err(malformed(format!("expected 3 fields, got {}", record.len())));
        }

        let timestamp: u64 = record[0]
            .trim()
            .parse()
            .map_err(|_| malformed(format!("bad timestamp '{}'", &record[0])))?;
        if timestamp < previous {
            return Err(malformed(format!(
                "timestamp decreases ({} after {})",
                timestamp, previous
            )));
        }
        previous = timestamp;
        let kind = EventKind::from_tag(record[1].trim())
            .ok_or_else(|| VigilError::UnknownEventType(record[1].to_string()))?;
        let details = &record[2];

        let event = match kind {
            EventKind::MouseMove | EventKind::Click => {
                let (x, y) = parse_position(details)
                    .ok_or_else(|| malformed(format!("bad position '{}'", details)))?;
                if kind == EventKind::MouseMove {
                    InteractionEvent::MouseMove { x, y, timestamp }
                } else {
                    InteractionEvent::Click {
                        x,
                        y,
                        button: 0,
                        timestamp,
                    }
                }
            }
            EventKind::KeyDown | EventKind::KeyUp => {
                let key = details
                    .strip_prefix("Key: ")
                    .ok_or_else(|| malformed(format!("bad key '{}'", details)))?
                    .to_string();
                if kind == EventKind::KeyUp {
                    last_key_up = Some(timestamp);
                    InteractionEvent::KeyUp { key, timestamp }
                } else {
                    InteractionEvent::KeyDown {
                        code: key.clone(),
                        key,
                        time_since_last_key: last_key_up
                            .map_or(0, |up| timestamp.saturating_sub(up)),
                        timestamp,
                    }
                }
            }
            EventKind::Blur => InteractionEvent::Blur { timestamp },
            EventKind::Focus => InteractionEvent::Focus { timestamp },
        };
        events.push(event);
    }

    Ok(events)
}

pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<InteractionEvent>> {
    read_events(fs::File::open(path)?)
}

fn parse_position(details: &str) -> Option<(i32, i32)> {
    let rest = details.strip_prefix("x: ")?;
    let (x, y) = rest.split_once(" | y: ")?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}
