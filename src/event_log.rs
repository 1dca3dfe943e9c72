//! TensorBoard scalar event log reading and export.
//!
//! Summary event files are sequences of TFRecord frames, each carrying one
//! protobuf `Event` message. Only scalar summaries are handled; histogram,
//! image, and tensor values are skipped.
//!
//! # Framing
//!
//! Each frame is laid out as:
//!
//! ```text
//! u64 LE  payload length
//! u32 LE  masked crc32c of the length word
//! bytes   payload (protobuf Event)
//! u32 LE  masked crc32c of the payload
//! ```
//!
//! where `masked(crc) = rotr(crc, 15) + 0xa282ead8`. A truncated trailing
//! frame (interrupted writer) is tolerated and reading stops there; a
//! checksum mismatch anywhere else is a hard error.
//!
//! # Output shapes
//!
//! | Accessor | Shape |
//! |----------|-------|
//! | [`EventLog::scalars`] | raw events: value + wall-clock time + step |
//! | [`EventLog::values`] | stripped: values only |
//! | [`EventLog::series`] | unpacked: aligned `steps`/`timestamps`/`values` arrays |
//!
//! Wall-clock times are epoch float seconds in the raw shape and become
//! structured UTC timestamps in the unpacked shape.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use prost::Message;
use walkdir::WalkDir;

use crate::models::{MetricBundle, MetricSeries};

/// Minimal subset of the TensorFlow event wire schema needed for scalars.
///
/// Field numbers follow `tensorflow/core/util/event.proto` and
/// `tensorflow/core/framework/summary.proto`; unknown fields are skipped
/// by the decoder.
pub mod proto {
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Event {
        #[prost(double, tag = "1")]
        pub wall_time: f64,
        #[prost(int64, tag = "2")]
        pub step: i64,
        #[prost(string, optional, tag = "3")]
        pub file_version: Option<String>,
        #[prost(message, optional, tag = "5")]
        pub summary: Option<Summary>,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Summary {
        #[prost(message, repeated, tag = "1")]
        pub value: Vec<SummaryValue>,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct SummaryValue {
        #[prost(string, tag = "1")]
        pub tag: String,
        #[prost(float, optional, tag = "2")]
        pub simple_value: Option<f32>,
    }
}

/// Errors callers need to tell apart from plain I/O failures.
#[derive(Debug, thiserror::Error)]
pub enum EventLogError {
    /// CSV export requires every column to have the same number of rows.
    #[error("metric series lengths differ across columns: {0}")]
    UnevenColumns(String),
    /// Recognized export formats that are not implemented.
    #[error("{0} export is not implemented")]
    Unsupported(&'static str),
}

/// Value shape for [`EventLog::export_json`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    /// Values only, one array per metric.
    Strip,
    /// Aligned `steps`/`timestamps`/`values` arrays per metric.
    Unpack,
}

/// One scalar observation as logged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarEvent {
    /// Epoch seconds, fractional.
    pub wall_time: f64,
    pub step: i64,
    pub value: f64,
}

const FRAME_HEADER_LEN: usize = 12;
const CRC_MASK_DELTA: u32 = 0xa282_ead8;

fn masked_crc32c(bytes: &[u8]) -> u32 {
    crc32c::crc32c(bytes).rotate_right(15).wrapping_add(CRC_MASK_DELTA)
}

fn read_u32_le(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn read_u64_le(bytes: &[u8]) -> u64 {
    u64::from_le_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ])
}

/// Find valid summary event files under `dir`, sorted by path.
///
/// A file qualifies when its name carries the `tfevents` marker and its
/// leading bytes form a checksummed TFRecord frame header, so renamed
/// junk with the right name does not slip through.
pub fn detect_event_logs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();

    for entry in WalkDir::new(dir) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !name.contains("tfevents") {
            continue;
        }
        if has_valid_leading_frame(entry.path()) {
            found.push(entry.path().to_path_buf());
        }
    }

    found.sort();
    Ok(found)
}

fn has_valid_leading_frame(path: &Path) -> bool {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(_) => return false,
    };
    let mut header = [0u8; FRAME_HEADER_LEN];
    if file.read_exact(&mut header).is_err() {
        return false;
    }
    masked_crc32c(&header[..8]) == read_u32_le(&header[8..12])
}

/// Split a summary event file into its raw protobuf payloads.
fn read_frames(path: &Path) -> Result<Vec<Vec<u8>>> {
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read event log file: {}", path.display()))?;

    let mut frames = Vec::new();
    let mut offset = 0usize;

    while data.len() - offset >= FRAME_HEADER_LEN {
        let header = &data[offset..offset + FRAME_HEADER_LEN];
        let length = read_u64_le(&header[..8]) as usize;
        if masked_crc32c(&header[..8]) != read_u32_le(&header[8..12]) {
            bail!(
                "corrupt frame length at byte {} of {}",
                offset,
                path.display()
            );
        }

        let payload_start = offset + FRAME_HEADER_LEN;
        let frame_end = payload_start
            .checked_add(length)
            .and_then(|end| end.checked_add(4));
        let frame_end = match frame_end {
            // Truncated trailing frame: the writer was interrupted.
            Some(end) if data.len() >= end => end,
            _ => break,
        };

        let payload = &data[payload_start..payload_start + length];
        let payload_crc = read_u32_le(&data[payload_start + length..frame_end]);
        if masked_crc32c(payload) != payload_crc {
            bail!(
                "corrupt frame payload at byte {} of {}",
                payload_start,
                path.display()
            );
        }

        frames.push(payload.to_vec());
        offset = frame_end;
    }

    Ok(frames)
}

/// Scalar series extracted from the event files of one log directory.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    scalars: BTreeMap<String, Vec<ScalarEvent>>,
}

impl EventLog {
    /// Read every detected event file under `dir` and collect its scalar
    /// summaries, merged per tag in file order.
    pub fn open(dir: &Path) -> Result<Self> {
        let files = detect_event_logs(dir)?;
        if files.is_empty() {
            tracing::warn!(dir = %dir.display(), "no summary event files found");
        }

        let mut scalars: BTreeMap<String, Vec<ScalarEvent>> = BTreeMap::new();

        for file in &files {
            for frame in read_frames(file)? {
                let event = proto::Event::decode(frame.as_slice()).with_context(|| {
                    format!("Failed to decode event record in {}", file.display())
                })?;

                let summary = match event.summary {
                    Some(summary) => summary,
                    None => continue,
                };
                for value in summary.value {
                    if let Some(scalar) = value.simple_value {
                        scalars.entry(value.tag).or_default().push(ScalarEvent {
                            wall_time: event.wall_time,
                            step: event.step,
                            value: f64::from(scalar),
                        });
                    }
                }
            }
        }

        Ok(Self { scalars })
    }

    /// All scalar tags present in the log.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.scalars.keys().map(String::as_str)
    }

    /// Raw events per tag. An empty `suffixes` slice keeps every tag;
    /// otherwise a tag is kept when it ends in any of the suffixes.
    pub fn scalars(&self, suffixes: &[String]) -> BTreeMap<&str, &[ScalarEvent]> {
        self.scalars
            .iter()
            .filter(|(tag, _)| keep_tag(tag, suffixes))
            .map(|(tag, events)| (tag.as_str(), events.as_slice()))
            .collect()
    }

    /// Stripped shape: plain values per tag.
    pub fn values(&self, suffixes: &[String]) -> BTreeMap<String, Vec<f64>> {
        self.scalars
            .iter()
            .filter(|(tag, _)| keep_tag(tag, suffixes))
            .map(|(tag, events)| (tag.clone(), events.iter().map(|event| event.value).collect()))
            .collect()
    }

    /// Unpacked shape: aligned step/timestamp/value arrays per tag, with
    /// wall-clock floats converted to UTC timestamps.
    pub fn series(&self, suffixes: &[String]) -> MetricBundle {
        self.scalars
            .iter()
            .filter(|(tag, _)| keep_tag(tag, suffixes))
            .map(|(tag, events)| {
                let series = MetricSeries {
                    steps: events.iter().map(|event| event.step).collect(),
                    timestamps: events
                        .iter()
                        .map(|event| wall_time_to_utc(event.wall_time))
                        .collect(),
                    values: events.iter().map(|event| event.value).collect(),
                };
                (tag.clone(), series)
            })
            .collect()
    }

    /// Serialize the stripped shape as CSV: one column per metric, one
    /// row per index.
    ///
    /// Every selected metric must have the same number of observations;
    /// the check runs before the output file is created, so a violation
    /// leaves no partial file behind.
    pub fn export_csv(&self, path: &Path, suffixes: &[String]) -> Result<()> {
        let columns = self.values(suffixes);

        let lengths: BTreeSet<usize> = columns.values().map(Vec::len).collect();
        if lengths.len() > 1 {
            let detail = columns
                .iter()
                .map(|(tag, values)| format!("{}={}", tag, values.len()))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(EventLogError::UnevenColumns(detail).into());
        }

        let file = File::create(path)
            .with_context(|| format!("Failed to create CSV export file: {}", path.display()))?;
        let mut writer = csv::Writer::from_writer(file);

        writer.write_record(columns.keys())?;
        let rows = lengths.into_iter().next().unwrap_or(0);
        for index in 0..rows {
            let row: Vec<String> = columns
                .values()
                .map(|values| values[index].to_string())
                .collect();
            writer.write_record(&row)?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Serialize the selected shape as a JSON object keyed by tag.
    ///
    /// Unpacked timestamps render as RFC 3339 strings, not raw epoch
    /// floats.
    pub fn export_json(&self, path: &Path, suffixes: &[String], mode: ExportMode) -> Result<()> {
        let payload = match mode {
            ExportMode::Strip => serde_json::to_value(self.values(suffixes))?,
            ExportMode::Unpack => serde_json::to_value(self.series(suffixes))?,
        };

        let file = File::create(path)
            .with_context(|| format!("Failed to create JSON export file: {}", path.display()))?;
        serde_json::to_writer(file, &payload)?;

        Ok(())
    }

    /// Compact binary export. Not implemented; kept so callers get an
    /// explicit unsupported-operation error instead of a silent no-op.
    pub fn export_packed(&self, _path: &Path) -> Result<()> {
        Err(EventLogError::Unsupported("packed binary").into())
    }
}

fn keep_tag(tag: &str, suffixes: &[String]) -> bool {
    suffixes.is_empty() || suffixes.iter().any(|suffix| tag.ends_with(suffix.as_str()))
}

fn wall_time_to_utc(wall_time: f64) -> DateTime<Utc> {
    let secs = wall_time.trunc() as i64;
    let nanos = ((wall_time - wall_time.trunc()) * 1e9) as u32;
    DateTime::from_timestamp(secs, nanos).unwrap_or(DateTime::UNIX_EPOCH)
}
