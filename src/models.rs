//! Core data models used throughout Run Ledger.
//!
//! These types represent the run, metric, and metadata documents that flow
//! through the assembly pipeline into the document store. The wire format
//! mirrors what a Sacred-style observer would write, hence the
//! `PseudoSacred` format tag on run documents.

use std::collections::BTreeMap;

use bson::oid::ObjectId;
use bson::{Bson, Document};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Format tag stamped on every run document.
pub const RUN_FORMAT: &str = "PseudoSacred-0.0.1";

/// Status stamped on every run document. Runs are logged after the fact,
/// so the only status ever written is a completed one.
pub const RUN_STATUS: &str = "COMPLETED";

/// Version-control metadata for one repository, embedded in
/// [`ExperimentInfo::repositories`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitInfo {
    /// Remote URLs ending in a `.git` suffix, deduplicated and sorted.
    #[serde(rename = "url")]
    pub urls: Vec<String>,
    /// Current commit hash (40-char hex), or empty when the repository
    /// has no commits yet.
    pub commit: String,
    /// Whether the working tree has uncommitted changes.
    pub dirty: bool,
}

/// Supplementary details about the experiment a run belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentInfo {
    pub name: String,
    pub repositories: Vec<GitInfo>,
    pub dependencies: Vec<String>,
}

/// Reference from a run document to one of its metric documents.
///
/// Embedded under `info.metrics` so consumers can join run → metrics
/// without a foreign-key constraint in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricLink {
    pub name: String,
    pub id: String,
}

/// The `info` block of a run document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInfo {
    pub metrics: Vec<MetricLink>,
}

/// One logged execution of an experiment (`db.runs` document).
///
/// `_id` is a monotonic integer assigned as `max(existing) + 1` by the
/// store layer. Assignment is a read-then-write sequence and is only safe
/// under a single-writer assumption; see [`crate::store`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    #[serde(rename = "_id")]
    pub id: i64,
    pub config: Document,
    pub experiment: ExperimentInfo,
    pub info: RunInfo,
    pub format: String,
    pub status: String,
    pub result: Option<Bson>,
    pub resources: Vec<Bson>,
    pub artifacts: Vec<Bson>,
    pub captured_out: String,
    pub host: Vec<Bson>,
    /// Object-store path reference, present only when supplied by the
    /// caller at push time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<String>,
}

impl RunRecord {
    /// Build a run record from its variable parts, filling the fixed
    /// placeholder block of the PseudoSacred format.
    pub fn new(
        id: i64,
        config: Document,
        experiment: ExperimentInfo,
        metrics: Vec<MetricLink>,
    ) -> Self {
        Self {
            id,
            config,
            experiment,
            info: RunInfo { metrics },
            format: RUN_FORMAT.to_string(),
            status: RUN_STATUS.to_string(),
            result: None,
            resources: Vec::new(),
            artifacts: Vec::new(),
            captured_out: String::new(),
            host: Vec::new(),
            s3: None,
        }
    }
}

/// One named scalar series of a run (`db.metrics` document).
///
/// `steps`, `timestamps`, and `values` are parallel arrays of equal
/// length; [`crate::entry::make_log_entries`] preserves the input series
/// as-is and never reorders them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub run_id: i64,
    pub name: String,
    pub steps: Vec<i64>,
    pub timestamps: Vec<bson::DateTime>,
    pub values: Vec<f64>,
}

/// Aligned arrays of one scalar series, before assembly into a
/// [`MetricRecord`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricSeries {
    pub steps: Vec<i64>,
    pub timestamps: Vec<DateTime<Utc>>,
    pub values: Vec<f64>,
}

impl MetricSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Named scalar series keyed by metric name. A `BTreeMap` keeps the
/// assembly order deterministic.
pub type MetricBundle = BTreeMap<String, MetricSeries>;

/// Placeholder for the artifact slot of an assembled push.
///
/// Artifact storage (content-addressed chunked blobs) is recognized but
/// not implemented; every assembly returns this placeholder so the gap is
/// visible to callers instead of silently dropped. Attempting to persist
/// it yields [`crate::store::ArtifactsUnsupported`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArtifactPlaceholder;
