//! Persistence of assembled run and metric documents.
//!
//! The [`RunStore`] trait is the storage seam: [`MongoStore`] writes to
//! the document store's `runs` and `metrics` collections, and
//! [`MemoryStore`] backs tests. [`Connector`] owns a store, an
//! object-store handle, and a [`Vcs`] probe, and drives the push flow.
//!
//! # Operations
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`Connector::insert_run`] | Insert one run document |
//! | [`Connector::insert_metrics`] | Insert the metric documents of a run |
//! | [`Connector::push_experiment`] | Allocate an id, assemble, and persist a run |
//! | [`Connector::gather_paths`] | Comma-join stored object paths for `--logdir_spec` |
//!
//! # Consistency
//!
//! Run ids are allocated as `max(existing) + 1` by reading the current
//! maximum — a read-then-write sequence with no reservation, so two
//! concurrent writers can observe the same maximum and collide. The push
//! itself is two separate inserts with no transaction: a crash between
//! them leaves a run document whose metric links point at records that
//! were never written. Both gaps are inherited behavior kept behind this
//! interface; a CAS-capable [`RunStore`] could close the first without
//! touching callers.

use std::path::Path;
use std::sync::RwLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Document};
use futures::TryStreamExt;
use mongodb::Database;
use tracing::{debug, info};

use crate::config::Config;
use crate::db;
use crate::entry::make_log_entries;
use crate::git_info::{GitCli, Vcs};
use crate::models::{ArtifactPlaceholder, MetricBundle, MetricRecord, RunRecord};
use crate::object_store::ObjectStoreClient;

/// Error returned for the artifact slot, which the store cannot persist.
#[derive(Debug, thiserror::Error)]
#[error("artifact storage is not implemented")]
pub struct ArtifactsUnsupported;

/// Abstract run/metric storage backend.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Highest run id currently stored, or `None` for an empty store.
    async fn max_run_id(&self) -> Result<Option<i64>>;

    /// Insert one run document; returns its id.
    async fn insert_run(&self, run: &RunRecord) -> Result<i64>;

    /// Insert metric documents; returns their ids in input order.
    async fn insert_metrics(&self, metrics: &[MetricRecord]) -> Result<Vec<ObjectId>>;

    /// Stored object paths of runs matching `filter`, in id order.
    async fn log_paths(&self, filter: Document) -> Result<Vec<String>>;
}

/// Document-store backend over the `runs` and `metrics` collections.
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RunStore for MongoStore {
    async fn max_run_id(&self) -> Result<Option<i64>> {
        let runs = self.db.collection::<Document>("runs");
        let last = runs.find_one(doc! {}).sort(doc! { "_id": -1 }).await?;
        match last {
            Some(doc) => Ok(Some(
                doc.get_i64("_id")
                    .context("runs document has a non-integer _id")?,
            )),
            None => Ok(None),
        }
    }

    async fn insert_run(&self, run: &RunRecord) -> Result<i64> {
        let doc = bson::to_document(run)?;
        self.db
            .collection::<Document>("runs")
            .insert_one(doc)
            .await?;
        Ok(run.id)
    }

    async fn insert_metrics(&self, metrics: &[MetricRecord]) -> Result<Vec<ObjectId>> {
        if metrics.is_empty() {
            return Ok(Vec::new());
        }
        self.db
            .collection::<MetricRecord>("metrics")
            .insert_many(metrics)
            .await?;
        Ok(metrics.iter().map(|metric| metric.id).collect())
    }

    async fn log_paths(&self, filter: Document) -> Result<Vec<String>> {
        let runs = self.db.collection::<Document>("runs");
        let mut cursor = runs.find(filter).sort(doc! { "_id": 1 }).await?;

        let mut paths = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            if let Ok(path) = doc.get_str("s3") {
                paths.push(path.to_string());
            }
        }
        Ok(paths)
    }
}

/// In-memory backend for tests. Filters support top-level equality
/// matches only.
#[derive(Default)]
pub struct MemoryStore {
    runs: RwLock<Vec<Document>>,
    metrics: RwLock<Vec<MetricRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run_count(&self) -> usize {
        self.runs.read().expect("runs lock poisoned").len()
    }

    pub fn metric_count(&self) -> usize {
        self.metrics.read().expect("metrics lock poisoned").len()
    }
}

fn matches(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, value)| doc.get(key) == Some(value))
}

#[async_trait]
impl RunStore for MemoryStore {
    async fn max_run_id(&self) -> Result<Option<i64>> {
        let runs = self.runs.read().expect("runs lock poisoned");
        Ok(runs
            .iter()
            .filter_map(|doc| doc.get_i64("_id").ok())
            .max())
    }

    async fn insert_run(&self, run: &RunRecord) -> Result<i64> {
        let doc = bson::to_document(run)?;
        self.runs.write().expect("runs lock poisoned").push(doc);
        Ok(run.id)
    }

    async fn insert_metrics(&self, metrics: &[MetricRecord]) -> Result<Vec<ObjectId>> {
        self.metrics
            .write()
            .expect("metrics lock poisoned")
            .extend_from_slice(metrics);
        Ok(metrics.iter().map(|metric| metric.id).collect())
    }

    async fn log_paths(&self, filter: Document) -> Result<Vec<String>> {
        let runs = self.runs.read().expect("runs lock poisoned");
        Ok(runs
            .iter()
            .filter(|doc| matches(doc, &filter))
            .filter_map(|doc| doc.get_str("s3").ok().map(str::to_string))
            .collect())
    }
}

/// Result of one [`Connector::push_experiment`] call.
#[derive(Debug, Clone)]
pub struct PushOutcome {
    pub run_id: i64,
    pub metric_ids: Vec<ObjectId>,
}

/// Store-facing handle combining run storage, the object-store client,
/// and workspace inspection.
pub struct Connector {
    store: Box<dyn RunStore>,
    object_store: ObjectStoreClient,
    vcs: Box<dyn Vcs>,
}

impl Connector {
    /// Connect to the configured document store and build the
    /// object-store handle.
    pub async fn connect(config: &Config) -> Result<Self> {
        let database = db::connect(&config.store).await?;
        Ok(Self::with_store(
            Box::new(MongoStore::new(database)),
            ObjectStoreClient::new(&config.object_store),
        ))
    }

    /// Build a connector over an explicit backend. Workspace inspection
    /// defaults to the `git` CLI.
    pub fn with_store(store: Box<dyn RunStore>, object_store: ObjectStoreClient) -> Self {
        Self {
            store,
            object_store,
            vcs: Box::new(GitCli),
        }
    }

    /// Replace the version-control probe.
    pub fn with_vcs(mut self, vcs: Box<dyn Vcs>) -> Self {
        self.vcs = vcs;
        self
    }

    pub fn object_store(&self) -> &ObjectStoreClient {
        &self.object_store
    }

    pub async fn insert_run(&self, run: &RunRecord) -> Result<i64> {
        self.store.insert_run(run).await
    }

    pub async fn insert_metrics(&self, metrics: &[MetricRecord]) -> Result<Vec<ObjectId>> {
        self.store.insert_metrics(metrics).await
    }

    /// Next run id: `max(existing) + 1`, or 1 for an empty store. See the
    /// module docs for the allocation race this inherits.
    pub async fn next_run_id(&self) -> Result<i64> {
        Ok(self.store.max_run_id().await?.map_or(1, |max| max + 1))
    }

    /// Assemble and persist one run: allocate the id, build the three
    /// documents, attach the optional object-store path, insert the run
    /// document, then the metric documents.
    pub async fn push_experiment(
        &self,
        name: &str,
        config: Document,
        metrics: &MetricBundle,
        git_parent_dir: &Path,
        requirements_file: Option<&Path>,
        s3: Option<String>,
    ) -> Result<PushOutcome> {
        let id = self.next_run_id().await?;
        debug!(id, name, "assembling log entries");

        let mut entries = make_log_entries(
            self.vcs.as_ref(),
            id,
            name,
            config,
            metrics,
            git_parent_dir,
            requirements_file,
        )?;
        entries.run.s3 = s3;

        // Two inserts, no transaction: a crash here orphans the run
        // document (see module docs).
        let run_id = self.store.insert_run(&entries.run).await?;
        let metric_ids = self.store.insert_metrics(&entries.metrics).await?;

        info!(run_id, metrics = metric_ids.len(), "pushed experiment");
        Ok(PushOutcome { run_id, metric_ids })
    }

    /// Comma-joined object paths of runs matching `filter`, for a
    /// multi-run visualization spec.
    pub async fn gather_paths(&self, filter: Document) -> Result<String> {
        Ok(self.store.log_paths(filter).await?.join(","))
    }

    /// Artifact persistence is recognized but not implemented.
    pub async fn insert_artifacts(
        &self,
        _run_id: i64,
        _artifacts: &ArtifactPlaceholder,
    ) -> Result<()> {
        Err(ArtifactsUnsupported.into())
    }
}
