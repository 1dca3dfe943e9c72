//! # Run Ledger
//!
//! A local-first experiment logging harness for ML training runs.
//!
//! Run Ledger reads TensorBoard scalar event logs and workspace metadata
//! (git remotes/commit/dirty state, dependency lists), assembles them
//! into normalized run and metric documents, and pushes them to a
//! document store, with an optional object-store path reference for the
//! uploaded log directory.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌───────────┐
//! │ Event logs    │──▶│  Assembly    │──▶│  MongoDB   │
//! │ Git/Reqs/YAML │   │ run+metrics │   │ runs+metrics│
//! └──────────────┘   └─────────────┘   └─────┬─────┘
//!                                            │
//!                          ┌─────────────────┤
//!                          ▼                 ▼
//!                     ┌──────────┐     ┌──────────┐
//!                     │   CLI    │     │  S3 path  │
//!                     │  (rled)  │     │ references │
//!                     └──────────┘     └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! rled push --name baseline --params params.yaml --logdir ./runs/baseline
//! rled export csv --logdir ./runs/baseline --out scalars.csv
//! rled paths --name baseline          # comma-joined object paths
//! rled status                         # collaborator health
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML harness configuration |
//! | [`models`] | Run, metric, and metadata document types |
//! | [`document`] | YAML/CSV experiment config documents |
//! | [`event_log`] | TensorBoard scalar event reading and export |
//! | [`git_info`] | Workspace version-control inspection |
//! | [`requirements`] | Dependency list scanning |
//! | [`entry`] | Log-entry assembly |
//! | [`db`] | Document-store connection |
//! | [`object_store`] | Object-store client |
//! | [`store`] | Run/metric persistence and the push flow |

pub mod config;
pub mod db;
pub mod document;
pub mod entry;
pub mod event_log;
pub mod export;
pub mod git_info;
pub mod models;
pub mod object_store;
pub mod paths;
pub mod push;
pub mod requirements;
pub mod status;
pub mod store;
