//! # Tabkeep Architecture
//!
//! Tabkeep is the **persistent core of a "save this page for later" tool**: a
//! self-healing store for saved browser pages and the user's settings, built on
//! a plain key-value backend that is assumed to fail, fill up, and corrupt.
//!
//! Capturing pages, summarizing them and rendering them are someone else's job.
//! This crate keeps what was captured safe.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (tabkeep-cli)                                          │
//! │  - Parses arguments, prints JSON, owns exit codes           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade, one method per operation                    │
//! │  - Turns Result<T> into {success, data?, error?}            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Stores (store/page_store.rs, store/settings_store.rs)      │
//! │  - Validation gate, dedup, snapshots before destruction     │
//! │  - Self-healing reads, quota eviction, migrations           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  KvBackend (store/backend.rs)                               │
//! │  - FsBackend (production), MemBackend (testing)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: Never Lose Data Silently
//!
//! - Every destructive operation snapshots pages and settings first.
//! - A read that finds a few broken records drops them and writes the survivors back.
//! - A read that finds wholesale corruption restores the newest snapshot.
//! - If nothing can restore it, the caller gets
//!   [`error::StoreError::UnrecoverableCorruption`] and the bad data stays put.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade and response envelope
//! - [`store`]: Backend trait, backends, page and settings stores
//! - [`model`]: `SavedPage`, `ExtensionSettings`, `StoreMetadata`
//! - [`validation`]: Validation and sanitization of records
//! - [`corruption`]: Wholesale corruption detection
//! - [`backup`]: Snapshots, pruning and recovery
//! - [`quota`]: Storage budget and eviction policies
//! - [`query`]: Search, filtering, sorting, pagination
//! - [`migration`]: Schema version steps
//! - [`config`]: Store configuration
//! - [`tags`]: Tag normalization
//! - [`error`]: Error types

pub mod api;
pub mod backup;
pub mod config;
pub mod corruption;
pub mod error;
pub mod migration;
pub mod model;
pub mod query;
pub mod quota;
pub mod store;
pub mod tags;
pub mod validation;
