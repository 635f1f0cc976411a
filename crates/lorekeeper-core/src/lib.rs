//! # Lorekeeper Core
//!
//! Shared retrieval logic for Lorekeeper: data models, the document store
//! abstraction, excerpt extraction, context assembly, the rule-based
//! answer formatter, and the hallucination filter.
//!
//! This crate contains no tokio, sqlx, filesystem I/O, or other
//! native-only dependencies. Everything here operates on plain strings
//! and the [`store::DocumentStore`] trait, so any storage backend with
//! text-relevance search can drive the pipeline.

pub mod answer;
pub mod context;
pub mod excerpt;
pub mod filter;
pub mod models;
pub mod store;
