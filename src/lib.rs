//! # Lorekeeper
//!
//! A retrieval-augmented lore chatbot over a wiki knowledge base.
//!
//! Lorekeeper stores scraped wiki pages in SQLite, retrieves the pages
//! most relevant to a free-text question, assembles bounded excerpts
//! into a context string, and answers either through a remote language
//! model or a rule-based formatter — degrading gracefully whenever a
//! backend is missing or failing.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────┐   ┌───────────┐
//! │  Import   │──▶│    SQLite      │──▶│  Context   │
//! │ txt/jsonl │   │ FTS5 documents │   │ assembler  │
//! └──────────┘   └───────────────┘   └─────┬─────┘
//!                                          │
//!                      ┌───────────────────┤
//!                      ▼                   ▼
//!                 ┌──────────┐       ┌──────────┐
//!                 │   CLI    │       │   HTTP   │
//!                 │  (lore)  │       │  (axum)  │
//!                 └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! lore init                      # create database
//! lore import assets/data        # ingest scraped pages
//! lore search "Jon Snow"
//! lore ask "Who is Jon Snow?"
//! lore chat                      # interactive loop
//! lore serve                     # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`chat`] | Chatbot pipeline and interactive loop |
//! | [`entities`] | Derived character/house/location index |
//! | [`generator`] | Remote generator backends |
//! | [`import`] | Document import pipeline |
//! | [`search`] | Ranked search command |
//! | [`server`] | HTTP query endpoint |
//! | [`sqlite_store`] | SQLite store backend |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod chat;
pub mod config;
pub mod db;
pub mod entities;
pub mod generator;
pub mod import;
pub mod migrate;
pub mod search;
pub mod server;
pub mod sqlite_store;
pub mod stats;
