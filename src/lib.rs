//! # CAG — context-augmented generation for restaurant menu Q&A
//!
//! CAG answers natural-language questions about a restaurant's menu. A
//! folder of markdown documents is chunked, embedded, and stored in a
//! persistent vector index once at startup; each query retrieves the
//! top-matching chunks and produces an answer either through a single
//! model call (fast path) or a three-stage analyze → augment → generate
//! pipeline.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────────┐   ┌───────────┐
//! │  Loader   │──▶│ Chunk+Embed  │──▶│  SQLite    │
//! │ (*.md)    │   │  (one-time)  │   │ vectors   │
//! └───────────┘   └──────────────┘   └─────┬─────┘
//!                                          │ top-k
//!                      ┌───────────────────┤
//!                      ▼                   ▼
//!                ┌───────────┐      ┌────────────┐
//!                │ fast path │  or  │ 3-stage    │
//!                │ (1 call)  │      │ pipeline   │
//!                └─────┬─────┘      └─────┬──────┘
//!                      └────── answer ────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export OPENAI_API_KEY=sk-...
//! cag init                      # one-time ingestion of the menu folder
//! cag ask "wine pairing for pasta?"
//! cag chat                      # interactive loop
//! cag serve                     # HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`chunk`] | Overlapping fixed-window chunker |
//! | [`extract`] | Markdown → plain text |
//! | [`loader`] | Document folder ingestion |
//! | [`store`] | Index store trait + SQLite/memory backends |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`ingest`] | One-time idempotent population |
//! | [`retrieve`] | Top-k retrieval with source attribution |
//! | [`generate`] | Chat provider + fast path |
//! | [`pipeline`] | Three-stage augmentation pipeline |
//! | [`engine`] | `process_query` strategy dispatch |
//! | [`server`] | HTTP API |
//! | [`jobs`] | Async job bookkeeping |

pub mod chunk;
pub mod config;
pub mod db;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod extract;
pub mod generate;
pub mod ingest;
pub mod jobs;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod repl;
pub mod retrieve;
pub mod server;
pub mod store;
