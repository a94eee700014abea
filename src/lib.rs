//! # HealthMate
//!
//! A retrieval-grounded medical Q&A assistant over a local PDF corpus.
//!
//! HealthMate ingests a directory of medical PDFs, chunks and embeds them
//! into a local SQLite store, and answers health questions grounded in the
//! retrieved passages via an Ollama-hosted model. Answers are exposed
//! through a one-shot CLI, an interactive terminal chat, and an HTTP chat
//! server.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────┐
//! │  PDF corpus │──▶│  Pipeline    │──▶│  SQLite   │
//! │ (documents) │   │ Chunk+Embed │   │ vectors   │
//! └─────────────┘   └─────────────┘   └────┬─────┘
//!                                          │
//!                      ┌───────────────────┤
//!                      ▼                   ▼
//!                 ┌──────────┐       ┌──────────┐
//!                 │   CLI    │       │   HTTP   │
//!                 │ (hmate)  │       │  (chat)  │
//!                 └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! hmate init                    # create the store
//! hmate ingest                  # index the PDF corpus
//! hmate embed pending           # backfill embeddings
//! hmate ask "What causes migraines?"
//! hmate serve                   # start the web chat
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`documents`] | PDF discovery and text extraction |
//! | [`chunk`] | Text chunking |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`llm`] | Chat-model client |
//! | [`ingest`] | Ingestion pipeline |
//! | [`query`] | Query expansion, retrieval, and grounded answering |
//! | [`session`] | Chat session storage and transcript export |
//! | [`render`] | Markdown-to-HTML response cleanup |
//! | [`suggest`] | Follow-up suggestions and quick actions |
//! | [`server`] | HTTP chat server |
//! | [`repl`] | Terminal chat loop |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod chunk;
pub mod config;
pub mod db;
pub mod documents;
pub mod embed_cmd;
pub mod embedding;
mod http;
pub mod ingest;
pub mod llm;
pub mod migrate;
pub mod models;
pub mod query;
pub mod render;
pub mod repl;
pub mod server;
pub mod session;
pub mod stats;
pub mod suggest;
