//! # sitesage
//!
//! A retrieval-augmented question answering service for a single website.
//!
//! At startup, sitesage fetches the target site, splits the text into
//! overlapping chunks, embeds them, and builds an in-memory nearest-neighbor
//! index. Each incoming question is triaged first — greetings, thanks, and
//! other chit-chat get canned replies without touching a provider — and
//! everything else is answered by a chat model grounded in the most relevant
//! chunks.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────┐   ┌─────────────┐
//! │  Corpus   │──▶│   Pipeline    │──▶│ KnowledgeBase│
//! │ fetch/file│   │ Chunk + Embed │   │ chunks+index │
//! └──────────┘   └───────────────┘   └──────┬──────┘
//!                                           │
//!                  query ──▶ Triage ──┬─────┤
//!                                     │     ▼
//!                               canned│  Retrieve ──▶ Chat ──▶ answer
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! sitesage corpus                 # fetch the site, show chunk stats
//! sitesage ask "how much is the pro plan"
//! sitesage serve                  # start the HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`corpus`] | Corpus acquisition (HTTP fetch or local file) |
//! | [`chunk`] | Sliding-window text chunking |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`index`] | Exact nearest-neighbor vector index |
//! | [`kb`] | Knowledge base: chunks + index + embedder |
//! | [`triage`] | Pre-retrieval query triage |
//! | [`answer`] | Grounded answer composition |
//! | [`server`] | HTTP question-answering server |

pub mod answer;
pub mod chunk;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod index;
pub mod kb;
pub mod models;
pub mod server;
pub mod triage;
