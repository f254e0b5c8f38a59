//! Block Home Engine - all server-side code.
//!
//! Layered the usual way: `infrastructure::ports` defines the boundaries
//! (renderer, content store, wallet provider, token registry, LLM),
//! `infrastructure` holds the concrete adapters, `use_cases` orchestrates
//! them over the shared `stores`, and `api` is the HTTP surface.

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod stores;
pub mod use_cases;
