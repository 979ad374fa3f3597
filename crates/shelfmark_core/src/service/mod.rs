//! Catalog use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into atomic, audited catalog operations.
//! - Expose continuously updating reads to presentation callers.

pub mod catalog_service;
pub mod live_query;
