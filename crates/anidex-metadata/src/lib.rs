//! # anidex-metadata
//!
//! Client for the external anime metadata service.
//!
//! This crate provides:
//! - [`JikanClient`], a Jikan v4 (MyAnimeList) implementation of
//!   [`anidex_core::MetadataProvider`]
//! - [`Pacer`], which enforces the minimum spacing between requests

pub mod jikan;
pub mod pacing;

// Re-export core types
pub use anidex_core::*;

pub use jikan::{JikanClient, JikanConfig};
pub use pacing::Pacer;
