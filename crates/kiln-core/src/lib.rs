//! Kiln Core - Foundational types for the kiln generation pipeline
//!
//! This crate provides the types shared by the generation library and the CLI:
//! - `TaskKind`, `TaskStatus` - Remote task vocabulary
//! - `ContentHash` - SHA-256 based content hashing of saved assets
//! - Error types and Result alias

mod error;
mod hash;
mod types;

pub use error::{KilnError, Result};
pub use hash::ContentHash;
pub use types::{TaskKind, TaskStatus};
