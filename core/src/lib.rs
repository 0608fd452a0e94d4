//! SHARDSTATE Core Library
//! 
//! Core types, traits, and abstractions for the SHARDSTATE sharded state store.
//! This crate provides the foundation for all other SHARDSTATE components.

pub mod types;
pub mod traits;
pub mod error;
pub mod config;

pub use types::*;
pub use traits::*;
pub use error::*;
pub use config::*;
