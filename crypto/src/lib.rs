//! SHARDSTATE Cryptography Module
//! 
//! Content-addressing primitives built on SHA-256:
//! - node digests
//! - global root aggregation
//! - key partitioning

pub mod hashing;

pub use hashing::*;
