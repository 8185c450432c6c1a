//! Distributed Cache Cluster Library
//!
//! This library crate defines the modules that make up a cache node.
//! It serves as the foundation for the binary executable (`main.rs`).
//!
//! ## Architecture Modules
//! The system is composed of five loosely coupled subsystems:
//!
//! - **`cache`**: The node-local cache engine: named groups over a two-tier
//!   (owned + hot) LRU store with per-entry TTL, and the single-flight
//!   coalescer that collapses concurrent misses into one origin fetch.
//! - **`ring`**: The consistent-hash ring that assigns keys to peers with
//!   virtual nodes, so every node independently computes the same ownership.
//! - **`peers`**: The inter-node transport: peer picker/client contracts,
//!   the HTTP adapter built on them, and the axum handlers that expose the
//!   cache to clients and to other nodes.
//! - **`registry`**: Lease-based peer discovery over UDP; instances advertise
//!   under a service name and vanish one lease period after going silent.
//! - **`config`**: Environment-driven node configuration.

pub mod cache;
pub mod config;
pub mod error;
pub mod peers;
pub mod registry;
pub mod ring;
