//! Consistent Hashing Module
//!
//! Assigns keys to peers so that every node computes the same ownership map
//! independently, and so that membership changes relocate only the keys whose
//! ring segment actually moved (about `1/n` of them when a node joins an
//! `n`-node cluster).
//!
//! ## Mechanism
//! - **Virtual nodes**: each peer is hashed onto the ring `replicas` times to
//!   flatten placement skew.
//! - **Lookup**: a key hashes to a position; the first virtual node at or
//!   after that position (wrapping around) owns it.
//! - **Hash**: CRC32 by default, overridable; whatever function is chosen
//!   must agree cluster-wide.

pub mod hash_ring;

#[cfg(test)]
mod tests;
