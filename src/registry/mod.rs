//! Service Registry Module
//!
//! Lease-based peer discovery over UDP. Each node advertises itself under a
//! service name and keeps the advertisement alive with periodic keepalive
//! frames; an instance whose keepalives stop arriving is dropped after one
//! lease period, so resolvers converge on the live peer set without any
//! external coordinator.
//!
//! ## Core Mechanisms
//! - **Register**: a joining node sends its full instance record to the seed
//!   nodes; every receiver answers with its current view of the cluster, so
//!   topology spreads in one round trip.
//! - **Keepalive**: renews the sender's lease on every receiver. The period
//!   is a third of the lease so a single lost datagram cannot expire a node.
//! - **Lease expiry**: a background sweep drops instances whose lease ran
//!   out; `resolve` only ever returns live instances.

pub mod service;
pub mod types;

#[cfg(test)]
mod tests;
