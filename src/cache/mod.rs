//! Cache Engine Module
//!
//! The node-local half of the cluster: everything that happens between an
//! incoming `get` and the decision to go to a peer or the origin.
//!
//! ## Core Concepts
//! - **Two tiers**: the main tier holds keys this node owns under the ring
//!   and serves from its origin loader; the hot tier holds foreign keys that
//!   external policy decided to pin locally.
//! - **Loader fan-in**: concurrent misses on one key collapse into a single
//!   origin fetch through the in-flight coalescer.
//! - **Bounded residency**: each tier is an LRU store with a byte budget and
//!   jittered per-entry TTL.
//!
//! ## Submodules
//! - **`byteview`**: the immutable value type handed to callers.
//! - **`lru`**: the TTL-aware, byte-budgeted LRU store.
//! - **`tier`**: one lock-wrapped, lazily created store; groups hold two.
//! - **`singleflight`**: the request coalescer.
//! - **`group`**: the namespace facade tying it all together.

pub mod byteview;
pub mod group;
pub mod lru;
pub mod singleflight;
pub mod tier;
