//! Deterministic random number generation
//!
//! Uses the xorshift64* algorithm, re-seeded at the start of every tick from
//! `global_seed + tick`. CRITICAL: All randomness in the simulation MUST go
//! through this module, and never through a generator seeded from time.

mod xorshift;

pub use xorshift::{tick_seed, RngManager};
