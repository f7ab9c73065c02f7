//! puzzle71: batched secp256k1 CPU scanner for the 71-bit Bitcoin puzzle.
//!
//! Architecture:
//! - `math`: field, group, and scalar arithmetic plus the generator table
//! - `crypto`: SHA-256/RIPEMD-160 specialized to the fixed hot-loop sizes
//! - `puzzle`: the search-space model (range, batch geometry, target)
//! - `scanner`: per-thread chunk walks with batched affine conversion
//! - `report` / `stats` / `selftest`: the durable found record, the
//!   progress sampler, and the startup correctness gate
//!
//! Workers only share two atomics (total counter, stop flag) and the
//! immutable generator table; everything else is thread-private.

pub mod address;
pub mod crypto;
pub mod error;
pub mod math;
pub mod puzzle;
pub mod report;
pub mod scanner;
pub mod selftest;
pub mod stats;
