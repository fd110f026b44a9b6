//! Reference-database (DAT) support: parsing and hash-based matching.
//!
//! DATs are community-curated lists of known-good dumps. This crate parses
//! them (Logiqx XML and ClrMamePro formats) and builds per-system
//! in-memory indexes for the two-tier verification policy: cryptographic
//! hash → verified, fast checksum only → mismatch, neither → unknown.

pub mod dat;
pub mod error;
pub mod index;

pub use dat::{parse_dat, parse_dat_file, DatFile, DatGame, DatRom};
pub use error::DatError;
pub use index::{FileDigests, RefMatch, ReferenceIndex};
