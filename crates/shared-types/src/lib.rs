//! # Shared Types Crate
//!
//! Protocol vocabulary used by every DV-Node subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: slot, epoch, height and round numbering and
//!   the beacon duty roles are defined once, here.
//! - **Closed Vocabulary**: roles are a fixed protocol enumeration; adding one
//!   is a protocol change, so every consumer matches on them exhaustively.

pub mod entities;

pub use entities::*;
