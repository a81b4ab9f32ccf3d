//! Story Script — parser for annotation-tagged visual novel scripts.
//!
//! Converts line-oriented story scripts (bracketed directive tags mixed
//! with dialogue lines) into a typed command sequence, reconstructs the
//! branching decision blocks, and projects a finished scene back into a
//! plain dialogue transcript.

pub mod core;
pub mod schema;
