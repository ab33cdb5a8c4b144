//! Heuristic raw-text importers.
//!
//! Both importers share one control flow, implemented in [`segment`]: a
//! single forward pass that classifies each line, opens a scene on a
//! boundary line, accumulates body lines, and finalizes the open scene on
//! the next boundary or at end of input. They differ only in their
//! [`segment::BoundaryRules`] and in what they derive from a finished
//! segment.
//!
//! - [`text_parser`] turns pasted chat/prose text into formatted scenes with
//!   inferred mood, location, tags and branch-point candidacy.
//! - [`manuscript`] plans the bulk ingestion of one long manuscript file,
//!   routing scenes to a fixed set of timelines.
//!
//! Both are deterministic: identical input yields identical output.

pub mod manuscript;
pub mod rules;
pub mod segment;
pub mod text_parser;

pub use text_parser::{parse, parse_with_stats, ParseStats, ParsedScene};
