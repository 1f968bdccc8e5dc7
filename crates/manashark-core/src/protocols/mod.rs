//! Protocol decoding modules.
//!
//! Each protocol follows a layered structure:
//! - `layout`: field widths and record shapes (source of truth)
//! - `table`: opcode dispatch data built from layouts
//! - `parser`: the decode loop (no direct byte indexing)
//! - `error`: explicit, actionable errors
//!
//! Byte access goes through the shared `common::cursor`. Parsers are pure and
//! contain no I/O; sources and session layers handle file access and
//! aggregation.

pub(crate) mod common;
pub mod manaplus;
