//! Transfer engine abstraction.
//!
//! This module provides the `TransferEngine` and `TransferHandle` traits the
//! download orchestrator drives, an embedded librqbit implementation and
//! descriptor (.torrent) parsing helpers.

mod descriptor;
mod librqbit;
mod types;

pub use descriptor::{is_descriptor_path, parse_descriptor_name, DESCRIPTOR_EXTENSION};
pub use librqbit::LibrqbitEngine;
pub use types::*;
