//! Shared identifier types.

mod scan_id;

pub use scan_id::{ScanId, ScanIdError};
