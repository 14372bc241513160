//! Result output
//!
//! - `text`: the match listing and `RESULTS FOUND` summary on stdout, plus an
//!   optional human-readable statistics block
//! - `json`: a machine-readable run report

pub mod json;
pub mod text;
