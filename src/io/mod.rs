//! Input/output helpers.
//!
//! - file-based job store and JSON artifacts (`store`)
//! - image header checks before analysis (`images`)
//! - cost item exports (CSV) (`export`)

pub mod export;
pub mod images;
pub mod store;

pub use export::*;
pub use images::*;
pub use store::*;
