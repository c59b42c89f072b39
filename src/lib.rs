//! Timesheet core: department hierarchy and time aggregation over a SQLite
//! store.

pub mod aggregate;
pub mod db;
pub mod error;
pub mod models;
pub mod policy;
pub mod tree;

pub use error::{Entity, Error, Result};
