//! Syncwatch persistence layer
//!
//! The only table is the upload history used for deduplication. See
//! [`LedgerRepository`].

pub mod db;

pub use db::{connect, LedgerRepository};
