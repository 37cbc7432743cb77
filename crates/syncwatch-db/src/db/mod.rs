//! Database repositories and pool setup.

pub mod ledger;
pub mod pool;

pub use ledger::LedgerRepository;
pub use pool::connect;
