//! Domain layer for the salon customer register.
//!
//! Everything in this crate is synchronous and free of I/O. Persistence is
//! delegated to a [`backend::CustomerBackend`] supplied by the caller.

pub mod backend;
pub mod directory;
pub mod error;
pub mod export;
pub mod kana;
pub mod ledger;
pub mod types;

pub use backend::{CustomerBackend, MemoryBackend};
pub use directory::{group_by_phonetic_row, Directory, PhoneticGroups, PhoneticRow};
pub use error::{
    BackendError, DirectoryError, ExportError, ExportKind, LedgerError, ValidationError,
};
pub use export::CsvExporter;
pub use kana::{KanaCollator, RowLabel};
pub use ledger::{DiscountStatus, VisitLedger};
pub use types::{Customer, CustomerId, NewCustomer, VisitRecord};
