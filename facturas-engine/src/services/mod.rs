pub mod memory;
pub mod metrics;
pub mod store;

pub use memory::MemoryStore;
pub use store::{InvoiceStore, StoreError, VersionedInvoice, VersionedQuote};
