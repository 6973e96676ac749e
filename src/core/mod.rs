pub mod error;
pub mod record;

pub use error::{Result, TxnError};
pub use record::{RecordId, WriteOutcome, WriteRecord};
