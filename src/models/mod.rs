mod record;
mod session;

pub use record::{Record, RecordDraft, MISSING_FIELDS_MESSAGE};
pub use session::{Credential, Identity};

pub(crate) use record::is_blank;
