pub mod identifier;
pub mod record;
pub mod source;

pub use identifier::{IdentKind, PersistentId, RecordIdent};
pub use record::{Record, canonical_title};
pub use source::SourceKind;
