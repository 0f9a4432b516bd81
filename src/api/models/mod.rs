pub mod record;

pub use record::{SourceKind, SourceMetadata, TranslationRecord};
