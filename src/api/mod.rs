pub mod models;
pub mod translator;

pub use models::{SourceKind, SourceMetadata, TranslationRecord};
pub use translator::{SignTranslator, TranslatorError};
