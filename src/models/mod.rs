pub mod category;
pub mod document;
pub mod fields;
pub mod loaders;
pub mod store_in;

pub use category::{normalize_category, CATEGORIES};
pub use document::{
    BatchResult, DocumentSummary, PipelineOutcome, ProcessedDocument, SelectedFile, MAX_FILE_SIZE,
};
pub use fields::{field_options, Confidence, ExtractedFields, FieldExtraction, REQUIRED_FIELDS};
pub use loaders::{load_all_pdf_files, load_selected_file};
pub use store_in::{StoreIn, STORE_IN_OPTIONS};
