pub mod field_extractor;
pub mod llm_service;
pub mod submission_sink;
pub mod text_extractor;

pub use field_extractor::{FieldExtractor, LlmFieldExtractor};
pub use llm_service::LlmService;
pub use submission_sink::{LogSubmissionSink, Submission, SubmissionReceipt, SubmissionSink};
pub use text_extractor::{ExtractedText, PdfTextExtractor, TextExtractor};
