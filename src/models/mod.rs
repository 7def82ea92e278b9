pub mod batch;
pub mod destination;
pub mod document;
pub mod loaders;
pub mod media_type;

pub use batch::{Batch, BatchSummary};
pub use destination::{Destination, UserProfile};
pub use document::{
    DocumentPayload, DocumentSubmission, ExtractedFields, ExtractionState, ExtractionStatus,
    StorageState, StorageStatus, SubmissionView, PDF_MEDIA_TYPE,
};
pub use loaders::{load_input_files, load_single_file};
