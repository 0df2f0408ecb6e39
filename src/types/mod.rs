pub mod job_record;
pub mod response;

pub use job_record::{JobRecord, SavedJob};
pub use response::{ExtractRequest, ExtractResponse};
