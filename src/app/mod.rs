pub mod changelog;
pub mod code_check;
pub mod extract;
pub mod gaps;
pub mod generator;
pub mod manifest;
pub mod notify;
pub mod readme;
pub mod report;
pub mod selector;
pub mod stats;
pub mod validate;

pub use code_check::CodeCheckPipeline;
pub use extract::ExtractPipeline;
pub use manifest::ScanPipeline;
pub use readme::ReadmePipeline;
pub use report::ReportPipeline;
pub use stats::StatsPipeline;
pub use validate::ValidatePipeline;
