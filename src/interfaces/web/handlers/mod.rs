pub mod analyze;
pub mod batch;
pub mod jobs;
pub mod tokens;
