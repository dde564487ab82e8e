pub mod batch;
pub mod extract;
pub mod fetch;
pub mod llm;
pub mod pipeline;
pub mod store;
