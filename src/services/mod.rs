pub mod extraction_service;

pub use extraction_service::{parse_extraction_response, prompt_with_schema, response_schema};
