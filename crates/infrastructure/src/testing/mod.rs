//! Response testing infrastructure.
//!
//! This module provides the validators and the test runner that executes
//! assertions against HTTP responses.

mod runner;
mod validators;

pub use runner::TestRunner;
pub use validators::{
    validate_api_response_structure, validate_contains_text, validate_embedding_models_response,
    validate_exact_text, validate_models_response, validate_records, validate_sse_contains_text,
    validate_tools_response, validate_virtual_assistants_response,
};
