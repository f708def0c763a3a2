//! Verikit Infrastructure - Adapters and validators
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, and the response validators.

pub mod adapters;
pub mod testing;

pub use adapters::{ReqwestHttpClient, TokioClock};
pub use testing::{
    TestRunner, validate_api_response_structure, validate_contains_text,
    validate_embedding_models_response, validate_exact_text, validate_models_response,
    validate_records, validate_sse_contains_text, validate_tools_response,
    validate_virtual_assistants_response,
};
