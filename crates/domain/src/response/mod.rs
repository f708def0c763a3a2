//! Received response description and body access.

mod body;
mod spec;

pub use body::BodyText;
pub use spec::ResponseSpec;
