//! Port adapters.

mod reqwest_client;
mod tokio_clock;

pub use reqwest_client::ReqwestHttpClient;
pub use tokio_clock::TokioClock;
