//! Verikit binary.

use std::process::ExitCode;

use verikit::ChatCheck;
use verikit_domain::HarnessConfig;

#[tokio::main]
async fn main() -> ExitCode {
    verikit::init_tracing();

    let config = match HarnessConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Starting Verikit v{}", env!("CARGO_PKG_VERSION"));
    for line in config.to_string().lines() {
        tracing::info!("{line}");
    }

    let chat = ChatCheck::from_env();
    match verikit::run(&config, chat.as_ref()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
