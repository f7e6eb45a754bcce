use anyhow::Result;
use ejp_knx::logging;
use ejp_knx::runner;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    if let Err(e) = logging::init_from_env() {
        eprintln!("logging setup failed: {}", e);
    }

    info!("starting ejp-knx version: {}", env!("CARGO_PKG_VERSION"));

    match runner::run_from_env().await {
        Ok(()) => {
            info!("EJP status written to KNX bus");
            Ok(())
        }
        Err(e) => {
            error!("Run failed with error: {}", e);
            Err(anyhow::anyhow!("ejp-knx error: {}", e))
        }
    }
}
