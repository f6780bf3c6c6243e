use std::process::ExitCode;

use send_email::config::load_dotenv;
use send_email::{Config, EmailClient, SendError, report};
use tracing::{Level, error};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Diagnostics go to stderr; stdout is reserved for the lines the runner reads.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(Level::WARN.into())
                .from_env_lossy(),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "send failed");
            println!("{}", err.annotation());
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), SendError> {
    load_dotenv(".env")?;
    let config = Config::from_env()?;
    let receipt = EmailClient::new().send(&config).await?;

    report(&receipt, std::io::stdout().lock())?;
    Ok(())
}
