use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser};
use env_logger::Env;
use tokio::net::TcpListener;

use imgsquash::routes::{router, AppState};

/// CLI options
#[derive(Parser, Debug)]
#[command(author, version, about = "Image recompression API (WebP / MozJPEG / OxiPNG)")]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port for the HTTP server
    #[arg(long, default_value = "8000")]
    port: u16,

    /// Include internal error details in error responses
    #[arg(long, action = ArgAction::SetTrue)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let debug = args.debug || std::env::var("DEBUG").is_ok();
    let app = router(AppState { debug });

    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow!("Failed to bind to {}: {}", addr, e))?;

    log::info!("🚀 imgsquash running at http://{}", addr);
    log::info!("🔧 Debug mode: {}", debug);

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow!("Server error: {}", e))?;

    Ok(())
}
