use colored::*;
use manga2pdf::{
    parse_args, ChromeRenderer, CliOptions, Downloader, Error, ReqwestTransport, SiteConfig,
    TracingProgress, USAGE,
};
use std::process;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

async fn download(options: CliOptions) -> Result<(), Error> {
    let config = SiteConfig::default();
    let transport = ReqwestTransport::new(&config)?;
    let renderer = ChromeRenderer::launch(&config).await?;

    let downloader = Downloader::new(renderer, transport, TracingProgress, config, ".");
    let result = downloader.run(&options).await;

    downloader.into_renderer().close().await;
    result.map(|_| ())
}

#[tokio::main]
async fn main() {
    // Set up logging with chromiumoxide errors suppressed
    let filter = EnvFilter::from_default_env()
        .add_directive("chromiumoxide::conn=off".parse().unwrap())
        .add_directive("chromiumoxide::handler=off".parse().unwrap())
        .add_directive("manga2pdf=info".parse().unwrap());

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let result = match parse_args(std::env::args().skip(1)) {
        Ok(options) => download(options).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {}
        Err(Error::HelpRequested) => println!("{}", USAGE),
        Err(e) => {
            error!("{}", format!("Error: {}", e).red());
            process::exit(1);
        }
    }
}
