use anyhow::Context;
use clap::Parser;
use randomness::{
    aggregator::EmptyPoolPolicy,
    social::{
        ApifyScraper,
        apify::DEFAULT_APIFY_BASE_URL,
    },
};
use server::app::{
    App,
    RunState,
    actix_query_api::ActixQueryApi,
    init_tracing,
};
use url::Url;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long)]
    port: Option<u16>,

    /// Token for the scraping service. Without it the server starts but
    /// every social interactions request fails.
    #[arg(long, env = "APIFY_API_TOKEN", hide_env_values = true)]
    apify_token: Option<String>,

    #[arg(long, default_value = DEFAULT_APIFY_BASE_URL)]
    scraper_url: Url,

    /// Fill empty pools with labelled demo participants.
    #[arg(long, default_value = "false")]
    demo_fallback: bool,

    #[arg(short, long, default_value = "false")]
    tracing: bool,
}

async fn handle_interupt() {
    let res = tokio::signal::ctrl_c().await;
    match res {
        Ok(_) => {
            tracing::info!("Received interrupt, exiting");
        }
        Err(_) => {
            tracing::warn!("Received interrupt error, exiting anyway");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if args.tracing {
        init_tracing();
    }

    let source = match args.apify_token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => Some(
            ApifyScraper::with_base_url(args.scraper_url.as_str(), token)
                .context("configuring scraper client")?,
        ),
        _ => {
            tracing::warn!(
                "APIFY_API_TOKEN not set; social interactions requests will fail"
            );
            None
        }
    };
    let policy = if args.demo_fallback {
        tracing::info!("Demo fallback enabled for empty participant pools");
        EmptyPoolPolicy::SynthesizeDemo
    } else {
        EmptyPoolPolicy::ReturnEmpty
    };

    let api = ActixQueryApi::new(args.port).await?;
    let mut app = App::new(api, source, policy);

    tracing::info!("Starting randomness server");
    loop {
        let interrupt = handle_interupt();
        match app.run(interrupt).await? {
            RunState::Continue => continue,
            RunState::Exit => {
                tracing::info!("Exiting randomness server");
                return Ok(());
            }
        }
    }
}
