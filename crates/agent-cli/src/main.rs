//! crypto-agent CLI
//!
//! Interactive loop over the crypto agent: one line in, one reply out.

mod repl;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_runtime::{TogetherConfig, TogetherProvider};
use crypto_agent::{
    AgentConfig, CoinGeckoClient, CryptoAgent, PriceCache, Settings,
    config::DEFAULT_CONFIG_PATH,
};

#[derive(Debug, Parser)]
#[command(name = "crypto-agent", version, about = "Ask a multilingual assistant about crypto prices")]
struct Args {
    /// Settings file with cache_duration and rate_limit_delay
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the chat model (defaults to TOGETHER_MODEL or the built-in model)
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they never interleave with the conversation
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();
    let args = Args::parse();

    let settings = Settings::load(&args.config)?;
    let mut provider_config = TogetherConfig::from_env()?;
    if let Some(model) = args.model {
        provider_config = provider_config.with_model(model);
    }
    let provider = Arc::new(TogetherProvider::from_config(provider_config)?);
    tracing::info!(model = provider.model(), "Provider configured");

    let prices = Arc::new(PriceCache::new(Arc::new(CoinGeckoClient::new()?)));
    let config = AgentConfig::new(provider.model(), settings);
    let mut agent = CryptoAgent::new(provider, prices, config);

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    repl::print_banner(&mut std::io::stdout())?;
    repl::run(&mut agent, stdin, &mut std::io::stdout()).await?;

    Ok(())
}
