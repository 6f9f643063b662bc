use std::path::Path;
use std::time::Duration;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use basecard::config::Config;
use basecard::explorer::ExplorerClient;
use basecard::identity::types::Identity;
use basecard::identity::IdentityService;
use basecard::names::LookupChain;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let config_path = Path::new("basecard.toml");
    let config = if config_path.exists() {
        Config::load(config_path)?
    } else {
        Config::from_env()
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
    if config.logging.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let json_output = args.iter().any(|a| a == "--json");
    args.retain(|a| a != "--json");
    let address = match args.into_iter().next() {
        Some(addr) => addr,
        None => {
            eprintln!("Usage: basecard <address> [--json]");
            eprintln!("Example: basecard 0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045 --json");
            std::process::exit(2);
        }
    };

    info!(version = env!("CARGO_PKG_VERSION"), "basecard starting");

    let service = IdentityService::new(
        ExplorerClient::new(config.explorer.clone()),
        LookupChain::new(config.names.clone()),
        Duration::from_millis(config.explorer.transfer_pause_ms),
    );

    match service.compute(&address).await {
        Ok(identity) => {
            if json_output {
                println!("{}", serde_json::to_string_pretty(&identity)?);
            } else {
                print_report(&identity);
            }
            Ok(())
        }
        Err(e) => {
            error!(reason = e.reason(), error = %e, "identity computation failed");
            if json_output {
                println!(
                    "{}",
                    serde_json::json!({ "reason": e.reason(), "message": e.to_string() })
                );
            } else {
                eprintln!("error [{}]: {}", e.reason(), e);
            }
            std::process::exit(1);
        }
    }
}

fn print_report(identity: &Identity) {
    let stats = &identity.identity_stats;

    println!();
    println!("{}", "=".repeat(58));
    println!("  ONCHAIN IDENTITY  {}", stats.shortened_address);
    println!("{}", "=".repeat(58));

    if let Some(name) = &identity.ens {
        println!("  ENS name:        {}", name);
    }
    if let Some(name) = &identity.base_name {
        println!("  Base name:       {}", name);
    }

    if let Some(message) = &identity.message {
        println!();
        println!("  {}", message);
    }

    println!();
    println!("  -- Activity --");
    println!("  Transactions:    {}", stats.tx_count);
    println!("  Active days:     {}", stats.active_days);
    if let Some(date) = &stats.first_tx_date {
        println!("  First tx:        {}", date);
    }
    println!("  Received:        {:.6} ETH", stats.total_in_eth);
    println!("  Sent:            {:.6} ETH", stats.total_out_eth);
    println!("  Gas spent:       {:.6} ETH", stats.total_gas_eth);
    println!("  Tokens touched:  {}", identity.token_summary.token_count);
    println!("  NFTs touched:    {}", identity.nft_summary.nft_count);

    println!();
    println!("  -- Standing --");
    println!("  Builder score:   {}/100", stats.builder_score);
    println!("  Rank:            {}", identity.rank);
    println!(
        "  Level:           {}  ({} XP, next level at {})",
        identity.xp.level, identity.xp.total_xp, identity.xp.next_level_xp
    );

    if !identity.badges.is_empty() {
        println!();
        println!("  -- Badges --");
        for badge in &identity.badges {
            println!("  {} {}", badge.icon, badge.label);
        }
    }

    if !identity.timeline.is_empty() {
        println!();
        println!("  -- Timeline --");
        for event in &identity.timeline {
            println!("  {} {:<20} {}", event.icon, event.label, event.date);
        }
    }

    if !identity.tokens.is_empty() {
        println!();
        println!("  -- Tokens --");
        for token in &identity.tokens {
            println!("  {} ({})", token.name, token.symbol);
        }
    }

    if !identity.nfts.is_empty() {
        println!();
        println!("  -- NFTs --");
        for nft in &identity.nfts {
            println!("  {} [{}]", nft.name, nft.collection);
        }
    }

    println!();
}
