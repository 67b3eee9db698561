//! Multi-Asset Portfolio Optimizer
//!
//! Command-line front end for the portfolio pipeline.

use clap::{Parser, Subcommand};
use portfolio_optimizer::{
    assets::{AssetRegistry, AssetSpec},
    config::Config,
    pipeline::{PortfolioManager, PortfolioReport, PortfolioRequest},
    portfolio::OptimizerMethod,
    types::DateRange,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "portfolio-optimizer")]
#[command(about = "Construct and analyze multi-asset portfolios")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch prices, optimize weights and report performance
    Optimize {
        /// JSON file with the asset specs
        #[arg(short, long)]
        assets: String,
        /// First date of the window (YYYY-MM-DD)
        #[arg(long)]
        start: String,
        /// End of the window, exclusive (YYYY-MM-DD)
        #[arg(long)]
        end: String,
        /// mean_variance or covariance
        #[arg(short, long, default_value = "mean_variance")]
        method: String,
        /// Annual return the mean-variance solver must hit
        #[arg(long)]
        target_return: Option<f64>,
        /// Annual risk-free rate as a fraction (defaults to config)
        #[arg(long)]
        risk_free_rate: Option<f64>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate an asset spec file and list the assets
    Assets {
        #[arg(short, long)]
        assets: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Optimize {
            assets,
            start,
            end,
            method,
            target_return,
            risk_free_rate,
            json,
        } => {
            let method: OptimizerMethod = method.parse()?;
            let range = DateRange::parse(&start, &end)?;
            let risk_free_rate = risk_free_rate.unwrap_or(config.analysis.risk_free_rate);
            let request = PortfolioRequest::new(AssetSpec::load_file(&assets)?, range)
                .with_method(method)
                .with_target_return(target_return)
                .with_risk_free_rate(risk_free_rate);
            optimize(config, request, json).await
        }
        Commands::Assets { assets } => show_assets(&assets),
    }
}

async fn optimize(config: Config, request: PortfolioRequest, json: bool) -> anyhow::Result<()> {
    let manager = PortfolioManager::from_config(config)?;
    let report = manager.run(request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &PortfolioReport) {
    println!("\n📊 Portfolio ({}, {} to {})\n", report.method, report.range.start(), report.range.end());

    if report.used_fallback {
        println!(
            "⚠️  Optimizer failed ({}), using equal weights\n",
            report.fallback_reason.as_deref().unwrap_or("unknown")
        );
    }
    for dropped in &report.dropped {
        println!("⚠️  Dropped {}: {}", dropped.symbol, dropped.reason);
    }

    println!("{:<12} {:>10} {:>14} {:>14}", "Symbol", "Weight", "Exp. Return", "Contribution");
    println!("{}", "-".repeat(53));
    for row in &report.allocation {
        println!(
            "{:<12} {:>9.2}% {:>13.2}% {:>13.2}%",
            row.symbol,
            row.weight * 100.0,
            row.expected_return * 100.0,
            row.contribution * 100.0
        );
    }

    println!("\n📈 Performance ({} observations)", report.observations);
    println!("  Cumulative return: {:.2}%", report.display.cumulative_return_pct);
    println!("  Volatility:        {:.2}%", report.display.volatility_pct);
    println!("  Sharpe ratio:      {:.3}", report.display.sharpe_ratio);

    println!("\nAsset volatility:");
    for v in &report.asset_volatilities {
        println!("  {:<12} {:>7.2}%", v.symbol, v.volatility * 100.0);
    }
}

fn show_assets(path: &str) -> anyhow::Result<()> {
    let specs = AssetSpec::load_file(path)?;
    let collection = AssetRegistry::build_collection(&specs)?;

    println!("\n🗂  {} assets\n", collection.len());
    for asset in collection.assets() {
        println!("{:<10} {:<8} {}", asset.symbol(), asset.asset_type(), asset.name());
    }
    println!("\n{}", serde_json::to_string_pretty(&collection.describe())?);
    Ok(())
}
