use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use reddit_picks::chart::write_json;
use reddit_picks::config::Config;
use reddit_picks::filter::filter;
use reddit_picks::reddit::{day_start_timestamp, PushshiftClient};
use reddit_picks::results::{price_spread, Analysis, SeriesStore, DEFAULT_MAX_BARS};
use reddit_picks::stocks::{parse_date, AlpacaClient};
use reddit_picks::storage::{read_filtered, read_index_symbols, write_filtered};

const DEFAULT_FILTERED_PATH: &str = "reddit/reddit_subs_filtered.csv";

#[derive(Parser)]
#[command(name = "reddit-picks")]
#[command(about = "Compare stocks recommended on Reddit against an index proxy")]
struct Cli {
    /// JSON file holding Alpaca CLIENT_ID / CLIENT_SECRET
    #[arg(long, global = true)]
    credentials: Option<PathBuf>,

    /// Directory for cached daily bars
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Benchmark symbol standing in for the market
    #[arg(long, global = true)]
    proxy: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pull submissions, keep bullish first mentions, write them to CSV
    PullReddit {
        #[arg(long, default_value = "wallstreetbets")]
        subreddit: String,
        /// Maximum submissions to pull
        #[arg(long, default_value_t = 10_000)]
        limit: usize,
        /// First day of the window (YYYY-MM-DD)
        #[arg(long)]
        start: String,
        /// Day after the window (YYYY-MM-DD)
        #[arg(long)]
        end: String,
        #[arg(long, default_value = DEFAULT_FILTERED_PATH)]
        out: PathBuf,
    },
    /// Fetch and cache daily bars for one ticker
    PullBars {
        ticker: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        days: Option<i64>,
    },
    /// One ticker against the proxy, writing both coloured price lines
    Compare {
        ticker: String,
        #[arg(long)]
        start: String,
        #[arg(long, default_value = "charts")]
        charts_dir: PathBuf,
    },
    /// Average return of every Reddit pick against the proxy
    Overall {
        #[arg(long, default_value = DEFAULT_FILTERED_PATH)]
        filtered: PathBuf,
    },
    /// Grouped bar chart of the first valid picks against the proxy
    BarGraph {
        #[arg(long, default_value = DEFAULT_FILTERED_PATH)]
        filtered: PathBuf,
        #[arg(long, default_value_t = DEFAULT_MAX_BARS)]
        max: usize,
        #[arg(long, default_value = "charts/reddit_vs_proxy.json")]
        out: PathBuf,
    },
    /// Count valid picks and how many sit in an index membership list
    Tally {
        #[arg(long, default_value = DEFAULT_FILTERED_PATH)]
        filtered: PathBuf,
        #[arg(long, default_value = "reddit/snp500.csv")]
        index_members: PathBuf,
    },
    /// Price lines of several cached tickers on one chart
    Spread {
        #[arg(required = true, value_delimiter = ',')]
        tickers: Vec<String>,
        #[arg(long, default_value = "charts/spread.json")]
        out: PathBuf,
    },
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config =
        Config::load(cli.credentials.as_deref()).context("failed to load configuration")?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(proxy) = &cli.proxy {
        config.index_proxy = proxy.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let store = SeriesStore::new(config.data_dir.clone());

    match cli.command {
        Commands::PullReddit {
            subreddit,
            limit,
            start,
            end,
            out,
        } => {
            let after = day_start_timestamp(&start)?;
            let before = day_start_timestamp(&end)?;
            let client = PushshiftClient::new(&config)?;
            let submissions = client.submissions(&subreddit, after, before, limit).await?;

            let filtered = filter(&submissions, &config.index_proxy)?;
            write_filtered(&out, &filtered)
                .with_context(|| format!("failed to write {}", out.display()))?;
            info!(
                pulled = submissions.len(),
                kept = filtered.len(),
                out = %out.display(),
                "filtered reddit submissions"
            );
        }
        Commands::PullBars { ticker, start, days } => {
            let source = AlpacaClient::new(&config)?;
            let days = days.unwrap_or(config.horizon_days);
            let bars = store
                .fetch_and_store(&source, &ticker, parse_date(&start)?, days)
                .await?;
            info!(
                ticker = %ticker,
                bars = bars.len(),
                path = %store.path_for(&ticker).display(),
                "cached bars"
            );
        }
        Commands::Compare {
            ticker,
            start,
            charts_dir,
        } => {
            let source = AlpacaClient::new(&config)?;
            let analysis = Analysis::new(
                &source,
                &store,
                config.index_proxy.as_str(),
                config.horizon_days,
            );
            let comparison = analysis.compare_ticker(&ticker, parse_date(&start)?).await?;

            let proxy_path = charts_dir.join(format!("{}.json", comparison.proxy));
            write_json(&proxy_path, &comparison.proxy_line)?;
            write_json(&charts_dir.join(format!("{ticker}.json")), &comparison.stock_line)?;
            println!("{} One Year Return: {:.2}", comparison.proxy, comparison.proxy_return);
            println!("{ticker} One Year Return: {:.2}", comparison.stock_return);
        }
        Commands::Overall { filtered } => {
            let source = AlpacaClient::new(&config)?;
            let analysis = Analysis::new(
                &source,
                &store,
                config.index_proxy.as_str(),
                config.horizon_days,
            );
            let subs = read_filtered(&filtered)
                .with_context(|| format!("failed to read {}", filtered.display()))?;
            let overall = analysis.overall_comparison(&subs).await?;

            println!("Average reddit AR: {:.2}", overall.average_reddit_return);
            println!("Average {} AR: {:.2}", config.index_proxy, overall.average_proxy_return);
        }
        Commands::BarGraph { filtered, max, out } => {
            let source = AlpacaClient::new(&config)?;
            let analysis = Analysis::new(
                &source,
                &store,
                config.index_proxy.as_str(),
                config.horizon_days,
            );
            let subs = read_filtered(&filtered)
                .with_context(|| format!("failed to read {}", filtered.display()))?;
            let chart = analysis.bar_comparison(&subs, max).await?;
            write_json(&out, &chart)?;
        }
        Commands::Tally {
            filtered,
            index_members,
        } => {
            let source = AlpacaClient::new(&config)?;
            let analysis = Analysis::new(
                &source,
                &store,
                config.index_proxy.as_str(),
                config.horizon_days,
            );
            let subs = read_filtered(&filtered)
                .with_context(|| format!("failed to read {}", filtered.display()))?;
            let symbols = read_index_symbols(&index_members)
                .with_context(|| format!("failed to read {}", index_members.display()))?;
            let tally = analysis.tally_tickers(&subs, &symbols).await?;

            println!("{:?}", tally.valid);
            println!("Number of stocks recommended by reddit: {}", tally.valid.len());
            println!("Number of recommended stocks in the index: {}", tally.in_index);
        }
        Commands::Spread { tickers, out } => {
            let chart = price_spread(&store, &tickers)?;
            write_json(&out, &chart)?;
        }
    }

    Ok(())
}
