use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Command-line client for a running market gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the gateway is serving
    Health,
    /// Alpaca quote snapshot for a symbol
    Quote { symbol: String },
    /// Yahoo price and daily change for a symbol
    Stock { symbol: String },
    /// Search equities and ETFs by name or ticker
    Search { query: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let request = match &cli.command {
        Commands::Health => client.get(format!("{base}/health")),
        Commands::Quote { symbol } => client
            .get(format!("{base}/quote"))
            .query(&[("symbol", symbol)]),
        Commands::Stock { symbol } => {
            let mut url = reqwest::Url::parse(base)?;
            url.path_segments_mut()
                .map_err(|_| "gateway URL cannot carry a path")?
                .pop_if_empty()
                .extend(["stock", symbol.as_str()]);
            client.get(url)
        }
        Commands::Search { query } => client
            .get(format!("{base}/stock/search"))
            .query(&[("q", query)]),
    };

    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let body = serde_json::from_str::<Value>(&text)
        .map(|json| serde_json::to_string_pretty(&json))
        .unwrap_or(Ok(text))?;

    if status.is_success() {
        println!("{body}");
    } else {
        eprintln!("Error: gateway returned status {status}");
        eprintln!("{body}");
        std::process::exit(1);
    }
    Ok(())
}
