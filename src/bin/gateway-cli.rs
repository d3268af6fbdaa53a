use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Management CLI for the session-sharing gateway", long_about = None)]
struct Cli {
    /// Admin API base URL
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    /// Admin API key
    #[arg(short, long)]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show gateway status
    Status,
    /// Show circuit breaker state
    Circuit,
    /// Show whether a shared session is held
    Session,
    /// Replace the shared session with a fresh login
    Login,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let base = cli.url.trim_end_matches('/');
    let request = match cli.command {
        Commands::Status => client.get(format!("{}/admin/status", base)),
        Commands::Circuit => client.get(format!("{}/admin/circuit", base)),
        Commands::Session => client.get(format!("{}/admin/session", base)),
        Commands::Login => client.post(format!("{}/admin/session/refresh", base)),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
