use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "warden-cli")]
#[command(about = "Operations CLI for conn-warden", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Admin API key. Only needed for admin commands.
    #[arg(short, long, env = "WARDEN_ADMIN_KEY", default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe every resource via /health
    Health,
    /// Check the process is serving via /ping
    Ping,
    /// Overall status
    Status,
    /// List resources and their liveness
    Resources,
    /// Show background scheduler state
    Schedulers,
    /// Ping one resource through the retrying runner
    Probe { name: String },
    /// Force a reconnect of one resource
    Recover { name: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    if !cli.key.is_empty() {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
        );
    }

    let (method, path) = match &cli.command {
        Commands::Health => (Method::GET, "/health".to_string()),
        Commands::Ping => (Method::GET, "/ping".to_string()),
        Commands::Status => (Method::GET, "/admin/status".to_string()),
        Commands::Resources => (Method::GET, "/admin/resources".to_string()),
        Commands::Schedulers => (Method::GET, "/admin/schedulers".to_string()),
        Commands::Probe { name } => (Method::POST, format!("/admin/resources/{}/ping", name)),
        Commands::Recover { name } => (Method::POST, format!("/admin/resources/{}/recover", name)),
    };

    let res = client
        .request(method, format!("{}{}", base, path))
        .headers(headers)
        .send()
        .await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }

    if !status.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
