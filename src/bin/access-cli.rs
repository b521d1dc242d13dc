use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "access-cli")]
#[command(about = "Management CLI for service access lists", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8088")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check admin server status
    Status,
    /// List access entries, optionally filtered
    Search {
        #[arg(short, long)]
        service: Option<String>,
        #[arg(short, long)]
        address: Option<String>,
    },
    /// Add consumer addresses to the access list of services
    Grant {
        /// Service name (repeatable)
        #[arg(short, long = "service", required = true)]
        services: Vec<String>,
        /// Consumer address (repeatable)
        #[arg(short, long = "address", required = true)]
        addresses: Vec<String>,
        /// Put the addresses on the white list instead of the black list
        #[arg(long)]
        allow: bool,
    },
    /// Remove consumer addresses from a service's access list
    Revoke {
        #[arg(short, long)]
        service: String,
        /// Consumer address (repeatable)
        #[arg(short, long = "address", required = true)]
        addresses: Vec<String>,
    },
    /// List services known to the admin server
    Services,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let res = match cli.command {
        Commands::Status => client.get(format!("{}/admin/status", cli.url)).send().await?,
        Commands::Search { service, address } => {
            let mut query = Vec::new();
            if let Some(service) = service {
                query.push(("service", service));
            }
            if let Some(address) = address {
                query.push(("address", address));
            }
            client
                .get(format!("{}/api/accesses/search", cli.url))
                .query(&query)
                .send()
                .await?
        }
        Commands::Grant { services, addresses, allow } => {
            client
                .post(format!("{}/api/accesses/create", cli.url))
                .json(&json!({
                    "services": services,
                    "addresses": addresses.join("\n"),
                    "allowed": allow,
                }))
                .send()
                .await?
        }
        Commands::Revoke { service, addresses } => {
            let entries: Vec<Value> = addresses
                .into_iter()
                .map(|address| json!({ "service": service, "address": address }))
                .collect();
            client
                .post(format!("{}/api/accesses/delete", cli.url))
                .json(&entries)
                .send()
                .await?
        }
        Commands::Services => client.get(format!("{}/api/accesses/services", cli.url)).send().await?,
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if !text.is_empty() {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    if text.is_empty() {
        println!("OK");
        return Ok(());
    }

    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
