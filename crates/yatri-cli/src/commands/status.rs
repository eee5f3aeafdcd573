//! `yatri status` — Query the status of a running registry node.

use clap::Args;
use serde::Deserialize;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// API endpoint of the node.
    #[arg(short, long, default_value = "http://127.0.0.1:8700")]
    pub endpoint: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    version: String,
    uptime_secs: u64,
    total_records: u64,
    total_verifiers: u64,
    paused: bool,
}

pub async fn run(args: &StatusArgs) -> anyhow::Result<()> {
    let url = format!("{}/api/v1/status", args.endpoint);
    let resp = reqwest::get(&url).await;

    match resp {
        Ok(r) if r.status().is_success() => {
            let status: StatusResponse = r.json().await?;
            println!("Node Status:");
            println!("  Version:    {}", status.version);
            println!("  Uptime:     {}s", status.uptime_secs);
            println!("  Records:    {}", status.total_records);
            println!("  Verifiers:  {}", status.total_verifiers);
            println!(
                "  Registry:   {}",
                if status.paused { "PAUSED" } else { "accepting writes" }
            );
        }
        Ok(r) => {
            anyhow::bail!("node returned HTTP {}", r.status());
        }
        Err(e) => {
            println!("Could not reach node at {}", args.endpoint);
            println!("  Error: {}", e);
            println!();
            println!("Is the node running? Start it with: yatri-node");
        }
    }

    Ok(())
}
