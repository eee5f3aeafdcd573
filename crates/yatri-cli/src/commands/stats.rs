//! `yatri stats` — Show registry statistics.

use clap::Args;
use serde::Deserialize;

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// API endpoint of the node.
    #[arg(short, long, default_value = "http://127.0.0.1:8700")]
    pub endpoint: String,
}

#[derive(Deserialize)]
struct StatsResponse {
    total_records: u64,
    active_records: u64,
    verified_records: u64,
    pending_verification: u64,
    revoked_records: u64,
    total_verifiers: u64,
    active_verifiers: u64,
}

pub async fn run(args: &StatsArgs) -> anyhow::Result<()> {
    let url = format!("{}/api/v1/stats", args.endpoint);
    let resp = reqwest::get(&url).await;

    match resp {
        Ok(r) if r.status().is_success() => {
            let stats: StatsResponse = r.json().await?;
            println!("Registry Statistics:");
            println!("  Records:");
            println!("    Total:       {}", stats.total_records);
            println!("    Active:      {}", stats.active_records);
            println!("    Verified:    {}", stats.verified_records);
            println!("    Pending:     {}", stats.pending_verification);
            println!("    Revoked:     {}", stats.revoked_records);
            println!("  Verifiers:");
            println!("    Total:       {}", stats.total_verifiers);
            println!("    Active:      {}", stats.active_verifiers);
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
