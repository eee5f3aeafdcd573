//! `yatri pause` — Freeze record-plane mutations on a running node.

use clap::Args;
use serde::Deserialize;

#[derive(Args, Debug)]
pub struct PauseArgs {
    /// Principal to act as (must hold the Admin role).
    #[arg(long = "as")]
    pub principal: String,

    /// API endpoint of the node.
    #[arg(short, long, default_value = "http://127.0.0.1:8700")]
    pub endpoint: String,
}

#[derive(Deserialize)]
struct PauseResponse {
    paused: bool,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

pub async fn run(args: &PauseArgs) -> anyhow::Result<()> {
    let url = format!("{}/api/v1/registry/pause", args.endpoint);

    let client = reqwest::Client::new();
    let resp = client
        .post(&url)
        .header("x-yatri-principal", &args.principal)
        .send()
        .await;

    match resp {
        Ok(r) if r.status().is_success() => {
            let data: PauseResponse = r.json().await?;
            if data.paused {
                println!("Registry paused. Record mutations are now rejected.");
            }
        }
        Ok(r) => {
            let status = r.status();
            if let Ok(err) = r.json::<ErrorResponse>().await {
                anyhow::bail!("pause failed (HTTP {}): {}", status, err.error);
            } else {
                anyhow::bail!("pause failed (HTTP {})", status);
            }
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
