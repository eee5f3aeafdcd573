//! `yatri verify` — Verify an identity record.

use clap::Args;
use serde::Deserialize;

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Registry id of the record to verify.
    pub id: u64,

    /// Principal to act as (must hold the Verifier role).
    #[arg(long = "as")]
    pub principal: String,

    /// API endpoint of the node.
    #[arg(short, long, default_value = "http://127.0.0.1:8700")]
    pub endpoint: String,
}

#[derive(Deserialize)]
struct VerifyResponse {
    registry_id: u64,
    verified: bool,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
    code: String,
}

pub async fn run(args: &VerifyArgs) -> anyhow::Result<()> {
    let url = format!("{}/api/v1/records/{}/verify", args.endpoint, args.id);

    let client = reqwest::Client::new();
    let resp = client
        .post(&url)
        .header("x-yatri-principal", &args.principal)
        .send()
        .await;

    match resp {
        Ok(r) if r.status().is_success() => {
            let data: VerifyResponse = r.json().await?;
            if data.verified {
                println!("Record #{} verified.", data.registry_id);
            }
        }
        Ok(r) => {
            let status = r.status();
            if let Ok(err) = r.json::<ErrorResponse>().await {
                anyhow::bail!(
                    "verification failed (HTTP {}, {}): {}",
                    status,
                    err.code,
                    err.error
                );
            } else {
                anyhow::bail!("verification failed (HTTP {})", status);
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
