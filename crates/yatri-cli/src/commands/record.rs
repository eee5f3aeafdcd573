//! `yatri record` — Fetch an identity record by registry id.

use clap::Args;
use serde::Deserialize;

#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Registry id of the record.
    pub id: u64,

    /// Principal to act as (sent in the x-yatri-principal header).
    #[arg(long = "as")]
    pub principal: String,

    /// API endpoint of the node.
    #[arg(short, long, default_value = "http://127.0.0.1:8700")]
    pub endpoint: String,
}

#[derive(Deserialize)]
struct RecordResponse {
    registry_id: u64,
    owner: String,
    status: String,
    is_verified: bool,
    trip: TripSummary,
    emergency_contacts: Vec<serde_json::Value>,
    location: String,
    registered_at: String,
}

#[derive(Deserialize)]
struct TripSummary {
    state: String,
    purpose: String,
    group_size: u32,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

pub async fn run(args: &RecordArgs) -> anyhow::Result<()> {
    let url = format!("{}/api/v1/records/{}", args.endpoint, args.id);

    let client = reqwest::Client::new();
    let resp = client
        .get(&url)
        .header("x-yatri-principal", &args.principal)
        .send()
        .await;

    match resp {
        Ok(r) if r.status().is_success() => {
            let record: RecordResponse = r.json().await?;
            println!("Identity Record #{}:", record.registry_id);
            println!("  Owner:       {}", record.owner);
            println!("  Status:      {}", record.status);
            println!(
                "  Verified:    {}",
                if record.is_verified { "yes" } else { "no" }
            );
            println!("  Trip:        {} ({})", record.trip.state, record.trip.purpose);
            println!("  Group size:  {}", record.trip.group_size);
            println!("  Contacts:    {}", record.emergency_contacts.len());
            println!("  Location:    {}", record.location);
            println!("  Registered:  {}", record.registered_at);
        }
        Ok(r) => {
            let status = r.status();
            if let Ok(err) = r.json::<ErrorResponse>().await {
                anyhow::bail!("lookup failed (HTTP {}): {}", status, err.error);
            } else {
                anyhow::bail!("lookup failed (HTTP {})", status);
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
