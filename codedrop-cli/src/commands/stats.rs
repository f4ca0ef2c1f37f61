//! Show server storage and deduplication metrics.

use anyhow::{Context, Result};

use codedrop_client::CodedropClient;

use crate::pipeline::format_bytes;

/// Run the stats command.
pub async fn run(server: &str) -> Result<()> {
    println!("Fetching system metrics from {server}");

    let client = CodedropClient::new(server);
    let stats = client.stats().await.context("failed to fetch stats")?;

    println!();
    println!("=== CodeDrop storage ===");
    println!("Active drops  : {}", stats.active_drops);
    println!("Unique chunks : {}", stats.total_chunks);
    println!("Storage used  : {}", format_bytes(stats.storage_used_bytes));
    if stats.storage_saved_bytes > 0 {
        println!(
            "Storage saved : {} (de-duplication active)",
            format_bytes(stats.storage_saved_bytes)
        );
    } else {
        println!("Storage saved : 0 B");
    }
    println!("========================");

    Ok(())
}
