//! Download and decrypt a file from a share URL.

use std::fs::File;
use std::io::Write;

use anyhow::{Context, Result, anyhow};

use codedrop_client::CodedropClient;
use codedrop_crypto::DropKey;

use crate::pipeline::{parse_share_url, sanitize_file_name};

/// Run the pull command.
pub async fn run(input_url: &str) -> Result<()> {
    let share = parse_share_url(input_url)?;

    println!("Decoding decryption key...");
    let key = DropKey::decode(&share.key).context("Invalid key")?;

    println!("Contacting server for metadata...");
    let client = CodedropClient::new(&share.base_url);
    let meta = client
        .get_drop_metadata(&share.drop_id)
        .await
        .context("failed to fetch metadata")?;

    println!(
        "Found file: {} ({} bytes, {} chunks)",
        meta.file_name, meta.file_size, meta.chunk_count
    );

    let output_name = format!("downloaded_{}", sanitize_file_name(&meta.file_name));
    let mut output = File::create(&output_name)
        .with_context(|| format!("failed to create output file {output_name}"))?;

    println!("Downloading and decrypting chunks...");
    let result = fetch_chunks(&client, &share.drop_id, meta.chunk_count, &key, &mut output).await;
    if let Err(err) = result {
        // Never leave a half-written file behind.
        drop(output);
        let _ = std::fs::remove_file(&output_name);
        return Err(err);
    }

    println!();
    println!("Download complete!");
    println!("Saved as: {output_name}");
    Ok(())
}

/// Download, decrypt, and append every chunk in order.
async fn fetch_chunks(
    client: &CodedropClient,
    drop_id: &str,
    chunk_count: i64,
    key: &DropKey,
    output: &mut File,
) -> Result<()> {
    for index in 0..chunk_count {
        println!("   -> pulling chunk {}/{}...", index + 1, chunk_count);

        let ciphertext = client
            .download_chunk(drop_id, index as u32)
            .await
            .with_context(|| format!("failed to download chunk {index}"))?;

        let plaintext = codedrop_crypto::decrypt(key, &ciphertext).map_err(|_| {
            anyhow!("Decryption failed on chunk {index}: wrong key or corrupted data")
        })?;

        output
            .write_all(&plaintext)
            .context("failed to write output file")?;
    }
    Ok(())
}
