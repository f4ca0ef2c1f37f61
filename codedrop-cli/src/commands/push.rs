//! Encrypt a file and push it to the server.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Local;

use codedrop_client::CodedropClient;
use codedrop_core::schemas::CreateDropRequest;
use codedrop_crypto::DropKey;

use crate::pipeline::{CHUNK_SIZE, ENCRYPTION_SALT, format_share_url, read_full};

/// Run the push command.
pub async fn run(server: &str, path: &Path, expire: &str, max_views: i32) -> Result<()> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let file_meta = file
        .metadata()
        .with_context(|| format!("failed to stat {}", path.display()))?;
    if file_meta.is_dir() {
        bail!("only single files are supported, not directories; archive it first");
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file")
        .to_owned();

    println!("Generating local encryption key...");
    let key = DropKey::generate();

    println!("Contacting CodeDrop server...");
    let client = CodedropClient::new(server);
    let drop = client
        .create_drop(&CreateDropRequest {
            file_name: file_name.clone(),
            file_size: file_meta.len() as i64,
            encryption_salt: ENCRYPTION_SALT.to_owned(),
            expires_in: expire.to_owned(),
            max_downloads: max_views,
        })
        .await
        .context("failed to create drop")?;

    println!("Uploading {file_name} ({} bytes)", file_meta.len());

    let mut reader = BufReader::new(file);
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut chunk_index: u32 = 0;

    loop {
        let bytes_read = read_full(&mut reader, &mut buffer)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if bytes_read == 0 {
            break;
        }

        let ciphertext = codedrop_crypto::encrypt(&key, &buffer[..bytes_read])
            .with_context(|| format!("failed to encrypt chunk {chunk_index}"))?;

        println!("   -> pushing chunk {chunk_index}...");
        client
            .upload_chunk(&drop.drop_id, chunk_index, ciphertext)
            .await
            .with_context(|| format!("failed to upload chunk {chunk_index}"))?;

        chunk_index += 1;
        if bytes_read < CHUNK_SIZE {
            break;
        }
    }

    let url = format_share_url(client.base_url(), &drop.drop_id, &key.encode());
    let local_expiry = drop.expires_at.with_timezone(&Local);

    println!();
    println!("Upload complete!");
    println!("--------------------------------------------------");
    println!("Secure URL : {url}");
    println!("Expires at : {}", local_expiry.format("%b %d, %Y %H:%M:%S"));
    println!("Max views  : {max_views}");
    println!("--------------------------------------------------");
    println!(
        "WARNING: anyone with this URL can decrypt the file. Do not lose it; the key cannot be recovered."
    );

    Ok(())
}
