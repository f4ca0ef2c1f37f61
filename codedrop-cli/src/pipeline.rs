//! Shared pieces of the push/pull pipeline: chunk sizing, share-URL
//! handling, and output formatting.

use std::io::Read;

use anyhow::{Context, Result, bail};
use url::Url;

/// Plaintext chunk size. Ciphertext adds 28 bytes of nonce and tag, which
/// keeps every upload comfortably under the server's 5 MiB cap.
pub const CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Algorithm version tag sent as `encryption_salt`. The server stores and
/// returns it without interpretation.
pub const ENCRYPTION_SALT: &str = "v1-aes-gcm";

/// A parsed share URL: server base, drop id, and the encoded key from the
/// fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareUrl {
    pub base_url: String,
    pub drop_id: String,
    pub key: String,
}

/// Render a share URL. The key rides in the fragment so it never appears
/// in any HTTP request.
pub fn format_share_url(base_url: &str, drop_id: &str, encoded_key: &str) -> String {
    format!("{base_url}/drop/{drop_id}#k={encoded_key}")
}

/// Parse a share URL of the form `http://host[:port]/drop/<id>#k=<key>`.
pub fn parse_share_url(input: &str) -> Result<ShareUrl> {
    let parsed = Url::parse(input).context("invalid URL")?;
    let host = parsed.host_str().context("URL is missing a host")?;

    let base_url = match parsed.port() {
        Some(port) => format!("{}://{host}:{port}", parsed.scheme()),
        None => format!("{}://{host}", parsed.scheme()),
    };

    let segments: Vec<&str> = parsed.path().trim_matches('/').split('/').collect();
    if segments.len() != 2 || segments[0] != "drop" || segments[1].is_empty() {
        bail!("invalid URL path; expected http://host/drop/<id>#k=<key>");
    }
    let drop_id = segments[1].to_owned();

    let key = parsed
        .fragment()
        .and_then(|f| f.strip_prefix("k="))
        .filter(|k| !k.is_empty())
        .context("missing decryption key in URL fragment (#k=...)")?
        .to_owned();

    Ok(ShareUrl {
        base_url,
        drop_id,
        key,
    })
}

/// Strip any path components from a server-provided file name. The name is
/// untrusted; without this a malicious drop could write outside the
/// current directory.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned = name.rsplit(['/', '\\']).next().unwrap_or("").trim();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "file".to_owned()
    } else {
        cleaned.to_owned()
    }
}

/// Read until `buf` is full or EOF. Returns the number of bytes read, so
/// chunk boundaries are deterministic regardless of short reads.
pub fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Format a byte count as a human-readable string.
pub fn format_bytes(bytes: i64) -> String {
    const UNIT: i64 = 1024;
    if bytes < UNIT {
        return format!("{bytes} B");
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    let units = ['K', 'M', 'G', 'T', 'P', 'E'];
    format!("{:.2} {}B", bytes as f64 / div as f64, units[exp])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn share_url_roundtrip() {
        let rendered = format_share_url("http://localhost:8080", "abc-123", "a2V5");
        assert_eq!(rendered, "http://localhost:8080/drop/abc-123#k=a2V5");

        let parsed = parse_share_url(&rendered).unwrap();
        assert_eq!(parsed.base_url, "http://localhost:8080");
        assert_eq!(parsed.drop_id, "abc-123");
        assert_eq!(parsed.key, "a2V5");
    }

    #[test]
    fn parse_accepts_default_port() {
        let parsed = parse_share_url("https://drops.example.com/drop/d1#k=xyz").unwrap();
        assert_eq!(parsed.base_url, "https://drops.example.com");
        assert_eq!(parsed.drop_id, "d1");
    }

    #[test]
    fn parse_rejects_wrong_path() {
        assert!(parse_share_url("http://host/files/d1#k=xyz").is_err());
        assert!(parse_share_url("http://host/drop/#k=xyz").is_err());
        assert!(parse_share_url("http://host/drop/d1/extra#k=xyz").is_err());
    }

    #[test]
    fn parse_rejects_missing_key_fragment() {
        let err = parse_share_url("http://host/drop/d1").unwrap_err();
        assert!(err.to_string().contains("fragment"));

        assert!(parse_share_url("http://host/drop/d1#k=").is_err());
        assert!(parse_share_url("http://host/drop/d1#key=abc").is_err());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_share_url("not a url at all").is_err());
    }

    #[test]
    fn sanitize_strips_path_components() {
        assert_eq!(sanitize_file_name("report.pdf"), "report.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("dir\\evil.exe"), "evil.exe");
        assert_eq!(sanitize_file_name(""), "file");
        assert_eq!(sanitize_file_name(".."), "file");
    }

    #[test]
    fn read_full_fills_across_short_reads() {
        // Cursor reads are not artificially short, but EOF handling is the
        // interesting path: a 10-byte source against a 4-byte buffer.
        let mut source = Cursor::new(vec![7u8; 10]);
        let mut buf = [0u8; 4];

        assert_eq!(read_full(&mut source, &mut buf).unwrap(), 4);
        assert_eq!(read_full(&mut source, &mut buf).unwrap(), 4);
        assert_eq!(read_full(&mut source, &mut buf).unwrap(), 2);
        assert_eq!(read_full(&mut source, &mut buf).unwrap(), 0);
    }

    #[test]
    fn format_bytes_scales_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.00 GB");
    }
}
