//! Remote transport: HEAD-based hash discovery and verified downloads
//!
//! Every call blocks the calling thread. Nothing here retries; a failed
//! request surfaces immediately and the caller decides what to do.

use cairn_core::{CairnError, Hash, HashAlgorithm, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Network operations the asset store needs from a transport
pub trait Fetcher: Send + Sync {
    /// Issue a HEAD request and return the raw `ETag` header, if any
    fn head_etag(&self, url: &str) -> Result<Option<String>>;

    /// Make `dest` hold the bytes at `url`, verified against `expected`.
    ///
    /// Must not report success unless the file at `dest` matches `expected`.
    fn download(&self, url: &str, dest: &Path, expected: &Hash) -> Result<()>;
}

/// Blocking HTTP transport
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Create a fetcher whose requests time out after `timeout_secs`
    pub fn new(timeout_secs: u64) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(timeout_secs)))
            .build();
        Self {
            agent: config.into(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_SECS)
    }
}

impl Fetcher for HttpFetcher {
    fn head_etag(&self, url: &str) -> Result<Option<String>> {
        let response = self
            .agent
            .head(url)
            .call()
            .map_err(|e| CairnError::HashAcquisition {
                url: url.to_string(),
                reason: format!("error doing HEAD: {}", e),
            })?;

        Ok(response
            .headers()
            .get("ETag")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string()))
    }

    fn download(&self, url: &str, dest: &Path, expected: &Hash) -> Result<()> {
        if dest.exists() {
            let actual = Hash::from_file(expected.algorithm(), dest)?;
            if &actual == expected {
                tracing::debug!("Reusing verified download {}", dest.display());
                return Ok(());
            }
            tracing::info!(
                "Existing file {} has hash {}, expected {}; downloading again",
                dest.display(),
                actual,
                expected
            );
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!("Downloading {:?}", url);
        let response = self.agent.get(url).call().map_err(|e| CairnError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let tmp = partial_path(dest);
        let mut reader = response.into_body().into_reader();
        let copied = fs::File::create(&tmp)
            .and_then(|mut file| std::io::copy(&mut reader, &mut file));
        if let Err(e) = copied {
            fs::remove_file(&tmp).ok();
            return Err(CairnError::Network {
                url: url.to_string(),
                reason: format!("error writing {}: {}", tmp.display(), e),
            });
        }

        let actual = Hash::from_file(expected.algorithm(), &tmp)?;
        if &actual != expected {
            fs::remove_file(&tmp).ok();
            return Err(CairnError::Verification {
                path: dest.to_path_buf(),
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }

        fs::rename(&tmp, dest)?;
        Ok(())
    }
}

/// Sibling path the body is streamed into before verification
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    dest.with_file_name(name)
}

/// Interpret an `ETag` header as a content hash.
///
/// Servers such as S3 use the MD5 of the object as its ETag for simple
/// uploads. Only a 32-character token (after trimming whitespace and
/// quotes) is accepted; anything else is not trusted as a digest.
pub fn hash_from_etag(url: &str, etag: Option<&str>) -> Result<Hash> {
    let etag = etag
        .unwrap_or_default()
        .trim()
        .trim_matches(|c: char| c == '\'' || c == '"');

    if etag.len() == 32 {
        return HashAlgorithm::Md5
            .from_hex(etag)
            .map_err(|e| CairnError::HashAcquisition {
                url: url.to_string(),
                reason: e.to_string(),
            });
    }

    Err(CairnError::HashAcquisition {
        url: url.to_string(),
        reason: format!("unable to determine hash from HTTP HEAD (ETag {:?})", etag),
    })
}

/// HEAD `url` and derive its hash from the response's `ETag`
pub fn hash_from_http_header(fetcher: &dyn Fetcher, url: &str) -> Result<Hash> {
    tracing::info!("Doing HTTP HEAD on {:?}", url);
    let etag = fetcher.head_etag(url)?;
    hash_from_etag(url, etag.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    const HELLO_MD5: &str = "5d41402abc4b2a76b9719d911017c592";

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cairn_fetch_test_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Serve one canned HTTP response on a loopback port
    fn serve_once(response: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{}/release.tar.gz", addr)
    }

    fn ok_response(extra_header: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 200 OK\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n{}",
            extra_header,
            body.len(),
            body
        )
    }

    #[test]
    fn test_etag_quoted_md5() {
        let h = hash_from_etag("u", Some(&format!(" \"{}\" ", HELLO_MD5))).unwrap();
        assert_eq!(h.algorithm(), HashAlgorithm::Md5);
        assert_eq!(h.hex(), HELLO_MD5);
    }

    #[test]
    fn test_etag_single_quoted() {
        let h = hash_from_etag("u", Some(&format!("'{}'", HELLO_MD5))).unwrap();
        assert_eq!(h.hex(), HELLO_MD5);
    }

    #[test]
    fn test_etag_wrong_length_rejected() {
        // Multipart S3 uploads carry a "-<parts>" suffix
        let err = hash_from_etag("u", Some(&format!("\"{}-2\"", HELLO_MD5))).unwrap_err();
        assert!(matches!(err, CairnError::HashAcquisition { .. }));
    }

    #[test]
    fn test_etag_missing_or_empty_rejected() {
        assert!(matches!(
            hash_from_etag("u", None),
            Err(CairnError::HashAcquisition { .. })
        ));
        assert!(matches!(
            hash_from_etag("u", Some("\"\"")),
            Err(CairnError::HashAcquisition { .. })
        ));
    }

    #[test]
    fn test_etag_non_hex_rejected() {
        let err = hash_from_etag("u", Some("zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz")).unwrap_err();
        assert!(matches!(err, CairnError::HashAcquisition { .. }));

        let signed = format!("\"{}\"", "+d".repeat(16));
        let err = hash_from_etag("u", Some(&signed)).unwrap_err();
        assert!(matches!(err, CairnError::HashAcquisition { .. }));
    }

    #[test]
    fn test_head_reads_etag() {
        let url = serve_once(ok_response(&format!("ETag: \"{}\"\r\n", HELLO_MD5), ""));
        let fetcher = HttpFetcher::new(10);
        let hash = hash_from_http_header(&fetcher, &url).unwrap();
        assert_eq!(hash.hex(), HELLO_MD5);
    }

    #[test]
    fn test_head_transport_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = HttpFetcher::new(10);
        let err = hash_from_http_header(&fetcher, &format!("http://{}/x", addr)).unwrap_err();
        assert!(matches!(err, CairnError::HashAcquisition { .. }));
    }

    #[test]
    fn test_download_verifies_and_renames() {
        let dir = temp_dir();
        let dest = dir.join("cached");
        let url = serve_once(ok_response("", "hello"));

        let expected = Hash::parse(HELLO_MD5).unwrap();
        HttpFetcher::new(10).download(&url, &dest, &expected).unwrap();

        assert_eq!(fs::read_to_string(&dest).unwrap(), "hello");
        assert!(!partial_path(&dest).exists());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_download_hash_mismatch() {
        let dir = temp_dir();
        let dest = dir.join("cached");
        let url = serve_once(ok_response("", "tampered"));

        let expected = Hash::parse(HELLO_MD5).unwrap();
        let err = HttpFetcher::new(10).download(&url, &dest, &expected).unwrap_err();

        assert!(matches!(err, CairnError::Verification { .. }));
        assert!(!dest.exists());
        assert!(!partial_path(&dest).exists());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_download_reuses_verified_file() {
        let dir = temp_dir();
        let dest = dir.join("cached");
        fs::write(&dest, b"hello").unwrap();

        // Nothing listens here; a network attempt would fail
        let expected = Hash::parse(HELLO_MD5).unwrap();
        HttpFetcher::new(1)
            .download("http://127.0.0.1:9/never", &dest, &expected)
            .unwrap();

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_download_status_error() {
        let dir = temp_dir();
        let url = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string(),
        );

        let expected = Hash::parse(HELLO_MD5).unwrap();
        let err = HttpFetcher::new(10)
            .download(&url, &dir.join("cached"), &expected)
            .unwrap_err();
        assert!(matches!(err, CairnError::Network { .. }));

        fs::remove_dir_all(&dir).ok();
    }
}
