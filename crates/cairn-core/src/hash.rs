//! Content digests used to address and verify cached files

use crate::error::{CairnError, Result};
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::Read;
use std::path::Path;

/// Digest algorithms a cached asset can be verified against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha256,
}

impl HashAlgorithm {
    /// Prefix used in the `algo:hex` string form
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
        }
    }

    /// Digest length in bytes
    pub fn digest_len(&self) -> usize {
        match self {
            HashAlgorithm::Md5 => 16,
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha256 => 32,
        }
    }

    /// Parse a hex digest for this algorithm, rejecting the wrong length
    pub fn from_hex(&self, s: &str) -> Result<Hash> {
        if s.len() != self.digest_len() * 2 {
            return Err(CairnError::InvalidHash(format!(
                "{} digest must be {} hex characters, got {:?}",
                self.name(),
                self.digest_len() * 2,
                s
            )));
        }
        let digest = decode_hex(s)
            .ok_or_else(|| CairnError::InvalidHash(format!("not a hex string: {:?}", s)))?;
        Ok(Hash {
            algorithm: *self,
            digest,
        })
    }

    /// Hash everything readable from `reader`
    pub fn hash_reader<R: Read>(&self, reader: R) -> std::io::Result<Hash> {
        let digest = match self {
            HashAlgorithm::Md5 => digest_reader::<Md5, _>(reader)?,
            HashAlgorithm::Sha1 => digest_reader::<Sha1, _>(reader)?,
            HashAlgorithm::Sha256 => digest_reader::<Sha256, _>(reader)?,
        };
        Ok(Hash {
            algorithm: *self,
            digest,
        })
    }

    /// Hash an in-memory buffer
    pub fn hash_bytes(&self, data: &[u8]) -> Hash {
        let digest = match self {
            HashAlgorithm::Md5 => Md5::digest(data).to_vec(),
            HashAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
            HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
        };
        Hash {
            algorithm: *self,
            digest,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "md5" => Some(HashAlgorithm::Md5),
            "sha1" => Some(HashAlgorithm::Sha1),
            "sha256" => Some(HashAlgorithm::Sha256),
            _ => None,
        }
    }

    fn for_hex_len(len: usize) -> Option<Self> {
        match len {
            32 => Some(HashAlgorithm::Md5),
            40 => Some(HashAlgorithm::Sha1),
            64 => Some(HashAlgorithm::Sha256),
            _ => None,
        }
    }
}

/// A content digest tagged with the algorithm that produced it.
///
/// The hex form is embedded in cache filenames, so two hashes compare equal
/// only when both the algorithm and the digest bytes match.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Hash {
    algorithm: HashAlgorithm,
    digest: Vec<u8>,
}

impl Hash {
    /// Parse `algo:hex`, or bare hex whose length identifies the algorithm
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some((name, hex)) = s.split_once(':') {
            let algorithm = HashAlgorithm::from_name(&name.to_ascii_lowercase())
                .ok_or_else(|| CairnError::InvalidHash(format!("unknown algorithm {:?}", name)))?;
            return algorithm.from_hex(hex);
        }
        let algorithm = HashAlgorithm::for_hex_len(s.len()).ok_or_else(|| {
            CairnError::InvalidHash(format!("cannot infer algorithm from {:?}", s))
        })?;
        algorithm.from_hex(s)
    }

    /// Hash a file's contents
    pub fn from_file<P: AsRef<Path>>(algorithm: HashAlgorithm, path: P) -> std::io::Result<Self> {
        let file = std::fs::File::open(path)?;
        algorithm.hash_reader(std::io::BufReader::new(file))
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Get the raw digest bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.digest
    }

    /// Get the digest as a lowercase hex string
    pub fn hex(&self) -> String {
        self.digest.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Get the digest as a prefixed hex string (e.g., "md5:d41d8c...")
    pub fn to_prefixed_hex(&self) -> String {
        format!("{}:{}", self.algorithm.name(), self.hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_prefixed_hex())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

fn digest_reader<D: Digest, R: Read>(mut reader: R) -> std::io::Result<Vec<u8>> {
    let mut hasher = D::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_vec())
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}
