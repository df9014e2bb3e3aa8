use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use twox_hash::XxHash64;

use crate::error::{Error, IoResultExt, Result};

/// Only the first 10 MiB of a file are hashed.
pub const MAX_HASHABLE_SIZE: u64 = 10 * 1024 * 1024;

/// XXH64 of a file's leading bytes, shown as 16 lowercase hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0.to_be_bytes()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFingerprintError;

impl fmt::Display for ParseFingerprintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected 16 hexadecimal digits")
    }
}

impl std::error::Error for ParseFingerprintError {}

impl FromStr for Fingerprint {
    type Err = ParseFingerprintError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut bytes = [0u8; 8];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| ParseFingerprintError)?;
        Ok(Fingerprint(u64::from_be_bytes(bytes)))
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub fn fingerprint_bytes(bytes: &[u8]) -> Fingerprint {
    Fingerprint(XxHash64::oneshot(0, bytes))
}

/// Hash the first `min(size, 10 MiB)` bytes of the file at `path`.
pub fn fingerprint_file(path: &Path) -> Result<Fingerprint> {
    let file = File::open(path).at(path)?;
    let size = file.metadata().at(path)?.len();

    let mut bytes = Vec::with_capacity(size.min(MAX_HASHABLE_SIZE) as usize);
    file.take(MAX_HASHABLE_SIZE)
        .read_to_end(&mut bytes)
        .at(path)?;

    if bytes.is_empty() && size > 0 {
        return Err(Error::EmptyRead(path.to_path_buf()));
    }

    Ok(fingerprint_bytes(&bytes))
}
