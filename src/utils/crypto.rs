use ring::digest::{Algorithm, Context, SHA1_FOR_LEGACY_USE_ONLY, SHA256};

use crate::error::{BlockchainError, Result};
use data_encoding::HEXLOWER;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn current_timestamp() -> Result<i64> {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| BlockchainError::Io(format!("System time error: {e}")))?
        .as_millis();

    // Ensure the timestamp fits in i64
    if duration > i64::MAX as u128 {
        return Err(BlockchainError::Io("Timestamp overflow".to_string()));
    }

    Ok(duration as i64)
}

fn digest_with(algorithm: &'static Algorithm, data: &[u8]) -> Vec<u8> {
    let mut context = Context::new(algorithm);
    context.update(data);
    let digest = context.finish();
    digest.as_ref().to_vec()
}

pub fn sha256_digest(data: &[u8]) -> Vec<u8> {
    digest_with(&SHA256, data)
}

/// SHA-1 is only used to reproduce the legacy block format byte for byte.
pub fn sha1_digest(data: &[u8]) -> Vec<u8> {
    digest_with(&SHA1_FOR_LEGACY_USE_ONLY, data)
}

pub fn sha256_hex(data: &[u8]) -> String {
    HEXLOWER.encode(&sha256_digest(data))
}

pub fn sha1_hex(data: &[u8]) -> String {
    HEXLOWER.encode(&sha1_digest(data))
}
