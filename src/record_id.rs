use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use uuid::Uuid;

/// Builds `<prefix>-<unix millis>-<4 hex>` ids, retrying the suffix while `exists` reports a clash.
pub fn generate_record_id<F>(prefix: &str, mut exists: F) -> String
where
    F: FnMut(&str) -> bool,
{
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;

    for _ in 0..64 {
        let candidate = format!("{}-{}-{}", prefix, millis, short_suffix());
        if !exists(&candidate) {
            return candidate;
        }
    }

    format!(
        "{}-{}-{}",
        prefix,
        millis,
        &Uuid::now_v7().simple().to_string()[..12]
    )
}

fn short_suffix() -> String {
    let seed = Uuid::now_v7().to_string();
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..4].to_string()
}
