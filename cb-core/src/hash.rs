use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::error::{BundleError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Keyed-digest key baked into the bundle format. It marks provenance of the
/// well-known control files; it is not a confidentiality secret.
const DETAIL_KEY: &[u8; 64] = &[
    0xd4, 0x1f, 0xdb, 0xe3, 0x37, 0xd0, 0x01, 0x68, 0x0c, 0x2a, 0x4d, 0x43, 0xaf, 0xe5, 0x70,
    0xc7, 0x1f, 0xde, 0x85, 0xd8, 0xf3, 0xd4, 0xc4, 0x6f, 0x37, 0x99, 0xc1, 0x8f, 0x1f, 0x50,
    0x82, 0x77, 0xac, 0xa7, 0xab, 0x63, 0x32, 0x83, 0x71, 0x0c, 0x2b, 0xb4, 0x1a, 0x07, 0x8e,
    0xfb, 0xe7, 0xc1, 0x9c, 0xf0, 0x87, 0xa7, 0xe1, 0x37, 0x75, 0x2a, 0xb7, 0x58, 0x1c, 0x8d,
    0x9c, 0x0e, 0x3d, 0xe9,
];

pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut h = Sha256::new();
    h.update(data);
    h.finalize().into()
}

/// HMAC-SHA256 over the file bytes with the fixed format key.
pub fn detail_digest(data: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(DETAIL_KEY).expect("hmac accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

pub fn encode(digest: &[u8]) -> String {
    STANDARD.encode(digest)
}

pub fn decode(s: &str) -> Result<[u8; 32]> {
    let raw = STANDARD
        .decode(s)
        .map_err(|e| BundleError::Format(format!("bad base64 digest `{s}`: {e}")))?;
    raw.try_into()
        .map_err(|_| BundleError::Format(format!("digest `{s}` is not 32 bytes")))
}

/// Nine hex characters of OS randomness. A per-emission tag, not a security
/// token.
pub fn short_uuid() -> Result<String> {
    let mut buf = [0u8; 16];
    getrandom::getrandom(&mut buf).map_err(std::io::Error::from)?;
    Ok(hex::encode(buf)[..9].to_string())
}
