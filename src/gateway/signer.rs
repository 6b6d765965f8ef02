use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::domain::ports::GatewaySigner;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 signer over the `&`-joined `key=value` pairs in key order,
/// hex-encoded. The secret is the server-held gateway salt; it never leaves
/// this process.
pub struct HmacSha256Signer {
    secret: String,
}

impl HmacSha256Signer {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn canonical(fields: &BTreeMap<String, String>) -> String {
        let mut payload = String::new();
        for (key, value) in fields {
            if !payload.is_empty() {
                payload.push('&');
            }
            payload.push_str(key);
            payload.push('=');
            payload.push_str(value);
        }
        payload
    }
}

impl GatewaySigner for HmacSha256Signer {
    fn sign(&self, fields: &BTreeMap<String, String>) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(Self::canonical(fields).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn verify(&self, fields: &BTreeMap<String, String>, checksum: &str) -> bool {
        constant_time_eq(&self.sign(fields), checksum)
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        diff |= x ^ y;
    }
    diff == 0
}
