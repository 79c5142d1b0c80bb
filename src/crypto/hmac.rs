use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use crate::crypto::params::SignableRequest;
use crate::crypto::signer::Signer;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 signer reproducing the provider's own verification routine.
pub struct HMacSigner {
    key: Vec<u8>,
}

impl HMacSigner {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }

    /// Builds the exact byte string the provider hashes.
    ///
    /// Values are stringified, keys sorted, and the result serialized as
    /// compact JSON. Non-ASCII characters stay literal UTF-8 and `/` is not
    /// escaped; only `"`, `\` and control characters get escape sequences.
    pub fn canonicalize(&self, request: &SignableRequest) -> String {
        // BTreeMap<String, String> serializes in key order and cannot fail.
        serde_json::to_string(&request.stringified()).unwrap_or_else(|_| String::from("{}"))
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.key).expect("HMAC accepts keys of any length")
    }
}

impl Signer for HMacSigner {
    fn sign(&self, request: &SignableRequest) -> String {
        let canonical = self.canonicalize(request);

        let mut mac = self.mac();
        mac.update(canonical.as_bytes());
        let signature = format!("{:x}", mac.finalize().into_bytes());

        debug!(payload = %canonical, %signature, "signed provider request");
        signature
    }

    /// Verifies a signature against a request using constant-time comparison.
    fn verify(&self, request: &SignableRequest, signature: &str) -> bool {
        if signature.len() % 2 != 0 || !signature.is_ascii() {
            return false;
        }

        let sig_bytes: Result<Vec<u8>, _> = (0..signature.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&signature[i..i + 2], 16))
            .collect();

        let mut mac = self.mac();
        mac.update(self.canonicalize(request).as_bytes());

        match sig_bytes {
            Ok(bytes) => mac.verify_slice(&bytes).is_ok(),
            Err(_) => false,
        }
    }
}

/// Signs `params` with `secret_key`, returning a 64-character lowercase hex digest.
pub fn sign(params: &SignableRequest, secret_key: &str) -> String {
    HMacSigner::new(secret_key.as_bytes()).sign(params)
}
