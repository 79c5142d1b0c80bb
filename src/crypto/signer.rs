use crate::crypto::params::SignableRequest;

pub trait Signer {
    /// Lowercase hex signature over the canonical form of `request`.
    fn sign(&self, request: &SignableRequest) -> String;
    fn verify(&self, request: &SignableRequest, signature: &str) -> bool;
}
