use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// One authorization attempt's PKCE verifier and anti-forgery state.
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
    pub state: String,
}

impl PkcePair {
    pub fn generate() -> Self {
        let verifier = random_token::<48>();
        let challenge = challenge_for(&verifier);
        Self {
            verifier,
            challenge,
            state: random_token::<16>(),
        }
    }
}

/// S256 challenge: `BASE64URL(SHA256(verifier))`.
pub fn challenge_for(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

fn random_token<const N: usize>() -> String {
    let mut bytes = [0u8; N];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
