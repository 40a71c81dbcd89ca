// src/conn/identity.rs

use rand::Rng;

const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 7;

/// Generate a random client identifier such as `client-k3x9a0q`.
///
/// Generated once per session and reused across reconnects, so the backend
/// can correlate one client across disconnects.
pub fn generate_client_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("client-{suffix}")
}

/// Transport endpoint for a client: `<base>/ws/<client_id>`.
pub fn endpoint_for(ws_base: &str, client_id: &str) -> String {
    format!("{}/ws/{}", ws_base.trim_end_matches('/'), client_id)
}
