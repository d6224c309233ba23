// src/utils/token.rs

use rand::{RngCore, rngs::OsRng};

/// Number of random bytes in a participant token (64 bits of entropy).
const PARTICIPANT_TOKEN_BYTES: usize = 8;

/// Generates a participant token: 16 lowercase hex characters from the OS CSPRNG.
///
/// The token accompanies every action on a session. It is a capability
/// check against guessed session ids, not an authentication mechanism.
pub fn generate_participant_token() -> String {
    let mut bytes = [0u8; PARTICIPANT_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Generates a session (response) identifier.
pub fn generate_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
