//! Random ticket and token generation.
//!
//! Tickets carry 256 bits of entropy and are never typed by people.
//! Tokens are 8 characters over a 62-symbol alphabet (~47 bits): short
//! enough to read off one screen and type into another, and only alive for
//! five minutes.

use base64::Engine;
use eq_session_core::IdGenerator;
use rand::Rng;

/// Raw bytes drawn for a ticket.
pub const TICKET_BYTES: usize = 32;

/// Characters in a token.
pub const TOKEN_LENGTH: usize = 8;

/// Symbols a token is drawn from.
pub const TOKEN_ALPHABET: &[u8; 62] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generator backed by the thread-local CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl RandomIdGenerator {
    /// Create a new generator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl IdGenerator for RandomIdGenerator {
    fn ticket(&self) -> String {
        let bytes: [u8; TICKET_BYTES] = rand::random();
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    fn token(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..TOKEN_LENGTH)
            .map(|_| char::from(TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())]))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ticket_decodes_to_32_bytes() {
        let ticket = RandomIdGenerator.ticket();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&ticket)
            .unwrap();

        assert_eq!(ticket.len(), 44);
        assert_eq!(bytes.len(), TICKET_BYTES);
    }

    #[test]
    fn test_token_shape() {
        for _ in 0..100 {
            let token = RandomIdGenerator.token();
            assert_eq!(token.len(), TOKEN_LENGTH);
            assert!(token.bytes().all(|b| TOKEN_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_alphabet_has_no_duplicates() {
        let unique: HashSet<_> = TOKEN_ALPHABET.iter().collect();
        assert_eq!(unique.len(), 62);
    }

    #[test]
    fn test_tickets_differ() {
        let tickets: HashSet<_> = (0..1000).map(|_| RandomIdGenerator.ticket()).collect();
        assert_eq!(tickets.len(), 1000);
    }
}
