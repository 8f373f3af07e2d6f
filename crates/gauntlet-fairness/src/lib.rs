//! Provably-fair outcome derivation.
//!
//! Commit-reveal: the server publishes `hash_server_seed(seed)` before a
//! match, derives the outcome with [`calculate_outcome`], and reveals the
//! raw seed only after settlement. Anyone holding the revealed seed, the
//! combined client seed and the nonce can rerun [`verify_outcome`].
//!
//! ```
//! use gauntlet_fairness::{calculate_outcome, hash_server_seed, verify_outcome};
//!
//! let seed = "server-seed-test";
//! let commitment = hash_server_seed(seed);
//! let outcome = calculate_outcome(seed, "alice-bob", 7);
//!
//! let audit = verify_outcome(seed, &commitment, "alice-bob", 7, &outcome.hash).unwrap();
//! assert_eq!(audit.winner, outcome.winner);
//! ```

use hmac::{Hmac, Mac};
use rand::TryRngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

/// Bytes of entropy in a server seed (hex-encoded to 64 characters).
pub const SERVER_SEED_BYTES: usize = 32;

type HmacSha256 = Hmac<Sha256>;

/// Errors from seed generation and outcome verification.
#[derive(Debug, thiserror::Error)]
pub enum FairnessError {
    /// The operating system entropy source failed.
    #[error("entropy source failed: {0}")]
    Entropy(String),

    /// The revealed seed does not hash to the published commitment.
    #[error("server seed does not match its commitment")]
    CommitmentMismatch,

    /// Recomputing the outcome produced a different hash.
    #[error("outcome hash mismatch: expected {expected}, computed {computed}")]
    OutcomeMismatch { expected: String, computed: String },
}

/// Which side an outcome favours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Winner {
    SideA,
    SideB,
}

/// The derived result of one match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub winner: Winner,
    /// Full hex HMAC digest; published so the outcome can be audited.
    pub hash: String,
}

impl Outcome {
    pub fn side_a_wins(&self) -> bool {
        self.winner == Winner::SideA
    }
}

/// Generates a fresh 256-bit server seed, hex-encoded.
pub fn generate_server_seed() -> Result<String, FairnessError> {
    let mut bytes = [0u8; SERVER_SEED_BYTES];
    OsRng.try_fill_bytes(&mut bytes).map_err(|e| {
        tracing::error!(error = %e, "OS entropy source failed");
        FairnessError::Entropy(e.to_string())
    })?;
    Ok(hex::encode(bytes))
}

/// SHA-256 commitment to a server seed, hex-encoded.
pub fn hash_server_seed(server_seed: &str) -> String {
    hex::encode(Sha256::digest(server_seed.as_bytes()))
}

/// Derives the winner from `HMAC-SHA256(server_seed, "{client_seed}-{nonce}")`.
///
/// The first four digest bytes, read big-endian, decide: even means side A.
pub fn calculate_outcome(server_seed: &str, client_seed: &str, nonce: u64) -> Outcome {
    let message = format!("{client_seed}-{nonce}");
    let digest = hmac_digest(server_seed.as_bytes(), message.as_bytes());
    Outcome {
        winner: winner_from_digest(&digest),
        hash: hex::encode(digest),
    }
}

/// Checks a revealed match: the seed must match its commitment and the
/// recomputed outcome hash must match the published one.
pub fn verify_outcome(
    server_seed: &str,
    server_seed_hash: &str,
    client_seed: &str,
    nonce: u64,
    outcome_hash: &str,
) -> Result<Outcome, FairnessError> {
    if !hash_server_seed(server_seed).eq_ignore_ascii_case(server_seed_hash) {
        return Err(FairnessError::CommitmentMismatch);
    }
    let outcome = calculate_outcome(server_seed, client_seed, nonce);
    if !outcome.hash.eq_ignore_ascii_case(outcome_hash) {
        return Err(FairnessError::OutcomeMismatch {
            expected: outcome_hash.to_string(),
            computed: outcome.hash,
        });
    }
    Ok(outcome)
}

fn hmac_digest(key: &[u8], message: &[u8]) -> [u8; 32] {
    // HMAC is defined for keys of every length.
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(message);
    mac.finalize().into_bytes().into()
}

fn winner_from_digest(digest: &[u8; 32]) -> Winner {
    let value = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    if value % 2 == 0 {
        Winner::SideA
    } else {
        Winner::SideB
    }
}

/// Source of server seeds. The settlement path takes this as a seam so that
/// entropy failures can be exercised in tests.
pub trait SeedSource: Send + Sync + 'static {
    fn generate(&self) -> Result<String, FairnessError>;
}

/// Seeds from the operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsSeedSource;

impl SeedSource for OsSeedSource {
    fn generate(&self) -> Result<String, FairnessError> {
        generate_server_seed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_seed_is_64_hex_chars() {
        let seed = generate_server_seed().unwrap();
        assert_eq!(seed.len(), 64);
        assert!(seed.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_server_seeds_are_distinct() {
        let a = generate_server_seed().unwrap();
        let b = generate_server_seed().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_matches_known_sha256() {
        assert_eq!(
            hash_server_seed("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hash_differs_from_seed() {
        let seed = "test-seed";
        let hash = hash_server_seed(seed);
        assert_eq!(hash.len(), 64);
        assert_ne!(hash, seed);
    }

    #[test]
    fn test_hmac_matches_rfc4231_case_2() {
        let digest = hmac_digest(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(
            hex::encode(digest),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
        // 0x5bdcc146 is even.
        assert_eq!(winner_from_digest(&digest), Winner::SideA);
    }

    #[test]
    fn test_odd_prefix_favours_side_b() {
        let mut digest = [0u8; 32];
        digest[3] = 0x01;
        assert_eq!(winner_from_digest(&digest), Winner::SideB);
        // Bytes past the prefix are ignored.
        digest[3] = 0x02;
        digest[4] = 0x01;
        assert_eq!(winner_from_digest(&digest), Winner::SideA);
    }

    #[test]
    fn test_reference_scenario_is_stable_and_nonce_sensitive() {
        let first = calculate_outcome("server-seed-test", "client-seed-test", 1);
        let again = calculate_outcome("server-seed-test", "client-seed-test", 1);
        assert_eq!(first, again);

        let next = calculate_outcome("server-seed-test", "client-seed-test", 2);
        assert_ne!(first.hash, next.hash);
    }

    #[test]
    fn test_outcome_hash_is_full_hex_digest() {
        let outcome = calculate_outcome("s", "c", 0);
        assert_eq!(outcome.hash.len(), 64);
        let prefix = u32::from_str_radix(&outcome.hash[..8], 16).unwrap();
        assert_eq!(outcome.side_a_wins(), prefix % 2 == 0);
    }

    #[test]
    fn test_verify_accepts_honest_match() {
        let seed = generate_server_seed().unwrap();
        let commitment = hash_server_seed(&seed);
        let outcome = calculate_outcome(&seed, "a-b", 3);

        let verified = verify_outcome(&seed, &commitment, "a-b", 3, &outcome.hash).unwrap();
        assert_eq!(verified, outcome);
    }

    #[test]
    fn test_verify_rejects_swapped_seed() {
        let commitment = hash_server_seed("original");
        let outcome = calculate_outcome("original", "a-b", 3);

        let err = verify_outcome("forged", &commitment, "a-b", 3, &outcome.hash).unwrap_err();
        assert!(matches!(err, FairnessError::CommitmentMismatch));
    }

    #[test]
    fn test_verify_rejects_wrong_nonce() {
        let commitment = hash_server_seed("seed");
        let outcome = calculate_outcome("seed", "a-b", 3);

        let err = verify_outcome("seed", &commitment, "a-b", 4, &outcome.hash).unwrap_err();
        assert!(matches!(err, FairnessError::OutcomeMismatch { .. }));
    }

    #[test]
    fn test_os_seed_source_generates_seeds() {
        let seed = OsSeedSource.generate().unwrap();
        assert_eq!(seed.len(), SERVER_SEED_BYTES * 2);
    }
}
