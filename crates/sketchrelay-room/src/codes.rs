//! Room-code and host-token generation.
//!
//! Codes must look random (guessing a live room should be hard), never
//! collide with a live room, and generation must always terminate,
//! even in the pathological case where the whole 6-digit space is
//! taken. The generator hashes a process-lifetime secret together with
//! a monotone counter, so codes are non-sequential without any
//! bookkeeping of past values.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Size of the code space: 6 decimal digits.
const CODE_SPACE: u32 = 1_000_000;

/// Attempts on the hash-based path before falling back.
const HASH_ATTEMPTS: usize = 1000;

/// Attempts drawing directly from the RNG before the exhaustive scan.
const RANDOM_ATTEMPTS: usize = 100;

/// Generates unpredictable, collision-checked 6-digit room codes.
///
/// Owned by the hub behind its own lock; `generate` is handed a
/// collision predicate so the caller decides what "in use" means.
pub struct CodeGenerator {
    counter: u64,
    secret: [u8; 32],
}

impl CodeGenerator {
    /// Creates a generator with a random secret and counter seed.
    pub fn new() -> Self {
        let mut rng = rand::rng();
        Self {
            counter: rng.random_range(0..CODE_SPACE as u64),
            secret: rng.random(),
        }
    }

    /// Returns a code for which `in_use` is false.
    ///
    /// The counter advances on every attempt, collision or not, so the
    /// sequence never revisits a candidate. If the hash path and the
    /// random fallback both exhaust their attempts, an exhaustive scan
    /// finds the first free code; with literally every code taken the
    /// degenerate `"000000"` sentinel is returned.
    pub fn generate(&mut self, in_use: impl Fn(&str) -> bool) -> String {
        for _ in 0..HASH_ATTEMPTS {
            let code = self.hash_candidate();
            self.counter += 1;
            if !in_use(&code) {
                return code;
            }
        }

        // Too many collisions for hashing to dodge: draw directly.
        let mut rng = rand::rng();
        for _ in 0..RANDOM_ATTEMPTS {
            let bytes: [u8; 3] = rng.random();
            let code = format_code(three_byte_code(bytes));
            if !in_use(&code) {
                return code;
            }
        }

        // Near-saturation: take the first free code.
        for n in 0..CODE_SPACE {
            let code = format_code(n);
            if !in_use(&code) {
                return code;
            }
        }

        tracing::warn!("room code space exhausted, returning sentinel");
        format_code(0)
    }

    /// SHA-256(secret ‖ counter), folded down to the code space.
    fn hash_candidate(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret);
        hasher.update(self.counter.to_be_bytes());
        let digest = hasher.finalize();
        format_code(three_byte_code([digest[0], digest[1], digest[2]]))
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn three_byte_code(bytes: [u8; 3]) -> u32 {
    let n =
        ((bytes[0] as u32) << 16) | ((bytes[1] as u32) << 8) | bytes[2] as u32;
    n % CODE_SPACE
}

fn format_code(n: u32) -> String {
    format!("{n:06}")
}

/// Generates a 32-character hex host token (128 bits of entropy).
///
/// Possession of this string is the sole proof of host identity across
/// reconnects, so it must be infeasible to guess.
pub fn host_token() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_produces_six_digit_codes() {
        let mut generator = CodeGenerator::new();
        for _ in 0..100 {
            let code = generator.generate(|_| false);
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()), "code {code}");
        }
    }

    #[test]
    fn test_generate_avoids_in_use_codes() {
        let mut generator = CodeGenerator::new();
        let mut taken = HashSet::new();
        // Claim each generated code and keep generating: no repeats.
        for _ in 0..500 {
            let code = generator.generate(|c| taken.contains(c));
            assert!(taken.insert(code));
        }
    }

    #[test]
    fn test_generate_skips_colliding_hash_candidates() {
        let mut generator = CodeGenerator::new();
        let first = generator.generate(|_| false);
        // Force a collision on exactly that code; the next call must
        // still succeed with something else.
        let mut generator = CodeGenerator::new();
        let second = generator.generate(|c| c == first);
        assert_ne!(first, second);
    }

    #[test]
    fn test_generate_finds_last_free_code() {
        // Every code except one is taken: the exhaustive-scan path
        // must locate it.
        let free = "123456";
        let mut generator = CodeGenerator::new();
        let code = generator.generate(|c| c != free);
        assert_eq!(code, free);
    }

    #[test]
    fn test_generate_terminates_on_full_space() {
        // Pathological saturation: all 1,000,000 codes taken. The call
        // must still return (the degenerate sentinel).
        let mut generator = CodeGenerator::new();
        let code = generator.generate(|_| true);
        assert_eq!(code, "000000");
    }

    #[test]
    fn test_host_token_is_32_hex_chars() {
        let token = host_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_host_tokens_are_unique() {
        let a = host_token();
        let b = host_token();
        assert_ne!(a, b);
    }
}
