//! One-time verification codes.
//!
//! Codes are six random digits with no collision avoidance beyond their
//! length. Pickup and drop-off codes are drawn independently. Once a claim
//! holds a code it is never rotated.

use rand::Rng;

use super::model::Verification;

/// Number of digits in a verification code.
pub const CODE_LENGTH: usize = 6;

const CODE_SPACE: u32 = 1_000_000;

/// Source of fresh verification codes.
pub trait CodeGenerator: Send + Sync {
    /// Produce one code of [`CODE_LENGTH`] digits.
    fn generate(&self) -> String;
}

/// Codes drawn from the thread-local CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> String {
        let n = rand::rng().random_range(0..CODE_SPACE);
        format!("{:0width$}", n, width = CODE_LENGTH)
    }
}

/// Fill in whichever codes are missing, keeping any already issued.
///
/// Returns `true` if a code was generated.
pub fn issue_missing(verification: &mut Verification, generator: &dyn CodeGenerator) -> bool {
    let mut issued = false;
    if verification.pickup_code.is_none() {
        verification.pickup_code = Some(generator.generate());
        issued = true;
    }
    if verification.dropoff_code.is_none() {
        verification.dropoff_code = Some(generator.generate());
        issued = true;
    }
    issued
}

/// Strip everything but ASCII digits, so "482-913" and "482913" compare equal.
pub fn normalize(code: &str) -> String {
    code.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Compare a caller-supplied code with the stored one after normalization.
///
/// A supplied code with no digits never matches.
pub fn matches(supplied: &str, stored: &str) -> bool {
    let supplied = normalize(supplied);
    !supplied.is_empty() && supplied == normalize(stored)
}
