use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::evaluation::SatisfactionMatrix;

/// One bit per condition, set when the condition held at least once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Verdict(u8);

impl Verdict {
    pub fn from_matrix(matrix: &SatisfactionMatrix) -> Self {
        let bits = (0..matrix.condition_count().min(u8::BITS as usize))
            .filter(|&condition| matrix.row_satisfied(condition))
            .fold(0u8, |bits, condition| bits | (1 << condition));
        Self(bits)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn condition_satisfied(self, condition: usize) -> bool {
        condition < u8::BITS as usize && self.0 & (1 << condition) != 0
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lowercase hex SHA-256 of `"<secret>:<task>:<salt>:<verdict>"`.
pub fn verification_code(secret: &str, task_name: &str, salt: i32, verdict: Verdict) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{secret}:{task_name}:{salt}:{verdict}").as_bytes());
    to_hex_lower(&hasher.finalize())
}

fn to_hex_lower(bytes: &[u8]) -> String {
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        use std::fmt::Write as _;
        let _ = write!(&mut output, "{byte:02x}");
    }
    output
}
