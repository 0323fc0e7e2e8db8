//! Digests hex para credenciales y códigos OTP.
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// SHA-256 de las partes unidas con `:`.
pub fn digest_hex(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update(b":");
        }
        hasher.update(part.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

pub fn new_salt() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable_and_separator_sensitive() {
        assert_eq!(digest_hex(&["a", "b"]), digest_hex(&["a", "b"]));
        assert_ne!(digest_hex(&["a", "b"]), digest_hex(&["ab"]));
        assert_eq!(digest_hex(&["x"]).len(), 64);
    }
}
