use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Prefix GitHub puts in front of the hex digest in `X-Hub-Signature`.
pub const SIGNATURE_PREFIX: &str = "sha1=";

/// Verifies a GitHub webhook signature using constant-time comparison.
///
/// GitHub sends `X-Hub-Signature: sha1=<hex>`. This function validates the
/// HMAC-SHA1 of the raw request body against that header value. Malformed
/// headers (missing prefix, bad hex, wrong length) are rejected, never a panic.
pub fn verify(secret: &str, body: &[u8], signature_header: &str) -> bool {
    let Some(hex_sig) = signature_header.strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };

    let Ok(expected) = hex::decode(hex_sig) else {
        return false;
    };

    let Ok(mut mac) = HmacSha1::new_from_slice(secret.as_bytes()) else {
        return false;
    };

    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Computes the `sha1=<hex>` header value GitHub would send for `body`.
pub fn signature_header(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(format!(
        "{SIGNATURE_PREFIX}{}",
        hex::encode(mac.finalize().into_bytes())
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, body: &[u8]) -> String {
        signature_header(secret, body).unwrap()
    }

    #[test]
    fn valid_signature_passes() {
        let sig = sign("test-secret", b"hello world");
        assert!(verify("test-secret", b"hello world", &sig));
    }

    #[test]
    fn known_digest_matches() {
        // HMAC-SHA1("key", "The quick brown fox jumps over the lazy dog")
        assert_eq!(
            sign("key", b"The quick brown fox jumps over the lazy dog"),
            "sha1=de7c9b85b8b78aa6bc8a7a36f70a90701c9db4d9"
        );
    }

    #[test]
    fn wrong_secret_fails() {
        let sig = sign("correct-secret", b"body");
        assert!(!verify("wrong-secret", b"body", &sig));
    }

    #[test]
    fn tampered_body_fails() {
        let sig = sign("secret", b"original body");
        assert!(!verify("secret", b"tampered body", &sig));
    }

    #[test]
    fn sha256_header_is_not_accepted() {
        let sig = sign("secret", b"body");
        let raw_hex = sig.strip_prefix("sha1=").unwrap();
        assert!(!verify("secret", b"body", raw_hex));
        assert!(!verify("secret", b"body", &format!("sha256={raw_hex}")));
    }

    #[test]
    fn short_or_invalid_hex_fails() {
        assert!(!verify("secret", b"body", "sha1=not-valid-hex!"));
        assert!(!verify("secret", b"body", "sha1=abcd"));
        assert!(!verify("secret", b"body", ""));
        assert!(!verify("secret", b"body", "sha1"));
    }
}
