//! HMAC-SHA256 request signing for the payment gateway.
//!
//! Every request carries four headers: the application id, a unix
//! timestamp, a random nonce and a signature over those three values. The
//! gateway rebuilds the same canonical string on its side, so the
//! canonicalization here has to be byte-for-byte deterministic.

use crate::{PayError, Result};
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::RequestBuilder;
use sha2::Sha256;
use std::collections::BTreeMap;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

pub const HEADER_APP_ID: &str = "X-App-Id";
pub const HEADER_TIMESTAMP: &str = "X-Timestamp";
pub const HEADER_NONCE: &str = "X-Nonce";
pub const HEADER_SIGN: &str = "X-Sign";

/// Parameter key that is never part of the canonical string
pub const SIGN_FIELD: &str = "sign";

/// Length of generated nonces
pub const NONCE_LENGTH: usize = 16;

/// Application credentials issued by the gateway
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    app_id: String,
    app_secret: String,
}

impl Credentials {
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub(crate) fn app_secret(&self) -> &str {
        &self.app_secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("app_secret", &"<redacted>")
            .finish()
    }
}

/// Build the canonical string: non-empty parameters other than `sign`,
/// sorted by key, joined as `key=value` pairs with `&`.
///
/// When a key appears more than once the last value wins.
pub fn canonical_string<I, K, V>(params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut sorted = BTreeMap::new();
    for (key, value) in params {
        let (key, value) = (key.as_ref().to_string(), value.as_ref().to_string());
        if key == SIGN_FIELD {
            continue;
        }
        if value.is_empty() {
            sorted.remove(&key);
            continue;
        }
        sorted.insert(key, value);
    }

    sorted
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&")
}

/// Sign a parameter set with the shared secret.
///
/// Returns the lowercase hex HMAC-SHA256 digest of [`canonical_string`].
pub fn sign<I, K, V>(secret: &str, params: I) -> Result<String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let canonical = canonical_string(params);
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PayError::signing(format!("Failed to create HMAC: {}", e)))?;
    mac.update(canonical.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Generate a random alphanumeric nonce.
///
/// Uses the thread-local RNG; the nonce only needs to be unique, not secret.
pub fn generate_nonce(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Per-request signing input. Never reuse one across requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequestContext {
    pub app_id: String,
    pub timestamp: i64,
    pub nonce: String,
}

impl SignedRequestContext {
    /// Fresh context stamped with the current time and a new nonce
    pub fn generate(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            timestamp: chrono::Utc::now().timestamp(),
            nonce: generate_nonce(NONCE_LENGTH),
        }
    }

    /// Context with caller-chosen timestamp and nonce
    pub fn with_values(app_id: impl Into<String>, timestamp: i64, nonce: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            timestamp,
            nonce: nonce.into(),
        }
    }

    /// Compute the signed header set for this context
    pub fn sign(&self, secret: &str) -> Result<AuthHeaders> {
        let timestamp = self.timestamp.to_string();
        let signature = sign(
            secret,
            [
                ("appId", self.app_id.as_str()),
                ("timestamp", timestamp.as_str()),
                ("nonce", self.nonce.as_str()),
            ],
        )?;

        Ok(AuthHeaders {
            app_id: self.app_id.clone(),
            timestamp,
            nonce: self.nonce.clone(),
            signature,
        })
    }
}

/// The four authentication header values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    pub app_id: String,
    pub timestamp: String,
    pub nonce: String,
    pub signature: String,
}

impl AuthHeaders {
    /// Header name/value pairs in a fixed order
    pub fn pairs(&self) -> [(&'static str, &str); 4] {
        [
            (HEADER_APP_ID, self.app_id.as_str()),
            (HEADER_TIMESTAMP, self.timestamp.as_str()),
            (HEADER_NONCE, self.nonce.as_str()),
            (HEADER_SIGN, self.signature.as_str()),
        ]
    }

    /// Attach the headers to an outgoing request
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        self.pairs()
            .into_iter()
            .fold(request, |request, (name, value)| request.header(name, value))
    }
}

/// Generate a fresh context for `credentials` and sign it
pub fn auth_headers(credentials: &Credentials) -> Result<AuthHeaders> {
    SignedRequestContext::generate(credentials.app_id()).sign(credentials.app_secret())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_known_signature() {
        let signature = sign(
            "secret",
            [("appId", "app"), ("timestamp", "1700000000"), ("nonce", "abc")],
        )
        .unwrap();

        assert_eq!(
            signature,
            "16ec476c428005724b1eac635fd54e7c0cd56df8f5957127e80e18b7fd9304dc"
        );
    }

    #[test]
    fn test_canonical_string_sorted_and_filtered() {
        let canonical = canonical_string([
            ("timestamp", "1700000000"),
            ("sign", "ignored"),
            ("appId", "app"),
            ("empty", ""),
            ("nonce", "abc"),
        ]);

        assert_eq!(canonical, "appId=app&nonce=abc&timestamp=1700000000");
    }

    #[test]
    fn test_canonical_string_byte_order() {
        // uppercase sorts before lowercase
        assert_eq!(canonical_string([("b", "1"), ("B", "2"), ("a", "3")]), "B=2&a=3&b=1");
    }

    #[test]
    fn test_signature_independent_of_insertion_order() {
        let pairs = [
            ("appId", "demo-app"),
            ("nonce", "Ab3dEf6hIj9kLm2n"),
            ("timestamp", "1700000000"),
            ("orderNo", "P001"),
        ];

        let forward = sign("test-secret", pairs).unwrap();
        let mut reversed = pairs;
        reversed.reverse();
        let backward = sign("test-secret", reversed).unwrap();
        let from_map: HashMap<&str, &str> = pairs.into_iter().collect();
        let hashed = sign("test-secret", &from_map).unwrap();

        assert_eq!(forward, backward);
        assert_eq!(forward, hashed);
    }

    #[test]
    fn test_empty_values_do_not_affect_signature() {
        let base = [("appId", "demo-app"), ("nonce", "n1"), ("timestamp", "1")];
        let with_empty = [
            ("appId", "demo-app"),
            ("extra", ""),
            ("nonce", "n1"),
            ("timestamp", "1"),
            ("userId", ""),
        ];

        assert_eq!(
            sign("k", base).unwrap(),
            sign("k", with_empty).unwrap()
        );
    }

    #[test]
    fn test_different_secrets_differ() {
        let params = [("appId", "a")];
        assert_ne!(sign("one", params).unwrap(), sign("two", params).unwrap());
    }

    #[test]
    fn test_nonce_shape() {
        for _ in 0..10_000 {
            let nonce = generate_nonce(NONCE_LENGTH);
            assert_eq!(nonce.len(), NONCE_LENGTH);
            assert!(nonce.bytes().all(|b| b.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn test_context_sign() {
        let context = SignedRequestContext::with_values("demo-app", 1700000000, "Ab3dEf6hIj9kLm2n");
        let headers = context.sign("test-secret").unwrap();

        assert_eq!(headers.app_id, "demo-app");
        assert_eq!(headers.timestamp, "1700000000");
        assert_eq!(headers.nonce, "Ab3dEf6hIj9kLm2n");
        assert_eq!(
            headers.signature,
            "32d186b0cde389eef7390a680d28574a35879af28e12bb881be6c9b91dfc6f2b"
        );
        assert_eq!(headers.pairs()[3], (HEADER_SIGN, headers.signature.as_str()));
    }

    #[test]
    fn test_fresh_contexts_use_new_nonces() {
        let credentials = Credentials::new("demo-app", "test-secret");
        let first = auth_headers(&credentials).unwrap();
        let second = auth_headers(&credentials).unwrap();

        assert_ne!(first.nonce, second.nonce);
        assert_eq!(first.signature.len(), 64);
        assert!(first
            .signature
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let credentials = Credentials::new("demo-app", "super-secret");
        let debug = format!("{:?}", credentials);
        assert!(debug.contains("demo-app"));
        assert!(!debug.contains("super-secret"));
    }
}
