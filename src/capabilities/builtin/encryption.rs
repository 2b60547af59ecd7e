//! Encryption capability: digests, HMAC and binary-to-text encodings.
//!
//! Options:
//! - `action`: `hash` (default), `hmac`, `encode`, `decode`
//! - `algorithm`: `sha256` (default), `sha512`, `md5`
//! - `encoding`: `hex` or `base64`; digests default to `hex`, `encode` and
//!   `decode` default to `base64`
//! - `key`: secret for `hmac`

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use md5::Md5;
use serde_json::{json, Value};
use sha2::{Digest, Sha256, Sha512};

use crate::capabilities::capability::{option_str, Capability, CapabilityFailure};

const ALGORITHMS: &[&str] = &["sha256", "sha512", "md5"];

#[derive(Debug, Default)]
pub struct Encryption;

impl Encryption {
    pub const NAME: &'static str = "encryption";

    pub fn new() -> Self {
        Self
    }

    fn digest(action: &str, algorithm: &str, data: &[u8]) -> Result<Vec<u8>, CapabilityFailure> {
        match algorithm {
            "sha256" => Ok(Sha256::digest(data).to_vec()),
            "sha512" => Ok(Sha512::digest(data).to_vec()),
            "md5" => Ok(Md5::digest(data).to_vec()),
            other => Err(unsupported_algorithm(action, other)),
        }
    }

    fn hmac(
        action: &str,
        algorithm: &str,
        key: &[u8],
        data: &[u8],
    ) -> Result<Vec<u8>, CapabilityFailure> {
        let invalid_key = |e: hmac::digest::InvalidLength| CapabilityFailure::new(e.to_string());
        match algorithm {
            "sha256" => {
                let mut mac = Hmac::<Sha256>::new_from_slice(key).map_err(invalid_key)?;
                mac.update(data);
                Ok(mac.finalize().into_bytes().to_vec())
            }
            "sha512" => {
                let mut mac = Hmac::<Sha512>::new_from_slice(key).map_err(invalid_key)?;
                mac.update(data);
                Ok(mac.finalize().into_bytes().to_vec())
            }
            "md5" => {
                let mut mac = Hmac::<Md5>::new_from_slice(key).map_err(invalid_key)?;
                mac.update(data);
                Ok(mac.finalize().into_bytes().to_vec())
            }
            other => Err(unsupported_algorithm(action, other)),
        }
    }

    fn encode(encoding: &str, bytes: &[u8]) -> Result<String, CapabilityFailure> {
        match encoding {
            "hex" => Ok(hex::encode(bytes)),
            "base64" => Ok(STANDARD.encode(bytes)),
            other => Err(CapabilityFailure::new(format!("Unsupported encoding: {}", other))),
        }
    }

    fn decode(encoding: &str, text: &str) -> Result<Vec<u8>, CapabilityFailure> {
        match encoding {
            "hex" => hex::decode(text.trim())
                .map_err(|e| CapabilityFailure::new(format!("Invalid hex input: {}", e))),
            "base64" => STANDARD
                .decode(text.trim())
                .map_err(|e| CapabilityFailure::new(format!("Invalid base64 input: {}", e))),
            other => Err(CapabilityFailure::new(format!("Unsupported encoding: {}", other))),
        }
    }
}

fn unsupported_algorithm(action: &str, algorithm: &str) -> CapabilityFailure {
    CapabilityFailure::new(format!("Unsupported algorithm: {}", algorithm))
        .with_details(json!({ "action": action, "supported": ALGORITHMS }))
}

#[async_trait]
impl Capability for Encryption {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Hash, sign and encode data"
    }

    fn version(&self) -> Option<&str> {
        Some("1.0.0")
    }

    async fn execute(&self, input: &str, options: &Value) -> Result<Value, CapabilityFailure> {
        let action = option_str(options, "action", "hash");
        let algorithm = option_str(options, "algorithm", "sha256");

        let body = match action {
            "hash" => {
                let encoding = option_str(options, "encoding", "hex");
                let digest = Self::digest(action, algorithm, input.as_bytes())?;
                json!({ "algorithm": algorithm, "encoding": encoding, "hash": Self::encode(encoding, &digest)? })
            }
            "hmac" => {
                let key = options
                    .get("key")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        CapabilityFailure::new("A key is required for hmac")
                            .with_details(json!({ "action": action }))
                    })?;
                let encoding = option_str(options, "encoding", "hex");
                let mac = Self::hmac(action, algorithm, key.as_bytes(), input.as_bytes())?;
                json!({ "algorithm": algorithm, "encoding": encoding, "hmac": Self::encode(encoding, &mac)? })
            }
            "encode" => {
                let encoding = option_str(options, "encoding", "base64");
                json!({ "encoding": encoding, "encoded": Self::encode(encoding, input.as_bytes())? })
            }
            "decode" => {
                let encoding = option_str(options, "encoding", "base64");
                let bytes = Self::decode(encoding, input)?;
                let decoded = String::from_utf8(bytes)
                    .map_err(|_| CapabilityFailure::new("Decoded data is not valid UTF-8"))?;
                json!({ "encoding": encoding, "decoded": decoded })
            }
            other => {
                return Err(CapabilityFailure::new(format!("Unknown action: {}", other))
                    .with_details(json!({ "action": other })));
            }
        };

        let mut result = json!({
            "action": action,
            "source": Self::NAME,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        if let (Some(out), Value::Object(fields)) = (result.as_object_mut(), body) {
            out.extend(fields);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_defaults() {
        let enc = Encryption::new();
        let out = enc.execute("abc", &Value::Null).await.unwrap();
        assert_eq!(out["action"], "hash");
        assert_eq!(out["algorithm"], "sha256");
        assert_eq!(out["encoding"], "hex");
        assert_eq!(
            out["hash"],
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_md5_hex() {
        let enc = Encryption::new();
        let out = enc
            .execute("", &json!({"algorithm": "md5", "encoding": "hex"}))
            .await
            .unwrap();
        assert_eq!(out["hash"], "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[tokio::test]
    async fn test_hmac() {
        let enc = Encryption::new();
        let out = enc
            .execute(
                "The quick brown fox jumps over the lazy dog",
                &json!({"action": "hmac", "key": "key"}),
            )
            .await
            .unwrap();
        assert_eq!(
            out["hmac"],
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );

        let err = enc.execute("x", &json!({"action": "hmac"})).await.unwrap_err();
        assert_eq!(err.message, "A key is required for hmac");
    }

    #[tokio::test]
    async fn test_encode_decode() {
        let enc = Encryption::new();
        let out = enc.execute("hello", &json!({"action": "encode"})).await.unwrap();
        assert_eq!(out["encoding"], "base64");
        assert_eq!(out["encoded"], "aGVsbG8=");

        let out = enc.execute("aGVsbG8=", &json!({"action": "decode"})).await.unwrap();
        assert_eq!(out["decoded"], "hello");

        let out = enc
            .execute("68656c6c6f", &json!({"action": "decode", "encoding": "hex"}))
            .await
            .unwrap();
        assert_eq!(out["decoded"], "hello");
    }

    #[tokio::test]
    async fn test_unknown_action_and_algorithm() {
        let enc = Encryption::new();
        let err = enc.execute("x", &json!({"action": "encrypt"})).await.unwrap_err();
        assert_eq!(err.message, "Unknown action: encrypt");
        assert_eq!(err.details.unwrap()["action"], "encrypt");

        let err = enc.execute("x", &json!({"algorithm": "sha1"})).await.unwrap_err();
        assert_eq!(err.message, "Unsupported algorithm: sha1");
        let details = err.details.unwrap();
        assert_eq!(details["action"], "hash");
        assert_eq!(details["supported"], json!(["sha256", "sha512", "md5"]));

        let err = enc
            .execute("x", &json!({"action": "hmac", "key": "k", "algorithm": "sha1"}))
            .await
            .unwrap_err();
        assert_eq!(err.details.unwrap()["action"], "hmac");
    }
}
