//! Entry artifact (QR payload) generation.
//!
//! Attaching the artifact reference is a best-effort post-commit step; a
//! booking without one is still valid and can be re-issued later.

use sha2::{Digest, Sha256};

#[derive(Clone)]
pub struct ArtifactClient {
    client: reqwest::Client,
    base_url: String,
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

impl ArtifactClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Obtain an opaque artifact reference for a committed booking.
    pub async fn generate(&self, booking_id: i64, user_id: i64) -> Result<String, BoxError> {
        if self.base_url.is_empty() {
            return Ok(Self::local_ref(booking_id, user_id));
        }

        let resp: serde_json::Value = self
            .client
            .post(format!("{}/v1/artifacts", self.base_url))
            .json(&serde_json::json!({
                "booking_id": booking_id.to_string(),
                "user_id": user_id.to_string(),
            }))
            .send()
            .await?
            .json()
            .await?;

        resp["artifact_ref"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| format!("artifact service returned no reference: {resp}").into())
    }

    /// Locally derived reference when no artifact service is configured.
    fn local_ref(booking_id: i64, user_id: i64) -> String {
        let nonce: u64 = rand::random();
        let mut hasher = Sha256::new();
        hasher.update(booking_id.to_be_bytes());
        hasher.update(user_id.to_be_bytes());
        hasher.update(nonce.to_be_bytes());
        format!("qr-{}", hex::encode(&hasher.finalize()[..16]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_refs_are_unique_and_prefixed() {
        let a = ArtifactClient::local_ref(1, 2);
        let b = ArtifactClient::local_ref(1, 2);
        assert!(a.starts_with("qr-"));
        assert_eq!(a.len(), 3 + 32);
        assert_ne!(a, b);
    }
}
