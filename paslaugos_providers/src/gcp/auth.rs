//! Service-account OAuth2 tokens for the DLP and Cloud Storage APIs.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use tracing::{debug, info};

const SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    token_uri: String,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

pub struct GcpAuth {
    key_path: PathBuf,
    client: reqwest::Client,
    token: RwLock<Option<CachedToken>>,
}

impl GcpAuth {
    pub fn from_service_account(key_path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let key_path = key_path.as_ref().to_path_buf();
        if !key_path.exists() {
            anyhow::bail!("Service account key not found: {}", key_path.display());
        }
        Ok(Self {
            key_path,
            client: reqwest::Client::new(),
            token: RwLock::new(None),
        })
    }

    /// Valid access token, refreshed when less than a minute remains.
    pub async fn token(&self) -> anyhow::Result<String> {
        {
            let token = self.token.read().await;
            if let Some(cached) = token
                .as_ref()
                .filter(|c| c.expires_at > Instant::now() + Duration::from_secs(60))
            {
                return Ok(cached.access_token.clone());
            }
        }

        let (access_token, expires_in) = self.refresh().await?;
        let mut token = self.token.write().await;
        *token = Some(CachedToken {
            access_token: access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(expires_in),
        });
        Ok(access_token)
    }

    async fn refresh(&self) -> anyhow::Result<(String, u64)> {
        let content = tokio::fs::read_to_string(&self.key_path)
            .await
            .map_err(|e| {
                anyhow::anyhow!(
                    "Failed to read service account key {}: {e}",
                    self.key_path.display()
                )
            })?;
        let key: ServiceAccountKey = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid service account key format: {e}"))?;

        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let jwt = signed_assertion(&key, now)?;

        info!("Requesting access token for {}", key.client_email);
        let response = self
            .client
            .post(&key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", jwt.as_str()),
            ])
            .send()
            .await?;
        let response = crate::check_status(response, "Token exchange").await?;

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            #[serde(default = "default_expires_in")]
            expires_in: u64,
        }

        let token: TokenResponse = response.json().await?;
        debug!("Access token valid for {}s", token.expires_in);
        Ok((token.access_token, token.expires_in))
    }
}

const fn default_expires_in() -> u64 {
    3600
}

fn jwt_signing_input(key: &ServiceAccountKey, now: u64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let claims = serde_json::json!({
        "iss": key.client_email,
        "scope": SCOPE,
        "aud": key.token_uri,
        "iat": now,
        "exp": now + 3600,
    });
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
    format!("{header}.{payload}")
}

fn signed_assertion(key: &ServiceAccountKey, now: u64) -> anyhow::Result<String> {
    let signing_input = jwt_signing_input(key, now);

    // key files store the PEM with escaped newlines
    let private_key = key.private_key.replace("\\n", "\n");
    let pem = pem::parse(&private_key)
        .map_err(|e| anyhow::anyhow!("Failed to parse private key PEM: {e}"))?;
    let key_pair = ring::signature::RsaKeyPair::from_pkcs8(pem.contents())
        .map_err(|e| anyhow::anyhow!("Failed to parse private key: {e}"))?;

    let mut signature = vec![0u8; key_pair.public().modulus_len()];
    key_pair
        .sign(
            &ring::signature::RSA_PKCS1_SHA256,
            &ring::rand::SystemRandom::new(),
            signing_input.as_bytes(),
            &mut signature,
        )
        .map_err(|e| anyhow::anyhow!("Failed to sign JWT: {e}"))?;

    Ok(format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(&signature)))
}
