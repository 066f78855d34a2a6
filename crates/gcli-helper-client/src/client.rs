use std::time::Duration;

use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::{Client, StatusCode};

use gcli_helper_types::{Credential, CredentialQuota, QuotaState};

use crate::error::UpstreamError;
use crate::types::*;

pub(crate) const ANTIGRAVITY_MODE: &str = "antigravity";

/// Client for the upstream credential proxy.
///
/// Constructed via [`UpstreamClient::connect`], which performs the login
/// handshake and stores the returned bearer token. All calls carry the
/// configured timeout; none retry.
pub struct UpstreamClient {
    client: Client,
    config: ClientConfig,
    token: String,
}

impl UpstreamClient {
    /// Log in to the upstream and return a ready client.
    pub async fn connect(config: ClientConfig) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))?;

        let resp = client
            .post(format!("{}/auth/login", config.base_url.trim_end_matches('/')))
            .json(&serde_json::json!({ "password": config.password }))
            .send()
            .await
            .map_err(UpstreamError::from_transport)?;

        let resp = check_status(resp).await?;
        let login: LoginResponse = resp
            .json()
            .await
            .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))?;

        // The upstream treats the password itself as the token when it
        // doesn't issue a dedicated one.
        let token = login.token.unwrap_or_else(|| config.password.clone());
        tracing::info!("Connected to upstream at {}", config.base_url);

        Ok(Self { client, config, token })
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn authed_get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{}", self.base_url(), path))
            .bearer_auth(&self.token)
            .query(&[("token", self.token.as_str())])
    }

    fn authed_post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{}", self.base_url(), path))
            .bearer_auth(&self.token)
            .query(&[("token", self.token.as_str())])
    }

    /// Connectivity probe against the upstream version endpoint.
    pub async fn probe(&self) -> Result<(), UpstreamError> {
        let resp = self
            .client
            .get(format!("{}/version/info", self.base_url()))
            .send()
            .await
            .map_err(UpstreamError::from_transport)?;
        check_status(resp).await?;
        Ok(())
    }

    /// List all credentials with status and recorded error codes.
    pub async fn list_credentials(&self) -> Result<Vec<Credential>, UpstreamError> {
        let items = self.list_items().await?;
        Ok(items
            .into_iter()
            .map(|item| Credential {
                filename: item.filename,
                user_email: item.user_email,
                disabled: item.disabled,
                error_codes: item.error_codes,
            })
            .collect())
    }

    async fn list_items(&self) -> Result<Vec<CredItem>, UpstreamError> {
        let resp = self
            .authed_get("/creds/status")
            .query(&[
                ("status_filter", "all"),
                ("error_code_filter", "all"),
                ("offset", "0"),
                ("limit", "1000"),
            ])
            .send()
            .await
            .map_err(UpstreamError::from_transport)?;

        let resp = check_status(resp).await?;
        let status: CredsStatusResponse = resp
            .json()
            .await
            .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))?;
        Ok(status.items)
    }

    /// Trigger the upstream verify/recover call for one credential.
    pub async fn verify(&self, filename: &str) -> Result<VerifyResult, UpstreamError> {
        let resp = self
            .authed_post(&format!("/creds/verify-project/{}", filename))
            .query(&[("mode", ANTIGRAVITY_MODE)])
            .send()
            .await
            .map_err(UpstreamError::from_transport)?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(UpstreamError::NotFound { id: filename.to_string() });
        }

        let resp = check_status(resp).await?;
        let body: VerifyResponse = resp
            .json()
            .await
            .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))?;

        Ok(VerifyResult {
            success: body.success,
            message: body.message.or(body.error),
        })
    }

    /// Attach to the upstream's live log stream (`/auth/logs/stream`).
    ///
    /// The overall client timeout would cut a long-lived stream short, so
    /// this request runs without one; stream errors surface as items.
    pub async fn stream_logs(&self) -> Result<LogLineStream, UpstreamError> {
        let resp = self
            .authed_get("/auth/logs/stream")
            .timeout(Duration::from_secs(86400))
            .send()
            .await
            .map_err(UpstreamError::from_transport)?;
        let resp = check_status(resp).await?;

        let stream = resp.bytes_stream().eventsource().map(|event| match event {
            Ok(event) => Ok(event.data),
            Err(e) => Err(UpstreamError::InvalidResponse(e.to_string())),
        });
        Ok(Box::pin(stream))
    }

    /// Fetch quota snapshots for all credentials.
    ///
    /// One batched listing call, then one quota call per antigravity-mode
    /// credential. Non-antigravity credentials are marked `Unsupported`
    /// (the upstream has no per-model quota for them) and per-credential
    /// fetch failures become `Error` entries instead of failing the batch.
    pub async fn fetch_quotas(&self) -> Result<Vec<CredentialQuota>, UpstreamError> {
        let items = self.list_items().await?;
        let mut snapshots = Vec::with_capacity(items.len());

        for item in items {
            let quota = if item.mode == ANTIGRAVITY_MODE {
                match self.fetch_quota_for(&item.filename).await {
                    Ok(models) => QuotaState::Available(models),
                    Err(err) => {
                        tracing::warn!("Quota fetch failed for {}: {}", item.filename, err);
                        QuotaState::Error(err.to_string())
                    }
                }
            } else {
                QuotaState::Unsupported
            };

            snapshots.push(CredentialQuota {
                filename: item.filename,
                user_email: item.user_email,
                disabled: item.disabled,
                quota,
            });
        }

        Ok(snapshots)
    }

    async fn fetch_quota_for(
        &self,
        filename: &str,
    ) -> Result<Vec<gcli_helper_types::ModelQuota>, UpstreamError> {
        let resp = self
            .authed_get(&format!("/creds/quota/{}", filename))
            .query(&[("mode", ANTIGRAVITY_MODE)])
            .send()
            .await
            .map_err(UpstreamError::from_transport)?;

        let resp = check_status(resp).await?;
        let body: QuotaResponse = resp
            .json()
            .await
            .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))?;
        Ok(body.models)
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, UpstreamError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    Err(UpstreamError::Rejected { status: status.as_u16(), message })
}
