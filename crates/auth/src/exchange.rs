//! Authorization-code exchange against the Canvas token endpoint.

use canvasgate_config::CanvasConfig;
use canvasgate_types::{AccessToken, GateError, Result};
use secrecy::{ExposeSecret as _, SecretString};

use crate::canvas;

/// Exchanges authorization codes for access tokens.
///
/// Each call to [`TokenExchanger::exchange`] issues exactly one request; codes
/// are single-use, so nothing here retries.
pub struct TokenExchanger {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: SecretString,
    redirect_uri: String,
}

impl TokenExchanger {
    /// Build an exchanger from the Canvas section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Config`] if the client id or secret is missing.
    pub fn from_config(canvas: &CanvasConfig, http: reqwest::Client) -> Result<Self> {
        let client_id = canvas
            .client_id
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| GateError::Config("canvas.client_id is required".into()))?;
        let client_secret = canvas
            .client_secret
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| GateError::Config("canvas.client_secret is required".into()))?;
        Ok(Self {
            http,
            token_url: canvas.token_url(),
            client_id,
            client_secret: SecretString::from(client_secret),
            redirect_uri: canvas.redirect_uri.clone(),
        })
    }

    /// Trade `code` for an access token.
    ///
    /// # Errors
    ///
    /// - [`GateError::MissingCode`] for an empty code, before any network I/O.
    /// - [`GateError::UpstreamUnavailable`] if the token endpoint cannot be reached.
    /// - [`GateError::AuthExchange`] if it answers without a usable token.
    pub async fn exchange(&self, code: &str) -> Result<AccessToken> {
        if code.is_empty() {
            return Err(GateError::MissingCode);
        }

        let params = canvas::token_form_params(
            &self.client_id,
            self.client_secret.expose_secret(),
            &self.redirect_uri,
            code,
        );
        let resp = self
            .http
            .post(&self.token_url)
            .header("Accept", "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                GateError::UpstreamUnavailable(format!("token endpoint unreachable: {e}"))
            })?;

        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(|e| {
            GateError::UpstreamUnavailable(format!("token response interrupted: {e}"))
        })?;

        let token = canvas::parse_token_response(status, &body)?;
        tracing::info!(status, expires_at = ?token.expires_at(), "authorization code exchanged");
        Ok(token)
    }

    /// Revoke `token` at the upstream (`DELETE` on the token endpoint).
    ///
    /// # Errors
    ///
    /// Returns [`GateError::UpstreamUnavailable`] on transport failure and
    /// [`GateError::AuthExchange`] if the upstream refuses the revocation.
    pub async fn revoke(&self, token: &AccessToken) -> Result<()> {
        let resp = self
            .http
            .delete(&self.token_url)
            .header("Authorization", token.bearer_header())
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(GateError::AuthExchange(format!(
                "token revocation returned status {}",
                resp.status().as_u16()
            )))
        }
    }
}
