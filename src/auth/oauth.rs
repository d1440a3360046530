use super::callback::{wait_for_callback, CALLBACK_PATH};
use super::pkce::PkcePair;
use super::IdentityProvider;
use crate::error::{Result, UserdeskError};
use crate::models::{Credential, Identity};
use serde::Deserialize;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, info};
use url::Url;

/// Endpoints and client registration for an OAuth2 / OIDC provider.
#[derive(Debug, Clone)]
pub struct OAuthSettings {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub auth_url: Url,
    pub token_url: Url,
    pub userinfo_url: Url,
    pub revoke_url: Option<Url>,
    /// Loopback port for the redirect; `0` picks a free one.
    pub redirect_port: u16,
    pub scopes: Vec<String>,
    pub sign_in_timeout: Duration,
}

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// OIDC userinfo claims we care about.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

struct LiveSession {
    identity: Identity,
    access_token: String,
    refresh_token: Option<String>,
}

type Prompt = Box<dyn Fn(&str) + Send + Sync>;

/// Authorization-code + PKCE sign-in through a loopback redirect.
pub struct OAuthProvider {
    settings: OAuthSettings,
    http: reqwest::Client,
    live: Mutex<Option<LiveSession>>,
    changes: watch::Sender<Option<Credential>>,
    prompt: Prompt,
}

impl OAuthProvider {
    pub fn new(settings: OAuthSettings) -> Self {
        let (changes, _) = watch::channel(None);
        Self {
            settings,
            http: reqwest::Client::new(),
            live: Mutex::new(None),
            changes,
            prompt: Box::new(|url| {
                eprintln!("Open this URL in your browser to sign in:\n\n  {}\n", url);
            }),
        }
    }

    /// Replace how the authorization URL is presented to the operator.
    pub fn with_prompt(mut self, prompt: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.prompt = Box::new(prompt);
        self
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    pub fn settings(&self) -> &OAuthSettings {
        &self.settings
    }

    /// Build the authorization URL for one attempt.
    pub fn authorization_url(&self, redirect_uri: &str, pkce: &PkcePair) -> Url {
        let mut url = self.settings.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.settings.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("scope", &self.settings.scopes.join(" "))
            .append_pair("state", &pkce.state)
            .append_pair("code_challenge", &pkce.challenge)
            .append_pair("code_challenge_method", "S256");
        url
    }

    fn live(&self) -> MutexGuard<'_, Option<LiveSession>> {
        self.live.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, credential: Option<Credential>) {
        // send_replace succeeds even with no subscribers.
        self.changes.send_replace(credential);
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        verifier: &str,
    ) -> Result<TokenResponse> {
        let mut params = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", self.settings.client_id.as_str()),
            ("code_verifier", verifier),
        ];
        if let Some(secret) = &self.settings.client_secret {
            params.push(("client_secret", secret.as_str()));
        }

        let response = self
            .http
            .post(self.settings.token_url.clone())
            .form(&params)
            .send()
            .await?;
        let response = ensure_success(response, "token exchange").await?;
        Ok(response.json::<TokenResponse>().await?)
    }

    async fn user_info(&self, access_token: &str) -> Result<UserInfo> {
        let response = self
            .http
            .get(self.settings.userinfo_url.clone())
            .bearer_auth(access_token)
            .send()
            .await?;
        let response = ensure_success(response, "userinfo request").await?;
        Ok(response.json::<UserInfo>().await?)
    }

    async fn revoke(&self, token: &str, hint: &str) -> Result<()> {
        let Some(revoke_url) = &self.settings.revoke_url else {
            return Ok(());
        };

        let mut params = vec![
            ("token", token),
            ("token_type_hint", hint),
            ("client_id", self.settings.client_id.as_str()),
        ];
        if let Some(secret) = &self.settings.client_secret {
            params.push(("client_secret", secret.as_str()));
        }

        let response = self
            .http
            .post(revoke_url.clone())
            .form(&params)
            .send()
            .await?;
        ensure_success(response, "token revocation").await?;
        Ok(())
    }
}

impl IdentityProvider for OAuthProvider {
    async fn sign_in(&self) -> Result<Credential> {
        if self.settings.client_id.is_empty() {
            return Err(UserdeskError::Auth(
                "No OAuth client id configured (set USERDESK_CLIENT_ID or auth.client_id)"
                    .to_string(),
            ));
        }

        let listener = TcpListener::bind(("127.0.0.1", self.settings.redirect_port))
            .await
            .map_err(|e| {
                UserdeskError::Auth(format!(
                    "Cannot listen for the sign-in redirect on port {}: {}",
                    self.settings.redirect_port, e
                ))
            })?;
        let port = listener.local_addr()?.port();
        let redirect_uri = format!("http://127.0.0.1:{}{}", port, CALLBACK_PATH);

        let pkce = PkcePair::generate();
        let url = self.authorization_url(&redirect_uri, &pkce);
        (self.prompt)(url.as_str());

        let params = tokio::time::timeout(
            self.settings.sign_in_timeout,
            wait_for_callback(listener),
        )
        .await
        .map_err(|_| UserdeskError::Auth("Sign-in timed out".to_string()))??;

        // State first, error redirects included.
        if params.state.as_deref() != Some(pkce.state.as_str()) {
            return Err(UserdeskError::Auth(
                "Sign-in response state did not match the request".to_string(),
            ));
        }
        if let Some(error) = params.error {
            return Err(UserdeskError::Auth(if error == "access_denied" {
                "Sign-in was cancelled".to_string()
            } else {
                format!(
                    "Provider refused sign-in: {}",
                    params.error_description.unwrap_or(error)
                )
            }));
        }
        let code = params
            .code
            .ok_or_else(|| UserdeskError::Auth("Sign-in response carried no code".to_string()))?;

        let tokens = self.exchange_code(&code, &redirect_uri, &pkce.verifier).await?;
        let info = self.user_info(&tokens.access_token).await?;

        let mut identity = Identity::new(info.sub);
        if let Some(email) = info.email {
            identity = identity.with_email(email);
        }
        if let Some(name) = info.name {
            identity = identity.with_display_name(name);
        }
        debug!(expires_in = ?tokens.expires_in, "token issued");

        let credential = Credential::new(identity.clone(), tokens.access_token.clone());
        *self.live() = Some(LiveSession {
            identity,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        });
        self.publish(Some(credential.clone()));

        Ok(credential)
    }

    async fn sign_out(&self) -> Result<()> {
        let session = self.live().take();
        self.publish(None);

        match session {
            Some(LiveSession {
                refresh_token: Some(refresh),
                ..
            }) => self.revoke(&refresh, "refresh_token").await,
            Some(session) => self.revoke(&session.access_token, "access_token").await,
            None => Ok(()),
        }
    }

    async fn refresh_token(&self) -> Result<Option<String>> {
        let refresh = match self.live().as_ref() {
            Some(session) => session.refresh_token.clone(),
            None => None,
        };
        let Some(refresh) = refresh else {
            return Ok(None);
        };

        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh.as_str()),
            ("client_id", self.settings.client_id.as_str()),
        ];
        if let Some(secret) = &self.settings.client_secret {
            params.push(("client_secret", secret.as_str()));
        }

        let response = self
            .http
            .post(self.settings.token_url.clone())
            .form(&params)
            .send()
            .await?;
        let response = ensure_success(response, "token refresh").await?;
        let tokens = response.json::<TokenResponse>().await?;

        let credential = {
            let mut live = self.live();
            let Some(session) = live.as_mut() else {
                // Signed out while the refresh was in flight.
                return Ok(None);
            };
            session.access_token = tokens.access_token.clone();
            if let Some(rotated) = tokens.refresh_token {
                session.refresh_token = Some(rotated);
            }
            Credential::new(session.identity.clone(), tokens.access_token.clone())
        };
        info!("access token refreshed");
        self.publish(Some(credential));

        Ok(Some(tokens.access_token))
    }

    fn subscribe(&self) -> watch::Receiver<Option<Credential>> {
        self.changes.subscribe()
    }
}

async fn ensure_success(
    response: reqwest::Response,
    operation: &'static str,
) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(UserdeskError::Auth(format!(
        "{} failed (status {}): {}",
        operation, status, body
    )))
}
