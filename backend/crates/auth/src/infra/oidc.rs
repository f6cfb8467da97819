//! OIDC Identity Provider
//!
//! Authorization-code flow with PKCE (S256) against an OpenID Connect
//! provider. The identity token recorded for an account is the
//! provider's `id_token`, falling back to the access token for
//! providers that do not issue one.

use serde::Deserialize;
use url::Url;

use platform::pkce;
use platform::secret::SecretString;

use crate::domain::provider::{AuthorizationRequest, IdentityProvider, VerifiedIdentity};
use crate::domain::value_object::{email::Email, identity_token::RawIdentityToken};
use crate::error::{AuthError, AuthResult};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Endpoints and client credentials for one provider
#[derive(Debug, Clone)]
pub struct OidcConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    pub auth_url: Url,
    pub token_url: Url,
    pub userinfo_url: Url,
    pub redirect_uri: Url,
    pub scopes: Vec<String>,
}

impl OidcConfig {
    /// Google with the `openid email profile` scopes
    pub fn google(
        client_id: impl Into<String>,
        client_secret: SecretString,
        redirect_uri: Url,
    ) -> AuthResult<Self> {
        Ok(Self {
            client_id: client_id.into(),
            client_secret,
            auth_url: parse_url(GOOGLE_AUTH_URL)?,
            token_url: parse_url(GOOGLE_TOKEN_URL)?,
            userinfo_url: parse_url(GOOGLE_USERINFO_URL)?,
            redirect_uri,
            scopes: vec!["openid".into(), "email".into(), "profile".into()],
        })
    }
}

fn parse_url(raw: &str) -> AuthResult<Url> {
    Url::parse(raw).map_err(|e| AuthError::Internal(format!("Invalid provider URL {raw}: {e}")))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<bool>,
    #[serde(default)]
    name: Option<String>,
}

/// OIDC provider client
pub struct OidcProvider {
    config: OidcConfig,
    http: reqwest::Client,
}

impl OidcProvider {
    pub fn new(config: OidcConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    async fn fetch_tokens(&self, code: &str, code_verifier: &str) -> AuthResult<TokenResponse> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose()),
            ("code_verifier", code_verifier),
        ];

        let response = self
            .http
            .post(self.config.token_url.clone())
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::ProviderAuth(format!("token exchange: {e}")))?;

        let response = Self::ensure_success(response, "token exchange").await?;
        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| AuthError::ProviderAuth(format!("token exchange: {e}")))
    }

    async fn fetch_user_info(&self, access_token: &str) -> AuthResult<UserInfo> {
        let response = self
            .http
            .get(self.config.userinfo_url.clone())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::ProviderAuth(format!("userinfo request: {e}")))?;

        let response = Self::ensure_success(response, "userinfo request").await?;
        response
            .json::<UserInfo>()
            .await
            .map_err(|e| AuthError::ProviderAuth(format!("userinfo request: {e}")))
    }

    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> AuthResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(AuthError::ProviderAuth(format!(
            "{operation} returned {status}: {body}"
        )))
    }
}

/// Turn the provider's answers into a verified identity
fn verify_identity(tokens: TokenResponse, info: UserInfo) -> AuthResult<VerifiedIdentity> {
    if info.email_verified == Some(false) {
        return Err(AuthError::ProviderAuth("email not verified".to_string()));
    }

    let email = info
        .email
        .ok_or_else(|| AuthError::ProviderAuth("no email in userinfo".to_string()))?;
    let email = Email::from_provider(email)
        .map_err(|e| AuthError::ProviderAuth(format!("unusable email: {}", e.message())))?;

    let raw_token = tokens.id_token.unwrap_or(tokens.access_token);

    Ok(VerifiedIdentity {
        subject: info.sub,
        email,
        raw_token: RawIdentityToken::new(raw_token),
        display_name: info.name,
    })
}

impl IdentityProvider for OidcProvider {
    fn authorization_request(&self) -> AuthorizationRequest {
        let state = pkce::generate_state();
        let code_verifier = pkce::generate_code_verifier();
        let code_challenge = pkce::generate_code_challenge(&code_verifier);
        let scope = self.config.scopes.join(" ");

        let mut url = self.config.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", self.config.redirect_uri.as_str())
            .append_pair("state", &state)
            .append_pair("code_challenge", &code_challenge)
            .append_pair("code_challenge_method", "S256")
            .append_pair("scope", &scope);

        AuthorizationRequest {
            url: url.into(),
            state,
            code_verifier,
        }
    }

    async fn exchange_code(&self, code: &str, code_verifier: &str) -> AuthResult<VerifiedIdentity> {
        let tokens = self.fetch_tokens(code, code_verifier).await?;
        let info = self.fetch_user_info(&tokens.access_token).await?;
        verify_identity(tokens, info)
    }

    async fn end_session(&self) -> AuthResult<()> {
        // Nothing provider-side outlives the handshake cookie, which the
        // logout handler clears.
        tracing::debug!(client_id = %self.config.client_id, "No provider session to end");
        Ok(())
    }
}
