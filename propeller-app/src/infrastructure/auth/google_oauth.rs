use crate::domain::User;
use oauth2::{
    basic::BasicClient, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

#[derive(Debug, Deserialize)]
pub struct GoogleUserInfo {
    pub sub: String, // Google's unique user ID
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

impl GoogleUserInfo {
    pub fn into_user(self) -> User {
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.email.clone());
        User::google(self.sub, name, self.email, self.picture)
    }
}

/// Everything the callback needs to finish the flow; the secrets belong in the session.
#[derive(Debug)]
pub struct AuthorizationRequest {
    pub url: String,
    pub csrf_state: String,
    pub pkce_verifier: String,
}

type ConfiguredClient = oauth2::Client<
    oauth2::basic::BasicErrorResponse,
    oauth2::basic::BasicTokenResponse,
    oauth2::basic::BasicTokenIntrospectionResponse,
    oauth2::StandardRevocableToken,
    oauth2::basic::BasicRevocationErrorResponse,
    oauth2::EndpointSet,
    oauth2::EndpointNotSet,
    oauth2::EndpointNotSet,
    oauth2::EndpointNotSet,
    oauth2::EndpointSet,
>;

#[derive(Clone)]
pub struct GoogleOAuth {
    client: ConfiguredClient,
    redirect_uri: RedirectUrl,
    http_client: reqwest::Client,
}

impl GoogleOAuth {
    pub fn new(client_id: &str, client_secret: &str, redirect_uri: &str) -> Result<Self, String> {
        let auth_url = AuthUrl::new(GOOGLE_AUTH_URL.to_string()).map_err(|e| e.to_string())?;
        let token_url = TokenUrl::new(GOOGLE_TOKEN_URL.to_string()).map_err(|e| e.to_string())?;
        let redirect = RedirectUrl::new(redirect_uri.to_string())
            .map_err(|e| format!("Invalid callback URL {:?}: {}", redirect_uri, e))?;

        let client = BasicClient::new(ClientId::new(client_id.to_string()))
            .set_client_secret(ClientSecret::new(client_secret.to_string()))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url);

        // token endpoint responses must not be followed as redirects
        let http_client = oauth2::reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            redirect_uri: redirect,
            http_client,
        })
    }

    /// Builds the consent URL with a fresh CSRF state and PKCE challenge.
    pub fn get_auth_url(&self) -> AuthorizationRequest {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let (auth_url, csrf_token) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .set_redirect_uri(std::borrow::Cow::Borrowed(&self.redirect_uri))
            .add_scope(Scope::new("openid".to_string()))
            .add_scope(Scope::new("email".to_string()))
            .add_scope(Scope::new("profile".to_string()))
            .set_pkce_challenge(pkce_challenge)
            .url();

        AuthorizationRequest {
            url: auth_url.to_string(),
            csrf_state: csrf_token.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
        }
    }

    /// Exchanges the authorization code for tokens and fetches the profile.
    pub async fn exchange_code(
        &self,
        code: &str,
        pkce_verifier: &str,
    ) -> Result<GoogleUserInfo, String> {
        let token_result = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_redirect_uri(std::borrow::Cow::Borrowed(&self.redirect_uri))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier.to_string()))
            .request_async(&self.http_client)
            .await
            .map_err(|e| format!("Token exchange failed: {:?}", e))?;

        let access_token = token_result.access_token().secret();

        let user_info = self
            .http_client
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| format!("Failed to fetch user info: {}", e))?
            .error_for_status()
            .map_err(|e| format!("User info request rejected: {}", e))?
            .json::<GoogleUserInfo>()
            .await
            .map_err(|e| format!("Failed to parse user info: {}", e))?;

        Ok(user_info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_url_carries_state_and_pkce() {
        let oauth = GoogleOAuth::new(
            "client-123",
            "secret",
            "http://localhost:3000/api/auth/google/callback",
        )
        .unwrap();

        let request = oauth.get_auth_url();
        assert!(request.url.starts_with(GOOGLE_AUTH_URL));
        assert!(request.url.contains("client_id=client-123"));
        assert!(request.url.contains("code_challenge_method=S256"));
        assert!(request.url.contains(&format!("state={}", request.csrf_state)));
        assert!(!request.pkce_verifier.is_empty());

        let other = oauth.get_auth_url();
        assert_ne!(other.csrf_state, request.csrf_state);
    }

    #[test]
    fn test_rejects_invalid_callback() {
        assert!(GoogleOAuth::new("id", "secret", "not a url").is_err());
    }

    #[test]
    fn test_user_info_without_name_uses_email() {
        let info: GoogleUserInfo = serde_json::from_value(serde_json::json!({
            "sub": "1234",
            "email": "ada@example.com",
            "email_verified": true
        }))
        .unwrap();
        let user = info.into_user();
        assert_eq!(user.id, "1234");
        assert_eq!(user.name, "ada@example.com");
        assert_eq!(user.provider, "google");
        assert!(user.picture.is_none());
    }
}
