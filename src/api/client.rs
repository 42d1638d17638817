//! HTTP client for the portal's identity provider.
//!
//! This module provides the `PortalClient` for the three authentication
//! endpoints the session core consumes: token issuance (`/login`), token
//! renewal (`/refresh`), and profile resolution (`/me`).

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::UserProfile;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// Token renewal runs inside navigation, so a hung identity provider must
/// fail fast instead of wedging a view transition. 10s is still generous
/// for a single token mint.
const REQUEST_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Response shape shared by the issuance and renewal endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    /// Account claim; the renewal endpoint may omit it.
    #[serde(default)]
    pub user: Option<UserClaim>,
}

/// Account data as the backend reports it. The role stays a raw string
/// here; interpretation happens where the session is updated.
#[derive(Debug, Clone, Deserialize)]
pub struct UserClaim {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(flatten)]
    pub profile: UserProfile,
}

/// Client for the portal API.
/// Clone is cheap; the inner reqwest client shares its connection pool.
#[derive(Clone)]
pub struct PortalClient {
    client: Client,
    base_url: String,
}

impl PortalClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Exchange credentials for a token grant.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenGrant> {
        let url = format!("{}/login", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(ApiError::from)
            .context("Failed to send login request")?;

        let response = Self::check_response(response).await?;

        let grant: TokenGrant = response
            .json()
            .await
            .context("Failed to parse login response")?;
        debug!("Login grant received");
        Ok(grant)
    }

    /// Exchange a refresh token for a fresh token grant.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        let url = format!("{}/refresh", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .map_err(ApiError::from)
            .context("Failed to send refresh request")?;

        let response = Self::check_response(response).await?;

        let grant: TokenGrant = response
            .json()
            .await
            .context("Failed to parse refresh response")?;
        debug!("Refresh grant received");
        Ok(grant)
    }

    /// Fetch the account claim for the holder of the given access token.
    pub async fn me(&self, access_token: &str) -> Result<UserClaim> {
        let url = format!("{}/me", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(ApiError::from)
            .context("Failed to send profile request")?;

        let response = Self::check_response(response).await?;

        response
            .json()
            .await
            .context("Failed to parse profile response")
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_base_url_trailing_slash_is_normalized() {
        let client = PortalClient::new("http://portal.example/api/").expect("client");
        assert_eq!(client.base_url, "http://portal.example/api");
    }

    #[tokio::test]
    async fn test_login_parses_grant_and_claim() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_json(json!({
                "email": "rizky@campus.example",
                "password": "hunter2"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "acc-1",
                "refresh_token": "ref-1",
                "expires_in": 3600,
                "user": {
                    "role": "user",
                    "name": "Rizky Pratama",
                    "email": "rizky@campus.example",
                    "nim": "2110512345",
                    "jurusan": "Informatika",
                    "no_telp": "081234567890"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = PortalClient::new(server.uri()).expect("client");
        let grant = client
            .login("rizky@campus.example", "hunter2")
            .await
            .expect("login should succeed");

        assert_eq!(grant.access_token, "acc-1");
        assert_eq!(grant.refresh_token, "ref-1");
        assert_eq!(grant.expires_in, 3600);

        let claim = grant.user.expect("claim present");
        assert_eq!(claim.role.as_deref(), Some("user"));
        assert_eq!(claim.profile.student_id.as_deref(), Some("2110512345"));
        assert_eq!(claim.profile.department.as_deref(), Some("Informatika"));
    }

    #[tokio::test]
    async fn test_login_rejection_carries_backend_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"message": "Email atau password salah"})),
            )
            .mount(&server)
            .await;

        let client = PortalClient::new(server.uri()).expect("client");
        let err = client
            .login("rizky@campus.example", "wrong")
            .await
            .expect_err("login should fail");

        match err.downcast_ref::<ApiError>() {
            Some(ApiError::Unauthorized(detail)) => {
                assert_eq!(detail, "Email atau password salah");
            }
            other => panic!("expected Unauthorized, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_refresh_without_user_claim_parses() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/refresh"))
            .and(body_json(json!({"refresh_token": "ref-1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "acc-2",
                "refresh_token": "ref-2",
                "expires_in": 900
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = PortalClient::new(server.uri()).expect("client");
        let grant = client.refresh("ref-1").await.expect("refresh should succeed");

        assert_eq!(grant.access_token, "acc-2");
        assert!(grant.user.is_none());
    }

    #[tokio::test]
    async fn test_refresh_with_missing_fields_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;

        let client = PortalClient::new(server.uri()).expect("client");
        assert!(client.refresh("ref-1").await.is_err());
    }

    #[tokio::test]
    async fn test_transport_failure_surfaces_as_network_error() {
        // Nothing listens on the discard port.
        let client = PortalClient::new("http://127.0.0.1:9").expect("client");
        let err = client
            .login("rizky@campus.example", "hunter2")
            .await
            .expect_err("login should fail");

        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::NetworkError(_))
        ));
    }

    #[tokio::test]
    async fn test_me_sends_bearer_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/me"))
            .and(header("authorization", "Bearer acc-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "role": "volunteer",
                "name": "Sari Dewi",
                "email": "sari@campus.example"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = PortalClient::new(server.uri()).expect("client");
        let claim = client.me("acc-1").await.expect("profile fetch");

        assert_eq!(claim.role.as_deref(), Some("volunteer"));
        assert_eq!(claim.profile.name.as_deref(), Some("Sari Dewi"));
    }
}
