//! Session lifecycle management.
//!
//! `SessionManager` owns the credential record. It evaluates expiry and
//! hands out a usable access token, renewing transparently when the stored
//! one has expired; login and logout writes go through it as well. Renewal
//! is single-flight: concurrent callers that find the token expired
//! serialize on one slot and the losers adopt whatever record the winner
//! installed.
//!
//! Renewal failures of any kind clear the whole record. A cleared record
//! means "session is over"; callers see `None` and route to login instead
//! of retrying.

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api::{PortalClient, TokenGrant};
use crate::auth::store::{CredentialRecord, CredentialStore};
use crate::models::{Role, UserProfile};

pub struct SessionManager {
    store: CredentialStore,
    client: PortalClient,
    /// Single-flight slot for renewal. Held only across the renewal
    /// round-trip, never while handing out a fresh token.
    renewal: Mutex<()>,
}

impl SessionManager {
    pub fn new(store: CredentialStore, client: PortalClient) -> Self {
        Self {
            store,
            client,
            renewal: Mutex::new(()),
        }
    }

    /// True when no expiry is stored or the current instant is at or past
    /// it. Pure snapshot check, no network.
    pub fn is_expired(&self) -> bool {
        self.store.read().is_expired()
    }

    /// True when an access token is present, irrespective of expiry.
    /// An expired-but-present token still counts: renewal may revive it.
    pub fn is_authenticated(&self) -> bool {
        self.store.read().access_token.is_some()
    }

    /// Role as resolved at login or renewal time. Never triggers renewal.
    pub fn role(&self) -> Option<Role> {
        self.store.read().role
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.store.read().profile
    }

    /// Current credential record, for status display and tests.
    pub fn snapshot(&self) -> CredentialRecord {
        self.store.read()
    }

    /// Consume a login grant and perform the initial full write of the
    /// credential record.
    pub fn establish(&self, grant: TokenGrant) {
        let role = Self::role_from_grant(&grant);
        let profile = grant
            .user
            .as_ref()
            .map(|claim| claim.profile.clone())
            .filter(|profile| !profile.is_empty());

        let record = CredentialRecord {
            access_token: Some(grant.access_token),
            refresh_token: Some(grant.refresh_token),
            expires_at: Some(Self::expiry_from(grant.expires_in)),
            role,
            profile,
        };
        self.store.replace(record);
        info!(role = ?role, "Session established");
    }

    /// Produce an access token that is currently safe to attach to a
    /// protected request.
    ///
    /// Returns the stored token when it is still fresh. When it has
    /// expired, renews it through the refresh token: on success the whole
    /// record is replaced atomically and the new token returned; on any
    /// failure the record is cleared and `None` returned. `None` means
    /// "session is over, do not call" and is not retried here.
    pub async fn usable_access_token(&self) -> Option<String> {
        let record = self.store.read();
        if !record.is_expired() {
            return record.access_token;
        }

        let _renewal = self.renewal.lock().await;

        // Another caller may have finished renewing while we waited for
        // the slot; adopt its record instead of renewing twice.
        let record = self.store.read();
        if !record.is_expired() {
            return record.access_token;
        }

        let Some(refresh_token) = record.refresh_token.clone() else {
            debug!("Access token expired and no refresh token stored");
            return None;
        };

        match self.client.refresh(&refresh_token).await {
            Ok(grant) => {
                let next = Self::renewed_record(&grant, &record);
                let token = next.access_token.clone();
                self.store.replace(next);
                info!("Access token renewed");
                token
            }
            Err(e) => {
                warn!(error = %e, "Token renewal failed, clearing session");
                self.store.clear();
                None
            }
        }
    }

    /// Refresh the advisory profile data from the backend.
    ///
    /// Updates the stored profile on success and fills the role only when
    /// none was resolved at login/renewal time. Failures are logged and
    /// swallowed; they never end the session.
    pub async fn refresh_profile(&self) -> Option<UserProfile> {
        let token = self.usable_access_token().await?;

        match self.client.me(&token).await {
            Ok(claim) => {
                if self.store.read().role.is_none() {
                    if let Some(role) = claim.role.as_deref().and_then(Role::parse) {
                        self.store.set_role(role);
                    }
                }
                self.store.set_profile(claim.profile.clone());
                Some(claim.profile)
            }
            Err(e) => {
                warn!(error = %e, "Profile refresh failed");
                None
            }
        }
    }

    /// Clear the credential record unconditionally. No network effect.
    pub fn logout(&self) {
        self.store.clear();
        info!("Session cleared");
    }

    /// Build the record installed by a successful renewal. Tokens and
    /// expiry come from the grant; the role carries over when the grant
    /// omits one; profile data is left as it was.
    fn renewed_record(grant: &TokenGrant, previous: &CredentialRecord) -> CredentialRecord {
        CredentialRecord {
            access_token: Some(grant.access_token.clone()),
            refresh_token: Some(grant.refresh_token.clone()),
            expires_at: Some(Self::expiry_from(grant.expires_in)),
            role: Self::role_from_grant(grant).or(previous.role),
            profile: previous.profile.clone(),
        }
    }

    /// Resolve the role carried by a grant's account claim. Unknown role
    /// strings are logged and left unresolved so they never grant access.
    fn role_from_grant(grant: &TokenGrant) -> Option<Role> {
        let raw = grant.user.as_ref().and_then(|claim| claim.role.as_deref())?;
        let parsed = Role::parse(raw);
        if parsed.is_none() {
            warn!(role = raw, "Ignoring unknown role from token grant");
        }
        parsed
    }

    fn expiry_from(expires_in_secs: i64) -> i64 {
        Utc::now().timestamp_millis() + expires_in_secs * 1_000
    }
}
