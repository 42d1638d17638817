//! Per-area navigation guard.
//!
//! Every protected area is entered through a `NavigationGuard` built for
//! it. The guard walks `Initializing -> Checking -> {Allowed, Redirecting}`:
//! it asks the session manager for a usable access token (renewal happens
//! behind that call) and then asks the policy whether the resolved role
//! may enter. Terminal states are settled; re-evaluating a settled guard
//! returns the same verdict without side effects.

use tracing::debug;

use crate::auth::SessionManager;
use crate::policy::{self, Access, Area, RedirectTarget};

/// Guard evaluation states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// Constructed, not yet evaluated.
    Initializing,
    /// Evaluation in progress: token check and possible renewal.
    Checking,
    /// Terminal: render the protected content.
    Allowed,
    /// Terminal: leave for the given target.
    Redirecting(RedirectTarget),
}

impl GuardState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GuardState::Allowed | GuardState::Redirecting(_))
    }
}

pub struct NavigationGuard {
    area: Area,
    state: GuardState,
}

impl NavigationGuard {
    pub fn new(area: Area) -> Self {
        Self {
            area,
            state: GuardState::Initializing,
        }
    }

    /// Run the entry check for this guard's area and settle the state.
    pub async fn evaluate(&mut self, session: &SessionManager) -> GuardState {
        if self.state.is_terminal() {
            return self.state;
        }

        self.state = GuardState::Checking;

        if !session.is_authenticated() {
            debug!(area = self.area.title(), "Not authenticated, redirecting to login");
            self.state = GuardState::Redirecting(RedirectTarget::Login);
            return self.state;
        }

        // Transparent renewal happens inside this call. A session that
        // cannot produce a usable token is over, whatever the reason.
        if session.usable_access_token().await.is_none() {
            debug!(area = self.area.title(), "No usable access token, redirecting to login");
            self.state = GuardState::Redirecting(RedirectTarget::Login);
            return self.state;
        }

        self.state = match policy::authorize(session.role(), self.area) {
            Access::Allow => GuardState::Allowed,
            Access::Redirect(target) => GuardState::Redirecting(target),
        };
        debug!(area = self.area.title(), state = ?self.state, "Guard settled");
        self.state
    }
}
