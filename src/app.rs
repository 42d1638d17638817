//! Application shell for the BlueLight terminal client.
//!
//! This module contains the `App` struct wiring the configuration, the
//! portal client, and the session manager together, plus the interactive
//! command loop that signs the user in and routes every area entry through
//! its navigation guard.

use std::io::{self, Write};

use anyhow::Result;
use tracing::{error, info, warn};

use crate::api::{ApiError, PortalClient};
use crate::auth::{CredentialRecord, CredentialStore, SessionManager};
use crate::config::Config;
use crate::guard::{GuardState, NavigationGuard};
use crate::models::{Role, UserProfile};
use crate::policy::{Area, RedirectTarget};

pub struct App {
    config: Config,
    client: PortalClient,
    session: SessionManager,
}

impl App {
    /// Create a new application instance
    pub fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };

        let base_url = config.api_base().ok_or_else(|| {
            anyhow::anyhow!(
                "No portal API base configured. Set BLUELIGHT_API_BASE or \
                 api_base_url in the config file."
            )
        })?;

        let client = PortalClient::new(&base_url)?;
        let store = CredentialStore::open(Config::state_dir());
        if !store.is_persistent() {
            warn!("No state directory available; the session will not survive restarts");
        }
        let session = SessionManager::new(store, client.clone());

        Ok(Self {
            config,
            client,
            session,
        })
    }

    /// Run the interactive shell until the user quits.
    pub async fn run(&mut self) -> Result<()> {
        if !self.session.is_authenticated() {
            // A failed first attempt leaves the shell usable; 'login' retries.
            let _ = self.login_interactive().await;
        } else {
            // Quietly renew an expired token and bring display data up to
            // date; profile failures keep the stored copy.
            let was_expired = self.session.is_expired();
            self.session.refresh_profile().await;
            if was_expired && !self.session.is_authenticated() {
                println!("The stored session could not be renewed; use 'login'.");
            } else if let Some(profile) = self.session.profile() {
                println!("Welcome back, {}.", profile.display_name());
            }
        }

        match self.session.role() {
            Some(role) => {
                self.enter(Area::home_for(role)).await;
            }
            None if self.session.is_authenticated() => {
                println!("No role resolved for this account; areas stay closed.")
            }
            None => {}
        }

        loop {
            Self::print_menu();
            print!("> ");
            io::stdout().flush()?;

            let mut line = String::new();
            if io::stdin().read_line(&mut line)? == 0 {
                break;
            }
            let input = line.trim();
            if input.is_empty() {
                continue;
            }

            if let Ok(choice) = input.parse::<usize>() {
                if (1..=Area::ALL.len()).contains(&choice) {
                    self.enter(Area::ALL[choice - 1]).await;
                } else {
                    println!("No such area.");
                }
                continue;
            }

            match input {
                "whoami" => self.whoami().await,
                "status" => print_status(&self.session.snapshot()),
                "login" => {
                    // Failure was already reported; stay in the shell.
                    if self.login_interactive().await.is_ok() {
                        if let Some(role) = self.session.role() {
                            self.enter(Area::home_for(role)).await;
                        }
                    }
                }
                "logout" => {
                    self.session.logout();
                    println!("Signed out.");
                }
                "quit" | "q" | "exit" => break,
                _ => println!("Unknown command. Enter an area number, or: whoami, status, login, logout, quit."),
            }
        }

        Ok(())
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Enter an area, following guard redirects until something renders or
    /// the session has to go back through login. Returns the area that
    /// actually rendered.
    pub async fn enter(&self, start: Area) -> Option<Area> {
        let mut area = start;
        loop {
            let mut guard = NavigationGuard::new(area);
            match guard.evaluate(&self.session).await {
                GuardState::Allowed => {
                    println!("-> {} ({:?} family)", area.title(), area.family());
                    return Some(area);
                }
                GuardState::Redirecting(RedirectTarget::Login) => {
                    println!("The session is over; use 'login' to sign in again.");
                    return None;
                }
                GuardState::Redirecting(RedirectTarget::Area(next)) => {
                    println!(
                        "{} is not available for this role; going to {}.",
                        area.title(),
                        next.title()
                    );
                    area = next;
                }
                state => {
                    warn!(?state, "Guard did not settle, treating as signed out");
                    return None;
                }
            }
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Interactive login: email prefilled from the environment or the last
    /// sign-in, password read without echo.
    pub async fn login_interactive(&mut self) -> Result<()> {
        println!("\n=== BlueLight Login ===\n");

        let email = match std::env::var("BLUELIGHT_EMAIL") {
            Ok(email) if !email.is_empty() => email,
            _ => self.prompt_email()?,
        };

        let password = match std::env::var("BLUELIGHT_PASSWORD") {
            Ok(password) if !password.is_empty() => password,
            _ => Self::prompt_password()?,
        };

        println!("\nAuthenticating...");

        match self.client.login(&email, &password).await {
            Ok(grant) => {
                self.session.establish(grant);

                self.config.last_email = Some(email);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }

                match self.session.profile() {
                    Some(profile) => println!("Signed in as {}.", profile.display_name()),
                    None => println!("Signed in."),
                }
                info!("Login successful");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                println!("{}", Self::friendly_login_error(&e));
                Err(e)
            }
        }
    }

    fn prompt_email(&self) -> Result<String> {
        match self.config.last_email {
            Some(ref last_email) => {
                print!("Email [{}]: ", last_email);
                io::stdout().flush()?;

                let mut input = String::new();
                io::stdin().read_line(&mut input)?;
                let input = input.trim();

                Ok(if input.is_empty() {
                    last_email.clone()
                } else {
                    input.to_string()
                })
            }
            None => {
                print!("Email: ");
                io::stdout().flush()?;

                let mut input = String::new();
                io::stdin().read_line(&mut input)?;
                Ok(input.trim().to_string())
            }
        }
    }

    fn prompt_password() -> Result<String> {
        let password = rpassword::prompt_password("Password: ")?;
        Ok(password)
    }

    /// Map a login failure onto a message a person can act on.
    fn friendly_login_error(e: &anyhow::Error) -> String {
        match e.downcast_ref::<ApiError>() {
            Some(ApiError::Unauthorized(_)) => "Invalid email or password.".to_string(),
            Some(ApiError::NetworkError(inner)) if inner.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            Some(ApiError::NetworkError(_)) => {
                "Unable to connect to the portal. Check your internet connection.".to_string()
            }
            Some(ApiError::RateLimited) => {
                "Too many attempts. Wait a moment and try again.".to_string()
            }
            Some(ApiError::ServerError(_)) => {
                "The portal is having trouble. Try again later.".to_string()
            }
            _ => format!("Login failed: {}", e),
        }
    }

    // =========================================================================
    // Session inspection
    // =========================================================================

    async fn whoami(&self) {
        match self.session.refresh_profile().await {
            Some(profile) => print_profile(&profile, self.session.role()),
            None => match self.session.profile() {
                Some(profile) => {
                    println!("(stored copy; the portal could not be reached)");
                    print_profile(&profile, self.session.role());
                }
                None => println!("Not signed in."),
            },
        }
    }

    fn print_menu() {
        println!("\nAreas:");
        for (i, area) in Area::ALL.iter().enumerate() {
            println!("  {}. {}", i + 1, area.title());
        }
        println!("Commands: <number> | whoami | status | login | logout | quit");
    }
}

fn print_profile(profile: &UserProfile, role: Option<Role>) {
    println!("Name:       {}", profile.display_name());
    if let Some(ref email) = profile.email {
        println!("Email:      {}", email);
    }
    if let Some(ref student_id) = profile.student_id {
        println!("Student ID: {}", student_id);
    }
    if let Some(ref department) = profile.department {
        println!("Department: {}", department);
    }
    if let Some(ref phone) = profile.phone {
        println!("Phone:      {}", phone);
    }
    println!(
        "Role:       {}",
        role.map(|r| r.as_str()).unwrap_or("(unresolved)")
    );
}

/// Print the shape of the persisted session without mutating it.
pub fn print_status(record: &CredentialRecord) {
    let presence = |field: &Option<String>| if field.is_some() { "present" } else { "absent" };

    println!("access token:  {}", presence(&record.access_token));
    println!("refresh token: {}", presence(&record.refresh_token));
    match record.expires_in_ms() {
        Some(ms) if ms > 0 => println!("expires in:    {}s", ms / 1_000),
        Some(ms) => println!("expired:       {}s ago", -ms / 1_000),
        None => println!("expiry:        not set"),
    }
    println!(
        "role:          {}",
        record.role.map(|r| r.as_str()).unwrap_or("(unresolved)")
    );
    match record.profile {
        Some(ref profile) => println!("profile:       {}", profile.display_name()),
        None => println!("profile:       absent"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{TokenGrant, UserClaim};
    use crate::auth::CredentialStore;
    use tempfile::TempDir;

    fn app_with_session(dir: &TempDir) -> App {
        let client = PortalClient::new("http://127.0.0.1:9").expect("client");
        let store = CredentialStore::open(Some(dir.path().to_path_buf()));
        let session = SessionManager::new(store, client.clone());
        App {
            config: Config::default(),
            client,
            session,
        }
    }

    fn grant(role: &str) -> TokenGrant {
        TokenGrant {
            access_token: "acc-1".to_string(),
            refresh_token: "ref-1".to_string(),
            expires_in: 3600,
            user: Some(UserClaim {
                role: Some(role.to_string()),
                profile: UserProfile::default(),
            }),
        }
    }

    #[tokio::test]
    async fn test_enter_renders_a_matching_area() {
        let dir = TempDir::new().expect("temp dir");
        let app = app_with_session(&dir);
        app.session.establish(grant("user"));

        assert_eq!(app.enter(Area::PhotoReport).await, Some(Area::PhotoReport));
    }

    #[tokio::test]
    async fn test_enter_follows_cross_family_redirect_to_role_home() {
        let dir = TempDir::new().expect("temp dir");
        let app = app_with_session(&dir);
        app.session.establish(grant("admin"));

        // An admin aiming at a reporter view lands on the staff home.
        assert_eq!(app.enter(Area::ReporterHome).await, Some(Area::StaffDashboard));
    }

    #[tokio::test]
    async fn test_enter_signed_out_yields_no_area() {
        let dir = TempDir::new().expect("temp dir");
        let app = app_with_session(&dir);

        assert_eq!(app.enter(Area::StaffReports).await, None);
    }

    #[test]
    fn test_friendly_login_error_mapping() {
        let unauthorized: anyhow::Error =
            ApiError::Unauthorized("Email atau password salah".to_string()).into();
        assert_eq!(
            App::friendly_login_error(&unauthorized),
            "Invalid email or password."
        );

        let server: anyhow::Error = ApiError::ServerError("boom".to_string()).into();
        assert_eq!(
            App::friendly_login_error(&server),
            "The portal is having trouble. Try again later."
        );

        let other = anyhow::anyhow!("config file locked");
        assert!(App::friendly_login_error(&other).starts_with("Login failed:"));
    }

    #[tokio::test]
    async fn test_friendly_login_error_for_unreachable_portal() {
        let client = PortalClient::new("http://127.0.0.1:9").expect("client");
        let err = client
            .login("rizky@campus.example", "pw")
            .await
            .expect_err("login should fail");

        assert_eq!(
            App::friendly_login_error(&err),
            "Unable to connect to the portal. Check your internet connection."
        );
    }
}
