//! Role-gated access policy.
//!
//! One pure function decides, for every protected area, whether a
//! resolved role may enter it and where to send the caller otherwise.
//! Keeping the rule in a single place means every entry point agrees on
//! it and it has exactly one test surface.

use crate::models::Role;

/// Protected areas of the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    /// Emergency alert view, the reporter home.
    ReporterHome,
    /// Photo incident report form.
    PhotoReport,
    /// Staff dashboard, the staff home.
    StaffDashboard,
    /// Incoming report triage.
    StaffReports,
    /// Volunteer management.
    StaffVolunteers,
    /// Incident analytics.
    StaffAnalytics,
    /// Portal settings.
    StaffSettings,
}

/// The two authorization families. Every area belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaFamily {
    Reporter,
    Staff,
}

impl Area {
    /// Every protected area, in menu order.
    pub const ALL: [Area; 7] = [
        Area::ReporterHome,
        Area::PhotoReport,
        Area::StaffDashboard,
        Area::StaffReports,
        Area::StaffVolunteers,
        Area::StaffAnalytics,
        Area::StaffSettings,
    ];

    pub fn family(&self) -> AreaFamily {
        match self {
            Area::ReporterHome | Area::PhotoReport => AreaFamily::Reporter,
            Area::StaffDashboard
            | Area::StaffReports
            | Area::StaffVolunteers
            | Area::StaffAnalytics
            | Area::StaffSettings => AreaFamily::Staff,
        }
    }

    /// Landing area for a role, used after login and for cross-family
    /// redirects.
    pub fn home_for(role: Role) -> Area {
        match role {
            Role::User => Area::ReporterHome,
            Role::Volunteer | Role::Admin => Area::StaffDashboard,
        }
    }

    /// Display title for menus and status lines.
    pub fn title(&self) -> &'static str {
        match self {
            Area::ReporterHome => "Emergency Alert",
            Area::PhotoReport => "Photo Report",
            Area::StaffDashboard => "Dashboard",
            Area::StaffReports => "Reports",
            Area::StaffVolunteers => "Volunteers",
            Area::StaffAnalytics => "Analytics",
            Area::StaffSettings => "Settings",
        }
    }
}

/// Where a denied caller is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectTarget {
    /// Credential acquisition.
    Login,
    Area(Area),
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Redirect(RedirectTarget),
}

/// Decide whether `role` may enter `area`.
///
/// The user role lives in the reporter family and staff roles in the
/// staff family; crossing over redirects to the role's own home. A
/// missing or unresolved role is never allowed anywhere and goes back
/// through login.
pub fn authorize(role: Option<Role>, area: Area) -> Access {
    let Some(role) = role else {
        return Access::Redirect(RedirectTarget::Login);
    };

    let allowed = match area.family() {
        AreaFamily::Reporter => !role.is_staff(),
        AreaFamily::Staff => role.is_staff(),
    };

    if allowed {
        Access::Allow
    } else {
        Access::Redirect(RedirectTarget::Area(Area::home_for(role)))
    }
}
