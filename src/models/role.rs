use serde::{Deserialize, Serialize};

/// Authorization category assigned by the portal backend.
///
/// The backend only ever issues these three values. Anything else seen on
/// the wire or on disk is treated as unresolved rather than being mapped
/// to some default role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Volunteer,
    Admin,
}

impl Role {
    /// Parse a role string from an API response or persisted state.
    /// Unknown values yield `None` so they never grant access anywhere.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "user" => Some(Role::User),
            "volunteer" => Some(Role::Volunteer),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Volunteer => "volunteer",
            Role::Admin => "admin",
        }
    }

    /// Staff roles triage reports and manage volunteers; the user role
    /// files them.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Volunteer | Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_roles() {
        assert_eq!(Role::parse("user"), Some(Role::User));
        assert_eq!(Role::parse("volunteer"), Some(Role::Volunteer));
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
    }

    #[test]
    fn test_parse_is_lenient_about_case_and_whitespace() {
        assert_eq!(Role::parse("Admin"), Some(Role::Admin));
        assert_eq!(Role::parse(" volunteer \n"), Some(Role::Volunteer));
        assert_eq!(Role::parse("USER"), Some(Role::User));
    }

    #[test]
    fn test_parse_rejects_unknown_values() {
        assert_eq!(Role::parse(""), None);
        assert_eq!(Role::parse("superuser"), None);
        assert_eq!(Role::parse("administrator"), None);
        assert_eq!(Role::parse("null"), None);
    }

    #[test]
    fn test_serde_roundtrip_uses_lowercase() {
        let json = serde_json::to_string(&Role::Volunteer).expect("serialize role");
        assert_eq!(json, r#""volunteer""#);

        let role: Role = serde_json::from_str(r#""admin""#).expect("deserialize role");
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn test_deserialize_rejects_unknown_role() {
        assert!(serde_json::from_str::<Role>(r#""moderator""#).is_err());
    }

    #[test]
    fn test_is_staff() {
        assert!(!Role::User.is_staff());
        assert!(Role::Volunteer.is_staff());
        assert!(Role::Admin.is_staff());
    }
}
