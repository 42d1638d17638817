use serde::{Deserialize, Serialize};

/// Display data for the signed-in account.
///
/// The backend uses Indonesian field names for the student-specific
/// attributes; the serde renames keep the wire and on-disk format
/// compatible with it. Everything here is advisory only and is never
/// consulted for authorization decisions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "nim")]
    pub student_id: Option<String>,
    #[serde(rename = "jurusan")]
    pub department: Option<String>,
    #[serde(rename = "no_telp")]
    pub phone: Option<String>,
}

impl UserProfile {
    /// Name to show in prompts and status output.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("(unknown)")
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.student_id.is_none()
            && self.department.is_none()
            && self.phone.is_none()
    }
}
