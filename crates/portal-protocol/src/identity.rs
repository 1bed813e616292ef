//! User identity and roles.

use serde::{Deserialize, Serialize};

/// User role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Submits achievement records.
    Student,
    /// Reviews records of their students.
    Faculty,
    /// Administrator.
    Admin,
}

impl Role {
    /// Front-end route a user lands on after signing in.
    pub fn home_route(&self) -> &'static str {
        match self {
            Role::Student => "/student",
            Role::Faculty => "/faculty",
            Role::Admin => "/admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Student => write!(f, "student"),
            Role::Faculty => write!(f, "faculty"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "faculty" => Ok(Role::Faculty),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("unknown role: {}", s)),
        }
    }
}

/// Role-tagged user record carried inside a token.
///
/// Never holds the credential secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Email address, the unique key.
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub role: Role,
    /// Display picture URL.
    #[serde(rename = "pic", default)]
    pub display_picture_url: String,
}

impl Identity {
    /// Full display name, falling back to the email.
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_display() {
        assert_eq!(Role::Student.to_string(), "student");
        assert_eq!(Role::Faculty.to_string(), "faculty");
        assert_eq!(Role::Admin.to_string(), "admin");
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("student".parse::<Role>().unwrap(), Role::Student);
        assert_eq!("Faculty".parse::<Role>().unwrap(), Role::Faculty);
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert!("user".parse::<Role>().is_err());
    }

    #[test]
    fn test_identity_wire_format() {
        let identity = Identity {
            email: "student@test.com".to_string(),
            first_name: "Student".to_string(),
            last_name: "User".to_string(),
            role: Role::Student,
            display_picture_url: "https://via.placeholder.com/150".to_string(),
        };

        let value = serde_json::to_value(&identity).unwrap();
        assert_eq!(
            value,
            json!({
                "email": "student@test.com",
                "firstName": "Student",
                "lastName": "User",
                "role": "student",
                "pic": "https://via.placeholder.com/150"
            })
        );
    }

    #[test]
    fn test_display_name() {
        let mut identity = Identity {
            email: "a@b.c".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            role: Role::Admin,
            display_picture_url: String::new(),
        };
        assert_eq!(identity.display_name(), "Ada Lovelace");

        identity.first_name.clear();
        identity.last_name.clear();
        assert_eq!(identity.display_name(), "a@b.c");
    }
}
