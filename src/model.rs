use serde::{Deserialize, Serialize};

/// Role a session principal acts under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let token = match self {
            Role::Student => "student",
            Role::Admin => "admin",
        };
        write!(f, "{}", token)
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("{:?} is not a valid role", s)),
        }
    }
}

/// Closed set of achievement categories. Anything else is rejected at the
/// protocol boundary; the store never re-validates it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Award,
    Recognition,
    Participation,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let token = match self {
            Category::Award => "award",
            Category::Recognition => "recognition",
            Category::Participation => "participation",
        };
        write!(f, "{}", token)
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "award" => Ok(Category::Award),
            "recognition" => Ok(Category::Recognition),
            "participation" => Ok(Category::Participation),
            _ => Err(format!("{:?} is not a valid category", s)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub email: String,
    // Stored as given. The portal never hashes passwords.
    pub password: String,
    pub roll_number: String,
    pub department: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub student_id: String,
    pub title: String,
    pub category: Category,
    pub date: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participation {
    pub id: String,
    pub student_id: String,
    pub event_name: String,
    pub date: String,
    pub description: String,
}

/// Session principal. Student logins carry a full copy of the matched record;
/// admin logins are synthesized with no backing row. Lives only in daemon
/// memory, so a restart signs everyone out.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub role: Role,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

impl CurrentUser {
    pub fn for_student(student: &Student) -> Self {
        Self {
            role: Role::Student,
            name: student.name.clone(),
            email: student.email.clone(),
            id: Some(student.id.clone()),
            password: Some(student.password.clone()),
            roll_number: Some(student.roll_number.clone()),
            department: Some(student.department.clone()),
        }
    }

    pub fn for_admin(email: &str) -> Self {
        Self {
            role: Role::Admin,
            name: "Admin User".to_string(),
            email: email.to_string(),
            id: None,
            password: None,
            roll_number: None,
            department: None,
        }
    }
}
