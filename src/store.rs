use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::model::{Achievement, Category, Participation, Student};

pub const SLOT_STUDENTS: &str = "students.json";
pub const SLOT_ACHIEVEMENTS: &str = "achievements.json";
pub const SLOT_PARTICIPATIONS: &str = "participations.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),
    #[error("unknown student id {0:?}")]
    UnknownStudent(String),
    #[error("storage failure on {slot}: {source}")]
    Storage {
        slot: &'static str,
        #[source]
        source: io::Error,
    },
}

fn storage(slot: &'static str, source: io::Error) -> StoreError {
    StoreError::Storage { slot, source }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub roll_number: String,
    #[serde(default)]
    pub department: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAchievement {
    pub student_id: String,
    pub title: String,
    pub category: Category,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewParticipation {
    pub student_id: String,
    pub event_name: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AchievementFilter {
    pub student_id: Option<String>,
    pub category: Option<Category>,
}

#[derive(Debug, Clone, Default)]
pub struct ParticipationFilter {
    pub student_id: Option<String>,
}

/// Collections for one workspace, mirrored to one JSON slot file each.
/// Mutations go through the methods below; each one persists the whole
/// collection before it returns, so a crash never loses an acknowledged write.
pub struct Store {
    workspace: PathBuf,
    students: Vec<Student>,
    achievements: Vec<Achievement>,
    participations: Vec<Participation>,
}

impl Store {
    /// Load all slots from `workspace`. A missing or unparsable slot falls
    /// back to the demo dataset and is written back, so opening never fails on
    /// bad content. Opening an already-populated workspace changes nothing.
    pub fn open(workspace: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(workspace).map_err(|e| storage("workspace", e))?;

        let demo = demo_dataset();
        let mut seeded: Vec<&str> = Vec::new();

        let students = match load_slot::<Student>(workspace, SLOT_STUDENTS) {
            Some(rows) => rows,
            None => {
                persist_slot(workspace, SLOT_STUDENTS, &demo.students)?;
                seeded.push(SLOT_STUDENTS);
                demo.students
            }
        };
        let achievements = match load_slot::<Achievement>(workspace, SLOT_ACHIEVEMENTS) {
            Some(rows) => rows,
            None => {
                persist_slot(workspace, SLOT_ACHIEVEMENTS, &demo.achievements)?;
                seeded.push(SLOT_ACHIEVEMENTS);
                demo.achievements
            }
        };
        let participations = match load_slot::<Participation>(workspace, SLOT_PARTICIPATIONS) {
            Some(rows) => rows,
            None => {
                persist_slot(workspace, SLOT_PARTICIPATIONS, &demo.participations)?;
                seeded.push(SLOT_PARTICIPATIONS);
                demo.participations
            }
        };

        if !seeded.is_empty() {
            info!("seeded demo data into {}", seeded.join(", "));
        }

        Ok(Self {
            workspace: workspace.to_path_buf(),
            students,
            achievements,
            participations,
        })
    }

    pub fn add_student(&mut self, new: NewStudent) -> Result<Student, StoreError> {
        let name = new.name.trim().to_string();
        let email = new.email.trim().to_string();
        if name.is_empty() {
            return Err(StoreError::Validation("name must not be empty".into()));
        }
        if email.is_empty() {
            return Err(StoreError::Validation("email must not be empty".into()));
        }
        if !is_valid_email(&email) {
            return Err(StoreError::Validation(format!(
                "{:?} is not a valid email address",
                email
            )));
        }
        if new.password.is_empty() {
            return Err(StoreError::Validation("password must not be empty".into()));
        }
        // Login looks students up by exact email, so a second row with the
        // same address would make that lookup ambiguous.
        if self.students.iter().any(|s| s.email == email) {
            return Err(StoreError::Validation(format!(
                "a student with email {:?} is already registered",
                email
            )));
        }

        let record = Student {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            password: new.password,
            roll_number: new.roll_number.trim().to_string(),
            department: new.department.trim().to_string(),
        };

        self.students.push(record.clone());
        if let Err(e) = persist_slot(&self.workspace, SLOT_STUDENTS, &self.students) {
            self.students.pop();
            return Err(e);
        }
        debug!("registered student {} <{}>", record.name, record.email);
        Ok(record)
    }

    pub fn add_achievement(&mut self, new: NewAchievement) -> Result<Achievement, StoreError> {
        let title = new.title.trim().to_string();
        if title.is_empty() {
            return Err(StoreError::Validation("title must not be empty".into()));
        }
        if !self.students.iter().any(|s| s.id == new.student_id) {
            return Err(StoreError::UnknownStudent(new.student_id));
        }

        let record = Achievement {
            id: Uuid::new_v4().to_string(),
            student_id: new.student_id,
            title,
            category: new.category,
            date: date_or_today(new.date),
            description: new.description.unwrap_or_default(),
        };

        self.achievements.push(record.clone());
        if let Err(e) = persist_slot(&self.workspace, SLOT_ACHIEVEMENTS, &self.achievements) {
            self.achievements.pop();
            return Err(e);
        }
        Ok(record)
    }

    pub fn add_participation(&mut self, new: NewParticipation) -> Result<Participation, StoreError> {
        let event_name = new.event_name.trim().to_string();
        if event_name.is_empty() {
            return Err(StoreError::Validation("eventName must not be empty".into()));
        }
        if !self.students.iter().any(|s| s.id == new.student_id) {
            return Err(StoreError::UnknownStudent(new.student_id));
        }

        let record = Participation {
            id: Uuid::new_v4().to_string(),
            student_id: new.student_id,
            event_name,
            date: date_or_today(new.date),
            description: new.description.unwrap_or_default(),
        };

        self.participations.push(record.clone());
        if let Err(e) = persist_slot(&self.workspace, SLOT_PARTICIPATIONS, &self.participations) {
            self.participations.pop();
            return Err(e);
        }
        Ok(record)
    }

    pub fn list_students(&self) -> &[Student] {
        &self.students
    }

    pub fn list_achievements(&self, filter: &AchievementFilter) -> Vec<Achievement> {
        self.achievements
            .iter()
            .filter(|a| {
                filter
                    .student_id
                    .as_ref()
                    .map(|id| a.student_id == *id)
                    .unwrap_or(true)
            })
            .filter(|a| filter.category.map(|c| a.category == c).unwrap_or(true))
            .cloned()
            .collect()
    }

    pub fn list_participations(&self, filter: &ParticipationFilter) -> Vec<Participation> {
        self.participations
            .iter()
            .filter(|p| {
                filter
                    .student_id
                    .as_ref()
                    .map(|id| p.student_id == *id)
                    .unwrap_or(true)
            })
            .cloned()
            .collect()
    }

    /// Exact, case-sensitive match on both fields.
    pub fn find_student_by_credentials(&self, email: &str, password: &str) -> Option<&Student> {
        self.students
            .iter()
            .find(|s| s.email == email && s.password == password)
    }
}

fn date_or_today(date: Option<String>) -> String {
    match date {
        Some(d) if !d.trim().is_empty() => d.trim().to_string(),
        _ => chrono::Local::now().date_naive().to_string(),
    }
}

fn is_valid_email(email: &str) -> bool {
    if email.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

fn load_slot<T: DeserializeOwned>(workspace: &Path, slot: &str) -> Option<Vec<T>> {
    let path = workspace.join(slot);
    let bytes = match fs::read(&path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("slot {} not present yet", slot);
            return None;
        }
        Err(e) => {
            warn!("slot {} unreadable ({}); falling back to demo data", slot, e);
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(rows) => Some(rows),
        Err(e) => {
            warn!("slot {} corrupt ({}); falling back to demo data", slot, e);
            None
        }
    }
}

fn persist_slot<T: Serialize>(
    workspace: &Path,
    slot: &'static str,
    rows: &[T],
) -> Result<(), StoreError> {
    // Serialize the whole collection up front, then commit via rename, so the
    // prior snapshot stays intact if anything here fails.
    let body = serde_json::to_vec_pretty(rows).map_err(|e| storage(slot, e.into()))?;
    let tmp = workspace.join(format!("{}.tmp", slot));
    fs::write(&tmp, &body).map_err(|e| storage(slot, e))?;
    fs::rename(&tmp, workspace.join(slot)).map_err(|e| storage(slot, e))?;
    Ok(())
}

struct DemoData {
    students: Vec<Student>,
    achievements: Vec<Achievement>,
    participations: Vec<Participation>,
}

// Stable ids keep a re-seeded slot consistent with the slots that survived.
fn demo_dataset() -> DemoData {
    let rahul = Student {
        id: "st-1001".to_string(),
        name: "Rahul Sharma".to_string(),
        email: "rahul@student.com".to_string(),
        password: "password123".to_string(),
        roll_number: "CS2021001".to_string(),
        department: "Computer Science".to_string(),
    };
    let priya = Student {
        id: "st-1002".to_string(),
        name: "Priya Patel".to_string(),
        email: "priya@student.com".to_string(),
        password: "password123".to_string(),
        roll_number: "EC2021042".to_string(),
        department: "Electronics".to_string(),
    };

    let achievements = vec![
        Achievement {
            id: "ach-2001".to_string(),
            student_id: rahul.id.clone(),
            title: "First Prize - National Hackathon".to_string(),
            category: Category::Award,
            date: "2024-11-15".to_string(),
            description: "Won first place among 200 teams".to_string(),
        },
        Achievement {
            id: "ach-2002".to_string(),
            student_id: rahul.id.clone(),
            title: "Dean's List".to_string(),
            category: Category::Recognition,
            date: "2025-01-10".to_string(),
            description: "Top 5% of the department".to_string(),
        },
        Achievement {
            id: "ach-2003".to_string(),
            student_id: priya.id.clone(),
            title: "Best Paper Award".to_string(),
            category: Category::Award,
            date: "2025-02-21".to_string(),
            description: "IEEE student conference".to_string(),
        },
        Achievement {
            id: "ach-2004".to_string(),
            student_id: priya.id.clone(),
            title: "Robotics Workshop".to_string(),
            category: Category::Participation,
            date: "2025-03-05".to_string(),
            description: String::new(),
        },
    ];

    let participations = vec![
        Participation {
            id: "par-3001".to_string(),
            student_id: rahul.id.clone(),
            event_name: "Smart India Hackathon".to_string(),
            date: "2024-11-14".to_string(),
            description: "36-hour national hackathon".to_string(),
        },
        Participation {
            id: "par-3002".to_string(),
            student_id: priya.id.clone(),
            event_name: "Tech Fest 2025".to_string(),
            date: "2025-02-28".to_string(),
            description: "Circuit design challenge".to_string(),
        },
    ];

    DemoData {
        students: vec![rahul, priya],
        achievements,
        participations,
    }
}
