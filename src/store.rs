//! In-memory entity store
//!
//! Fixed demo data served by the lookup routes. The store is read-only after
//! construction, so handlers share it through an `Arc` without locking.

use serde::{Deserialize, Serialize};

/// A user record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub age: u32,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_adult: bool,
}

/// A note record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
}

/// Users and notes, each keyed by id
#[derive(Debug, Clone)]
pub struct EntityStore {
    users: Vec<User>,
    notes: Vec<Note>,
}

impl EntityStore {
    pub fn new(users: Vec<User>, notes: Vec<Note>) -> Self {
        Self { users, notes }
    }

    pub fn user(&self, id: i64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn note(&self, id: i64) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }
}

impl Default for EntityStore {
    /// The seeded demo data set
    fn default() -> Self {
        let user = |id, name: &str, age, is_adult| User {
            id,
            name: name.to_string(),
            age,
            is_adult,
        };
        let note = |id, title: &str, text: &str| Note {
            id,
            title: title.to_string(),
            text: text.to_string(),
        };

        Self::new(
            vec![
                user(1, "Sam", 15, false),
                user(2, "John", 22, true),
                user(3, "Henrik", 39, true),
            ],
            vec![
                note(1, "Homework", "Math"),
                note(2, "Game info", "Developer: Arkane Studios"),
                note(3, "Friend's email", "friendsemail@example.com"),
            ],
        )
    }
}
