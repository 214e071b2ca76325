//! # Profile rows
//!
//! A [`Profile`] is the application's record of a user, one row of the `users`
//! table. It is distinct from the auth service's [`AuthUser`]: the profile
//! carries the role and the practice counters, and its `id` always equals the
//! auth user's id.
//!
//! [`NewProfile`] is the insert shape used when a profile is provisioned at
//! sign-up, synthesized on first fetch, or created by the server-side sign-up
//! handler. [`UserStats`] is the counter projection the stats endpoint returns.
//!
//! The display helpers ([`Profile::display_name`], [`initials`],
//! [`avatar_color`]) drive the dashboard's avatar badge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::null_as_default;
use crate::backend::AuthUser;

pub const USERS_TABLE: &str = "users";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
    /// Any role this build does not know; never grants admin.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub role: Role,
    #[serde(default, deserialize_with = "null_as_default")]
    pub meditation_streak: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_meditations: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub journal_entries: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// The name, or the local part of the email when no name is set.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => self.email.split('@').next().unwrap_or(&self.email),
        }
    }

    pub fn initials(&self) -> String {
        initials(self.display_name())
    }

    pub fn stats(&self) -> UserStats {
        UserStats {
            meditation_streak: self.meditation_streak,
            total_meditations: self.total_meditations,
            journal_entries: self.journal_entries,
        }
    }
}

/// Insert shape for a fresh profile row: role `user`, all counters zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProfile {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub meditation_streak: i64,
    pub total_meditations: i64,
    pub journal_entries: i64,
    pub created_at: DateTime<Utc>,
}

impl NewProfile {
    pub fn new(id: Uuid, email: impl Into<String>, name: Option<String>) -> Self {
        Self {
            id,
            email: email.into(),
            name,
            role: Role::User,
            meditation_streak: 0,
            total_meditations: 0,
            journal_entries: 0,
            created_at: Utc::now(),
        }
    }

    /// Default row from the auth user's identity claims.
    pub fn for_user(user: &AuthUser, name: Option<&str>) -> Self {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .or_else(|| user.display_name())
            .map(str::to_string);
        Self::new(user.id, user.email.clone().unwrap_or_default(), name)
    }

    /// The row as it reads back after insert.
    pub fn into_profile(self) -> Profile {
        Profile {
            id: self.id,
            email: self.email,
            name: self.name,
            role: self.role,
            meditation_streak: self.meditation_streak,
            total_meditations: self.total_meditations,
            journal_entries: self.journal_entries,
            created_at: Some(self.created_at),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatField {
    MeditationStreak,
    TotalMeditations,
    JournalEntries,
}

impl StatField {
    pub const ALL: [StatField; 3] = [
        StatField::MeditationStreak,
        StatField::TotalMeditations,
        StatField::JournalEntries,
    ];

    pub fn column(self) -> &'static str {
        match self {
            StatField::MeditationStreak => "meditation_streak",
            StatField::TotalMeditations => "total_meditations",
            StatField::JournalEntries => "journal_entries",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    #[serde(default, deserialize_with = "null_as_default")]
    pub meditation_streak: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_meditations: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub journal_entries: i64,
}

impl UserStats {
    pub fn get(&self, field: StatField) -> i64 {
        match field {
            StatField::MeditationStreak => self.meditation_streak,
            StatField::TotalMeditations => self.total_meditations,
            StatField::JournalEntries => self.journal_entries,
        }
    }
}

/// First letters of the first two words, upper-cased.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}

const AVATAR_PALETTE: [&str; 10] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7", "#DDA0DD", "#98D8C8", "#F7DC6F",
    "#BB8FCE", "#85C1E9",
];

/// Stable palette colour for a name, hashed over UTF-16 code units. Only the
/// shifted term wraps to 32 bits; the running hash does not.
pub fn avatar_color(name: &str) -> &'static str {
    let hash = name.encode_utf16().fold(0i64, |hash, unit| {
        let shifted = i64::from((hash as i32).wrapping_shl(5));
        i64::from(unit) + (shifted - hash)
    });
    AVATAR_PALETTE[(hash.unsigned_abs() % AVATAR_PALETTE.len() as u64) as usize]
}
