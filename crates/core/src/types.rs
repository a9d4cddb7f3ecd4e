use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier assigned to a customer by the persistence backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CustomerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CustomerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A single salon visit. Records are never edited once appended to a history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitRecord {
    pub date: NaiveDate,
    #[serde(default)]
    pub note: String,
}

/// Customer entity as held by the directory.
///
/// `history` is ordered most-recent-first and `visit_count` always equals its
/// length once the customer has passed through [`crate::ledger::VisitLedger`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    #[serde(default)]
    pub kana: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub visit_count: u32,
    #[serde(default)]
    pub history: Vec<VisitRecord>,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// Builds a freshly registered customer with no visits.
    pub fn registered(id: CustomerId, draft: NewCustomer, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            kana: draft.kana,
            phone: draft.phone,
            email: draft.email,
            visit_count: 0,
            history: Vec::new(),
            created_at,
        }
    }

    /// Returns the most recent visit, if any.
    pub fn last_visit(&self) -> Option<&VisitRecord> {
        self.history.first()
    }
}

/// Registration form values before an id has been assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    #[serde(default)]
    pub kana: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl NewCustomer {
    pub fn new<N: Into<String>, K: Into<String>>(name: N, kana: K) -> Self {
        Self {
            name: name.into(),
            kana: kana.into(),
            phone: None,
            email: None,
        }
    }

    pub fn with_phone<S: Into<String>>(mut self, phone: S) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Trims every field and drops blank contact details.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            kana: self.kana.trim().to_string(),
            phone: non_blank(self.phone),
            email: non_blank(self.email),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
