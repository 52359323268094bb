//! Board records: notices, guest posts and their opaque identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Author shown when a visitor leaves the name field blank.
pub const ANONYMOUS_AUTHOR: &str = "anonymous";

/// Backend-backed guest books only ever show this many posts.
pub const GUEST_POST_LIMIT: usize = 50;

/// Opaque record identifier.
///
/// The document store hands out string push keys, the relational store numeric
/// row ids and the local store generation timestamps. Callers compare and
/// display ids but never look inside.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Num(i64),
    Key(String),
}

impl RecordId {
    /// Parse an id coming back from a UI element (always a string there).
    pub fn parse(raw: &str) -> Self {
        let t = raw.trim();
        match t.parse::<i64>() {
            Ok(n) => RecordId::Num(n),
            Err(_) => RecordId::Key(t.to_string()),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Num(n) => write!(f, "{n}"),
            RecordId::Key(k) => f.write_str(k),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Num(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Key(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub title: String,
    pub content: String,
    /// Epoch millis.
    pub timestamp: i64,
    #[serde(rename = "isAdmin", alias = "is_admin", default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestPost {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub author: String,
    pub content: String,
    /// Epoch millis.
    pub timestamp: i64,
}

/// A notice as submitted by the admin, before a store assigns its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotice {
    pub title: String,
    pub content: String,
    pub timestamp: i64,
    pub is_admin: bool,
}

impl NewNotice {
    pub fn into_notice(self, id: RecordId) -> Notice {
        Notice {
            id: Some(id),
            title: self.title,
            content: self.content,
            timestamp: self.timestamp,
            is_admin: self.is_admin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGuestPost {
    pub author: String,
    pub content: String,
    pub timestamp: i64,
}

impl NewGuestPost {
    pub fn into_post(self, id: RecordId) -> GuestPost {
        GuestPost {
            id: Some(id),
            author: self.author,
            content: self.content,
            timestamp: self.timestamp,
        }
    }
}

/// Fields an admin may change on an existing notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoticeUpdate {
    pub title: String,
    pub content: String,
}

/// Newest first. Ties keep their incoming order.
pub fn sort_newest_first<T>(items: &mut [T], ts: impl Fn(&T) -> i64) {
    items.sort_by_key(|it| std::cmp::Reverse(ts(it)));
}

/// Current time in epoch millis.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_parses_numbers_and_keys() {
        assert_eq!(RecordId::parse("42"), RecordId::Num(42));
        assert_eq!(
            RecordId::parse(" -Nx1abc "),
            RecordId::Key("-Nx1abc".to_string())
        );
        assert_eq!(RecordId::parse("42").to_string(), "42");
    }

    #[test]
    fn notice_accepts_both_admin_flag_spellings() {
        let camel: Notice =
            serde_json::from_str(r#"{"title":"T","content":"C","timestamp":1,"isAdmin":true}"#)
                .unwrap();
        let snake: Notice = serde_json::from_str(
            r#"{"id":7,"title":"T","content":"C","timestamp":1,"is_admin":true}"#,
        )
        .unwrap();
        assert!(camel.is_admin);
        assert!(snake.is_admin);
        assert_eq!(snake.id, Some(RecordId::Num(7)));
    }

    #[test]
    fn sort_is_newest_first_and_stable() {
        let mut v = vec![(1, "a"), (3, "b"), (2, "c"), (3, "d")];
        sort_newest_first(&mut v, |x| x.0);
        let order: Vec<&str> = v.iter().map(|x| x.1).collect();
        assert_eq!(order, vec!["b", "d", "c", "a"]);
    }
}
