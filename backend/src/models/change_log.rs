//! Change-log (global log) model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Values written into `field_changed` / `old_value` / `new_value` for
/// structural changes. The frontend displays them verbatim.
pub mod vocab {
    pub const FIELD_MEMBER: &str = "membro";
    pub const FIELD_PROGRAM: &str = "programa";
    pub const FIELD_CUSTOM_FIELDS: &str = "custom_fields";
    pub const CREATED: &str = "criado";
    pub const ACTIVE: &str = "ativo";
    pub const DELETED: &str = "deletado";
    pub const ADDED: &str = "adicionado";
    pub const REMOVED: &str = "removido";
}

/// Kind of mutation an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Create,
    Update,
    Delete,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Create => "create",
            ChangeType::Update => "update",
            ChangeType::Delete => "delete",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "create" => Some(ChangeType::Create),
            "update" => Some(ChangeType::Update),
            "delete" => Some(ChangeType::Delete),
            _ => None,
        }
    }
}

/// Immutable audit record. Entries are only ever appended.
///
/// Member-level entries carry empty `company_id` / `company_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    pub id: String,
    pub member_id: String,
    pub member_name: String,
    pub company_id: String,
    pub company_name: String,
    pub field_changed: String,
    pub old_value: String,
    pub new_value: String,
    pub timestamp: DateTime<Utc>,
    pub change_type: ChangeType,
}

/// Who/what an entry is about.
#[derive(Debug, Clone, Copy)]
pub struct LogSubject<'a> {
    pub member_id: &'a str,
    pub member_name: &'a str,
    pub company_id: &'a str,
    pub company_name: &'a str,
}

impl<'a> LogSubject<'a> {
    /// Subject for member-level entries (no company).
    pub fn member(member_id: &'a str, member_name: &'a str) -> Self {
        Self {
            member_id,
            member_name,
            company_id: "",
            company_name: "",
        }
    }
}

impl ChangeLogEntry {
    pub fn new(
        subject: LogSubject<'_>,
        change_type: ChangeType,
        field_changed: &str,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            member_id: subject.member_id.to_string(),
            member_name: subject.member_name.to_string(),
            company_id: subject.company_id.to_string(),
            company_name: subject.company_name.to_string(),
            field_changed: field_changed.to_string(),
            old_value: old_value.into(),
            new_value: new_value.into(),
            timestamp,
            change_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_type_wire_format() {
        assert_eq!(
            serde_json::to_string(&ChangeType::Delete).unwrap(),
            "\"delete\""
        );
        assert_eq!(ChangeType::parse("update"), Some(ChangeType::Update));
        assert_eq!(ChangeType::parse("UPDATE"), None);
    }

    #[test]
    fn test_member_entry_has_every_field() {
        let entry = ChangeLogEntry::new(
            LogSubject::member("m-1", "Ana"),
            ChangeType::Create,
            vocab::FIELD_MEMBER,
            "",
            vocab::CREATED,
            Utc::now(),
        );
        let json = serde_json::to_value(&entry).unwrap();
        for key in [
            "id",
            "member_id",
            "member_name",
            "company_id",
            "company_name",
            "field_changed",
            "old_value",
            "new_value",
            "timestamp",
            "change_type",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["company_id"], "");
        assert_eq!(json["change_type"], "create");
    }
}
