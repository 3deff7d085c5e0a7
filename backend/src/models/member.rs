//! Member model with its embedded per-company programs.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A family member and the loyalty accounts they hold, keyed by company id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub programs: BTreeMap<String, Program>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One member's account data with one company.
///
/// `company_id` always equals the key the program is stored under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub company_id: String,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub cpf: String,
    #[serde(default)]
    pub card_number: String,
    #[serde(default)]
    pub current_balance: i64,
    #[serde(default)]
    pub elite_tier: String,
    #[serde(default)]
    pub notes: String,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub last_change: String,
    #[serde(default)]
    pub custom_fields: BTreeMap<String, String>,
}

impl Program {
    /// A blank program for `company_id`.
    pub fn empty(company_id: &str, now: DateTime<Utc>, last_change: &str) -> Self {
        Self {
            company_id: company_id.to_string(),
            login: String::new(),
            password: String::new(),
            cpf: String::new(),
            card_number: String::new(),
            current_balance: 0,
            elite_tier: String::new(),
            notes: String::new(),
            last_updated: now,
            last_change: last_change.to_string(),
            custom_fields: BTreeMap::new(),
        }
    }
}

/// The fixed-schema program fields that are diffed one by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramField {
    Login,
    Password,
    Cpf,
    CardNumber,
    CurrentBalance,
    EliteTier,
    Notes,
}

impl ProgramField {
    pub const ALL: [ProgramField; 7] = [
        ProgramField::Login,
        ProgramField::Password,
        ProgramField::Cpf,
        ProgramField::CardNumber,
        ProgramField::CurrentBalance,
        ProgramField::EliteTier,
        ProgramField::Notes,
    ];

    /// JSON key of the field.
    pub fn key(self) -> &'static str {
        match self {
            ProgramField::Login => "login",
            ProgramField::Password => "password",
            ProgramField::Cpf => "cpf",
            ProgramField::CardNumber => "card_number",
            ProgramField::CurrentBalance => "current_balance",
            ProgramField::EliteTier => "elite_tier",
            ProgramField::Notes => "notes",
        }
    }

    pub fn value_of(self, program: &Program) -> FieldValue {
        match self {
            ProgramField::CurrentBalance => FieldValue::Integer(program.current_balance),
            ProgramField::Login => FieldValue::Text(program.login.clone()),
            ProgramField::Password => FieldValue::Text(program.password.clone()),
            ProgramField::Cpf => FieldValue::Text(program.cpf.clone()),
            ProgramField::CardNumber => FieldValue::Text(program.card_number.clone()),
            ProgramField::EliteTier => FieldValue::Text(program.elite_tier.clone()),
            ProgramField::Notes => FieldValue::Text(program.notes.clone()),
        }
    }

    pub fn assign(self, program: &mut Program, value: FieldValue) {
        let slot = match self {
            ProgramField::CurrentBalance => {
                if let FieldValue::Integer(n) = value {
                    program.current_balance = n;
                }
                return;
            }
            ProgramField::Login => &mut program.login,
            ProgramField::Password => &mut program.password,
            ProgramField::Cpf => &mut program.cpf,
            ProgramField::CardNumber => &mut program.card_number,
            ProgramField::EliteTier => &mut program.elite_tier,
            ProgramField::Notes => &mut program.notes,
        };
        *slot = value.to_string();
    }
}

/// A standard field value, stringified for the change log via `Display`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Integer(n) => write!(f, "{}", n),
        }
    }
}

/// Request body for a partial program update. Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgramUpdate {
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(default)]
    pub card_number: Option<String>,
    #[serde(default)]
    pub current_balance: Option<i64>,
    #[serde(default)]
    pub elite_tier: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ProgramUpdate {
    /// Fields present in the request, in `ProgramField::ALL` order.
    pub fn proposed(&self) -> Vec<(ProgramField, FieldValue)> {
        let text = |v: &Option<String>| v.clone().map(FieldValue::Text);
        ProgramField::ALL
            .iter()
            .filter_map(|&field| {
                let value = match field {
                    ProgramField::Login => text(&self.login),
                    ProgramField::Password => text(&self.password),
                    ProgramField::Cpf => text(&self.cpf),
                    ProgramField::CardNumber => text(&self.card_number),
                    ProgramField::CurrentBalance => self.current_balance.map(FieldValue::Integer),
                    ProgramField::EliteTier => text(&self.elite_tier),
                    ProgramField::Notes => text(&self.notes),
                };
                value.map(|v| (field, v))
            })
            .collect()
    }
}

/// Request body for creating a member.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMemberRequest {
    pub name: String,
}

/// Request body for adding a program (and possibly a new company) to a member.
#[derive(Debug, Clone, Deserialize)]
pub struct AddProgramRequest {
    pub company_name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// `{member_id, member_name}` returned by member create/delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRef {
    pub member_id: String,
    pub member_name: String,
}

/// `{company_id, company_name}` returned when a program is added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramRef {
    pub company_id: String,
    pub company_name: String,
}
