//! Change-tracking engine.
//!
//! Every mutation of member/program data goes through [`ChangeTracker`]. It
//! diffs the request against the stored document, writes the merged program
//! back in one document update, and appends the audit entries.
//!
//! Standard fields are logged one entry per changed field. Custom fields are
//! replaced wholesale and logged as a single entry.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::clock;
use crate::db::{
    duplicate_member_message, ChangeLogRepository, CompanyRepository, MemberRepository, Store,
};
use crate::errors::AppError;
use crate::models::{
    vocab, ChangeLogEntry, ChangeType, Company, FieldValue, LogSubject, Member, MemberRef,
    Program, ProgramField, ProgramRef, ProgramUpdate, UpdateCompanyRequest,
};

pub const MEMBER_NOT_FOUND: &str = "Membro não encontrado";
pub const PROGRAM_NOT_FOUND: &str = "Programa não encontrado para este membro";
pub const COMPANY_NOT_FOUND: &str = "Programa não encontrado";

pub const PROGRAM_CREATED: &str = "Programa criado";
pub const CUSTOM_FIELDS_UPDATED: &str = "Campos personalizados atualizados";

/// One staged standard-field transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: ProgramField,
    pub old: FieldValue,
    pub new: FieldValue,
}

impl FieldChange {
    /// Human-readable form, used in responses and in `last_change`.
    pub fn describe(&self) -> String {
        format!("{}: {} → {}", self.field.key(), self.old, self.new)
    }
}

/// Fields of `update` whose value differs from `program`. Equal values are
/// skipped.
pub fn diff_program(program: &Program, update: &ProgramUpdate) -> Vec<FieldChange> {
    update
        .proposed()
        .into_iter()
        .filter_map(|(field, new)| {
            let old = field.value_of(program);
            (old != new).then_some(FieldChange { field, old, new })
        })
        .collect()
}

/// Result of [`ChangeTracker::apply_program_update`].
#[derive(Debug, Clone)]
pub struct ProgramUpdateOutcome {
    /// Descriptions of the applied changes; empty when nothing differed.
    pub changes: Vec<String>,
    pub program: Program,
}

/// Applies member/program mutations and records them in the change log.
#[derive(Clone)]
pub struct ChangeTracker {
    companies: Arc<dyn CompanyRepository>,
    members: Arc<dyn MemberRepository>,
    log: Arc<dyn ChangeLogRepository>,
}

impl ChangeTracker {
    pub fn new(
        companies: Arc<dyn CompanyRepository>,
        members: Arc<dyn MemberRepository>,
        log: Arc<dyn ChangeLogRepository>,
    ) -> Self {
        Self {
            companies,
            members,
            log,
        }
    }

    /// Tracker whose three repositories are all backed by `store`.
    pub fn from_store<S: Store>(store: Arc<S>) -> Self {
        Self::new(store.clone(), store.clone(), store)
    }

    /// Diff-and-apply for the fixed-schema program fields.
    pub async fn apply_program_update(
        &self,
        member_id: &str,
        company_id: &str,
        update: &ProgramUpdate,
    ) -> Result<ProgramUpdateOutcome, AppError> {
        let member = self.require_member(member_id).await?;
        let current = require_program(&member, company_id)?;

        let staged = diff_program(current, update);
        if staged.is_empty() {
            tracing::debug!(member_id, company_id, "Program update without changes");
            return Ok(ProgramUpdateOutcome {
                changes: Vec::new(),
                program: current.clone(),
            });
        }

        let descriptions: Vec<String> = staged.iter().map(FieldChange::describe).collect();
        let now = clock::after(current.last_updated.max(member.updated_at));

        let mut updated = current.clone();
        for change in &staged {
            change.field.assign(&mut updated, change.new.clone());
        }
        updated.last_updated = now;
        updated.last_change = descriptions.join("; ");

        self.write_program(&member.id, &updated, now).await?;

        let company_name = self.company_name(company_id).await?;
        let subject = LogSubject {
            member_id: &member.id,
            member_name: &member.name,
            company_id,
            company_name: &company_name,
        };
        for change in &staged {
            self.log
                .append(&ChangeLogEntry::new(
                    subject,
                    ChangeType::Update,
                    change.field.key(),
                    change.old.to_string(),
                    change.new.to_string(),
                    now,
                ))
                .await?;
        }

        tracing::info!(
            member_id,
            company_id,
            changed = staged.len(),
            "Program updated"
        );

        Ok(ProgramUpdateOutcome {
            changes: descriptions,
            program: updated,
        })
    }

    /// Replaces the program's custom fields with `fields`. Null values are
    /// dropped, so any key not carried with a string value is removed.
    pub async fn apply_custom_fields(
        &self,
        member_id: &str,
        company_id: &str,
        fields: BTreeMap<String, Option<String>>,
    ) -> Result<Program, AppError> {
        let member = self.require_member(member_id).await?;
        let current = require_program(&member, company_id)?;

        let replacement: BTreeMap<String, String> = fields
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, v)))
            .collect();
        if replacement.keys().any(|name| name.trim().is_empty()) {
            return Err(AppError::Validation(
                "Nome do campo não pode ser vazio".to_string(),
            ));
        }

        let now = clock::after(current.last_updated.max(member.updated_at));
        let mut updated = current.clone();
        let previous = std::mem::replace(&mut updated.custom_fields, replacement);
        updated.last_updated = now;
        updated.last_change = CUSTOM_FIELDS_UPDATED.to_string();

        self.write_program(&member.id, &updated, now).await?;

        let company_name = self.company_name(company_id).await?;
        self.log
            .append(&ChangeLogEntry::new(
                LogSubject {
                    member_id: &member.id,
                    member_name: &member.name,
                    company_id,
                    company_name: &company_name,
                },
                ChangeType::Update,
                vocab::FIELD_CUSTOM_FIELDS,
                serde_json::to_string(&previous)?,
                serde_json::to_string(&updated.custom_fields)?,
                now,
            ))
            .await?;

        tracing::info!(
            member_id,
            company_id,
            fields = updated.custom_fields.len(),
            "Custom fields replaced"
        );

        Ok(updated)
    }

    /// Removes a single custom field.
    pub async fn delete_custom_field(
        &self,
        member_id: &str,
        company_id: &str,
        field_name: &str,
    ) -> Result<Program, AppError> {
        let member = self.require_member(member_id).await?;
        let current = require_program(&member, company_id)?;

        let mut updated = current.clone();
        let Some(old_value) = updated.custom_fields.remove(field_name) else {
            return Err(AppError::NotFound(format!(
                "Campo '{}' não encontrado",
                field_name
            )));
        };
        let now = clock::after(current.last_updated.max(member.updated_at));
        updated.last_updated = now;
        updated.last_change = format!("Campo '{}' removido", field_name);

        self.write_program(&member.id, &updated, now).await?;

        let company_name = self.company_name(company_id).await?;
        self.log
            .append(&ChangeLogEntry::new(
                LogSubject {
                    member_id: &member.id,
                    member_name: &member.name,
                    company_id,
                    company_name: &company_name,
                },
                ChangeType::Delete,
                field_name,
                old_value,
                "",
                now,
            ))
            .await?;

        tracing::info!(member_id, company_id, field_name, "Custom field removed");
        Ok(updated)
    }

    /// Adds an empty program for the company named `company_name`, creating
    /// the company first when no company has exactly that name.
    pub async fn add_program(
        &self,
        member_id: &str,
        company_name: &str,
        color: Option<&str>,
    ) -> Result<ProgramRef, AppError> {
        let member = self.require_member(member_id).await?;

        let company_name = company_name.trim();
        if company_name.is_empty() {
            return Err(AppError::Validation(
                "Nome da companhia é obrigatório".to_string(),
            ));
        }

        let company = match self.companies.find_company_by_name(company_name).await? {
            Some(existing) => existing,
            None => {
                let company = Company::new(company_name, color);
                self.companies.insert_company(&company).await?;
                tracing::info!(company_id = %company.id, name = %company.name, "Company created");
                company
            }
        };

        if member.programs.contains_key(&company.id) {
            return Err(AppError::Conflict(format!(
                "{} já possui o programa {}",
                member.name, company.name
            )));
        }

        let now = clock::after(member.updated_at);
        let program = Program::empty(&company.id, now, PROGRAM_CREATED);
        self.write_program(&member.id, &program, now).await?;

        self.log
            .append(&ChangeLogEntry::new(
                LogSubject {
                    member_id: &member.id,
                    member_name: &member.name,
                    company_id: &company.id,
                    company_name: &company.name,
                },
                ChangeType::Create,
                vocab::FIELD_PROGRAM,
                "",
                vocab::ADDED,
                now,
            ))
            .await?;

        tracing::info!(member_id, company_id = %company.id, "Program added");

        Ok(ProgramRef {
            company_id: company.id,
            company_name: company.name,
        })
    }

    /// Removes one program from a member.
    pub async fn delete_program(&self, member_id: &str, company_id: &str) -> Result<(), AppError> {
        let member = self.require_member(member_id).await?;
        require_program(&member, company_id)?;

        let now = clock::after(member.updated_at);
        if !self
            .members
            .remove_program(&member.id, company_id, now)
            .await?
        {
            return Err(AppError::NotFound(MEMBER_NOT_FOUND.to_string()));
        }

        let company_name = self.company_name(company_id).await?;
        self.log
            .append(&ChangeLogEntry::new(
                LogSubject {
                    member_id: &member.id,
                    member_name: &member.name,
                    company_id,
                    company_name: &company_name,
                },
                ChangeType::Update,
                vocab::FIELD_PROGRAM,
                company_name.clone(),
                vocab::REMOVED,
                now,
            ))
            .await?;

        tracing::info!(member_id, company_id, "Program removed");
        Ok(())
    }

    /// Creates a member holding one empty program per existing company.
    pub async fn create_member(&self, name: &str) -> Result<MemberRef, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation(
                "Nome do membro é obrigatório".to_string(),
            ));
        }

        if self.members.find_member_by_name(name).await?.is_some() {
            return Err(AppError::Conflict(duplicate_member_message(name)));
        }

        let member = new_member(name, &self.companies.list_companies().await?);
        self.members.insert_member(&member).await?;

        self.log
            .append(&ChangeLogEntry::new(
                LogSubject::member(&member.id, &member.name),
                ChangeType::Create,
                vocab::FIELD_MEMBER,
                "",
                vocab::CREATED,
                member.created_at,
            ))
            .await?;

        tracing::info!(member_id = %member.id, name = %member.name, "Member created");

        Ok(MemberRef {
            member_id: member.id,
            member_name: member.name,
        })
    }

    /// Deletes a member. Their change-log entries are kept.
    pub async fn delete_member(&self, member_id: &str) -> Result<MemberRef, AppError> {
        let member = self.require_member(member_id).await?;

        if !self.members.delete_member(&member.id).await? {
            return Err(AppError::NotFound(MEMBER_NOT_FOUND.to_string()));
        }

        self.log
            .append(&ChangeLogEntry::new(
                LogSubject::member(&member.id, &member.name),
                ChangeType::Delete,
                vocab::FIELD_MEMBER,
                vocab::ACTIVE,
                vocab::DELETED,
                clock::after(member.updated_at),
            ))
            .await?;

        tracing::info!(member_id = %member.id, name = %member.name, "Member deleted");

        Ok(MemberRef {
            member_id: member.id,
            member_name: member.name,
        })
    }

    /// Renames or recolors a company. Names stay unique so that
    /// [`add_program`](Self::add_program) keeps resolving one company per name.
    pub async fn update_company(
        &self,
        company_id: &str,
        request: &UpdateCompanyRequest,
    ) -> Result<Company, AppError> {
        let mut company = self
            .companies
            .get_company(company_id)
            .await?
            .ok_or_else(|| AppError::NotFound(COMPANY_NOT_FOUND.to_string()))?;

        if let Some(name) = request.name.as_deref().map(str::trim) {
            if name.is_empty() {
                return Err(AppError::Validation(
                    "Nome da companhia é obrigatório".to_string(),
                ));
            }
            if let Some(other) = self.companies.find_company_by_name(name).await? {
                if other.id != company.id {
                    return Err(AppError::Conflict(format!(
                        "Companhia com nome '{}' já existe",
                        name
                    )));
                }
            }
            company.name = name.to_string();
        }
        if let Some(color) = &request.color {
            company.color = color.clone();
        }
        if let Some(points_name) = &request.points_name {
            company.points_name = points_name.clone();
        }

        if !self.companies.update_company(&company).await? {
            return Err(AppError::NotFound(COMPANY_NOT_FOUND.to_string()));
        }

        tracing::info!(company_id, name = %company.name, "Company updated");
        Ok(company)
    }

    async fn require_member(&self, member_id: &str) -> Result<Member, AppError> {
        self.members
            .get_member(member_id)
            .await?
            .ok_or_else(|| AppError::NotFound(MEMBER_NOT_FOUND.to_string()))
    }

    async fn write_program(
        &self,
        member_id: &str,
        program: &Program,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), AppError> {
        if self.members.put_program(member_id, program, now).await? {
            Ok(())
        } else {
            // Deleted between our read and this write.
            Err(AppError::NotFound(MEMBER_NOT_FOUND.to_string()))
        }
    }

    /// Display name for log entries; falls back to the id for companies that
    /// no longer resolve.
    async fn company_name(&self, company_id: &str) -> Result<String, AppError> {
        Ok(self
            .companies
            .get_company(company_id)
            .await?
            .map(|c| c.name)
            .unwrap_or_else(|| company_id.to_string()))
    }
}

fn require_program<'a>(member: &'a Member, company_id: &str) -> Result<&'a Program, AppError> {
    member
        .programs
        .get(company_id)
        .ok_or_else(|| AppError::NotFound(PROGRAM_NOT_FOUND.to_string()))
}

/// A fresh member with one empty program per company.
pub fn new_member(name: &str, companies: &[Company]) -> Member {
    let now = clock::now();
    Member {
        id: uuid::Uuid::new_v4().to_string(),
        name: name.to_string(),
        programs: companies
            .iter()
            .map(|c| (c.id.clone(), Program::empty(&c.id, now, PROGRAM_CREATED)))
            .collect(),
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests;
