//! In-memory document store.
//!
//! Same contract as the SQLite store, held in process memory. Each write
//! takes the collection's write lock once, which gives the same
//! single-document atomicity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::repository::{
    duplicate_member_message, ChangeLogRepository, CompanyRepository, MemberRepository,
    PostItRepository, RepoResult,
};
use crate::errors::AppError;
use crate::models::{ChangeLogEntry, Company, Member, PostIt, Program};

#[derive(Default)]
pub struct MemoryStore {
    companies: RwLock<Vec<Company>>,
    members: RwLock<Vec<Member>>,
    log: RwLock<Vec<ChangeLogEntry>>,
    postits: RwLock<Vec<PostIt>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CompanyRepository for MemoryStore {
    async fn list_companies(&self) -> RepoResult<Vec<Company>> {
        Ok(self.companies.read().await.clone())
    }

    async fn get_company(&self, id: &str) -> RepoResult<Option<Company>> {
        Ok(self.companies.read().await.iter().find(|c| c.id == id).cloned())
    }

    async fn find_company_by_name(&self, name: &str) -> RepoResult<Option<Company>> {
        Ok(self
            .companies
            .read()
            .await
            .iter()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn insert_company(&self, company: &Company) -> RepoResult<()> {
        let mut companies = self.companies.write().await;
        if companies.iter().any(|c| c.id == company.id) {
            return Err(AppError::Database(format!(
                "Empresa {} já cadastrada",
                company.id
            )));
        }
        companies.push(company.clone());
        Ok(())
    }

    async fn update_company(&self, company: &Company) -> RepoResult<bool> {
        let mut companies = self.companies.write().await;
        match companies.iter_mut().find(|c| c.id == company.id) {
            Some(existing) => {
                *existing = company.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count_companies(&self) -> RepoResult<u64> {
        Ok(self.companies.read().await.len() as u64)
    }
}

#[async_trait]
impl MemberRepository for MemoryStore {
    async fn list_members(&self) -> RepoResult<Vec<Member>> {
        Ok(self.members.read().await.clone())
    }

    async fn get_member(&self, id: &str) -> RepoResult<Option<Member>> {
        Ok(self.members.read().await.iter().find(|m| m.id == id).cloned())
    }

    async fn find_member_by_name(&self, name: &str) -> RepoResult<Option<Member>> {
        Ok(self
            .members
            .read()
            .await
            .iter()
            .find(|m| m.name == name)
            .cloned())
    }

    async fn insert_member(&self, member: &Member) -> RepoResult<()> {
        let mut members = self.members.write().await;
        if members.iter().any(|m| m.name == member.name) {
            return Err(AppError::Conflict(duplicate_member_message(&member.name)));
        }
        members.push(member.clone());
        Ok(())
    }

    async fn put_program(
        &self,
        member_id: &str,
        program: &Program,
        updated_at: DateTime<Utc>,
    ) -> RepoResult<bool> {
        let mut members = self.members.write().await;
        let Some(member) = members.iter_mut().find(|m| m.id == member_id) else {
            return Ok(false);
        };
        member
            .programs
            .insert(program.company_id.clone(), program.clone());
        member.updated_at = updated_at;
        Ok(true)
    }

    async fn remove_program(
        &self,
        member_id: &str,
        company_id: &str,
        updated_at: DateTime<Utc>,
    ) -> RepoResult<bool> {
        let mut members = self.members.write().await;
        let Some(member) = members.iter_mut().find(|m| m.id == member_id) else {
            return Ok(false);
        };
        member.programs.remove(company_id);
        member.updated_at = updated_at;
        Ok(true)
    }

    async fn delete_member(&self, id: &str) -> RepoResult<bool> {
        let mut members = self.members.write().await;
        let before = members.len();
        members.retain(|m| m.id != id);
        Ok(members.len() < before)
    }

    async fn count_members(&self) -> RepoResult<u64> {
        Ok(self.members.read().await.len() as u64)
    }
}

#[async_trait]
impl ChangeLogRepository for MemoryStore {
    async fn append(&self, entry: &ChangeLogEntry) -> RepoResult<()> {
        self.log.write().await.push(entry.clone());
        Ok(())
    }

    async fn recent(&self, limit: u32) -> RepoResult<Vec<ChangeLogEntry>> {
        Ok(newest_first(self.log.read().await.iter(), limit))
    }

    async fn for_member(&self, member_id: &str, limit: u32) -> RepoResult<Vec<ChangeLogEntry>> {
        let log = self.log.read().await;
        Ok(newest_first(
            log.iter().filter(|e| e.member_id == member_id),
            limit,
        ))
    }

    async fn count_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> RepoResult<u64> {
        Ok(self
            .log
            .read()
            .await
            .iter()
            .filter(|e| e.timestamp >= start && e.timestamp < end)
            .count() as u64)
    }
}

/// Newest first; ties keep reverse insertion order, like the SQLite rowid
/// tiebreak.
fn newest_first<'a>(
    entries: impl DoubleEndedIterator<Item = &'a ChangeLogEntry>,
    limit: u32,
) -> Vec<ChangeLogEntry> {
    let mut out: Vec<ChangeLogEntry> = entries.rev().cloned().collect();
    out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    out.truncate(limit as usize);
    out
}

#[async_trait]
impl PostItRepository for MemoryStore {
    async fn list_postits(&self) -> RepoResult<Vec<PostIt>> {
        let mut postits: Vec<PostIt> = self.postits.read().await.iter().rev().cloned().collect();
        postits.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(postits)
    }

    async fn get_postit(&self, id: &str) -> RepoResult<Option<PostIt>> {
        Ok(self.postits.read().await.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_postit(&self, postit: &PostIt) -> RepoResult<()> {
        self.postits.write().await.push(postit.clone());
        Ok(())
    }

    async fn update_postit(
        &self,
        id: &str,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> RepoResult<Option<PostIt>> {
        let mut postits = self.postits.write().await;
        Ok(postits.iter_mut().find(|p| p.id == id).map(|postit| {
            postit.content = content.to_string();
            postit.updated_at = updated_at;
            postit.clone()
        }))
    }

    async fn delete_postit(&self, id: &str) -> RepoResult<bool> {
        let mut postits = self.postits.write().await;
        let before = postits.len();
        postits.retain(|p| p.id != id);
        Ok(postits.len() < before)
    }
}
