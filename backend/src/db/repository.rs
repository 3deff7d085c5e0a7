//! Repository interfaces, one per collection.
//!
//! The change-tracking engine and the HTTP handlers only see these traits, so
//! the SQLite store and the in-memory store are interchangeable.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::AppError;
use crate::models::{ChangeLogEntry, Company, Member, PostIt, Program};

pub type RepoResult<T> = Result<T, AppError>;

#[async_trait]
pub trait CompanyRepository: Send + Sync {
    /// All companies in insertion order.
    async fn list_companies(&self) -> RepoResult<Vec<Company>>;
    async fn get_company(&self, id: &str) -> RepoResult<Option<Company>>;
    /// Exact, case-sensitive name lookup.
    async fn find_company_by_name(&self, name: &str) -> RepoResult<Option<Company>>;
    async fn insert_company(&self, company: &Company) -> RepoResult<()>;
    /// Replaces name, color and unit. Returns false when the id is unknown.
    async fn update_company(&self, company: &Company) -> RepoResult<bool>;
    async fn count_companies(&self) -> RepoResult<u64>;
}

#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// All members, oldest first.
    async fn list_members(&self) -> RepoResult<Vec<Member>>;
    async fn get_member(&self, id: &str) -> RepoResult<Option<Member>>;
    /// Exact, case-sensitive name lookup.
    async fn find_member_by_name(&self, name: &str) -> RepoResult<Option<Member>>;
    /// Fails with `Conflict` when the name is taken.
    async fn insert_member(&self, member: &Member) -> RepoResult<()>;
    /// Writes `program` under its own `company_id` key and bumps the member's
    /// `updated_at`, as one atomic document update. Returns false when the
    /// member does not exist.
    async fn put_program(
        &self,
        member_id: &str,
        program: &Program,
        updated_at: DateTime<Utc>,
    ) -> RepoResult<bool>;
    /// Drops one program key. Returns false when the member does not exist.
    async fn remove_program(
        &self,
        member_id: &str,
        company_id: &str,
        updated_at: DateTime<Utc>,
    ) -> RepoResult<bool>;
    /// Returns false when the member does not exist.
    async fn delete_member(&self, id: &str) -> RepoResult<bool>;
    async fn count_members(&self) -> RepoResult<u64>;
}

#[async_trait]
pub trait ChangeLogRepository: Send + Sync {
    async fn append(&self, entry: &ChangeLogEntry) -> RepoResult<()>;
    /// Most recent first.
    async fn recent(&self, limit: u32) -> RepoResult<Vec<ChangeLogEntry>>;
    /// Most recent first, restricted to one member id.
    async fn for_member(&self, member_id: &str, limit: u32) -> RepoResult<Vec<ChangeLogEntry>>;
    /// Entries with `start <= timestamp < end`.
    async fn count_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> RepoResult<u64>;
}

#[async_trait]
pub trait PostItRepository: Send + Sync {
    /// Most recently updated first.
    async fn list_postits(&self) -> RepoResult<Vec<PostIt>>;
    async fn get_postit(&self, id: &str) -> RepoResult<Option<PostIt>>;
    async fn insert_postit(&self, postit: &PostIt) -> RepoResult<()>;
    /// Returns the updated note, or None when the id is unknown.
    async fn update_postit(
        &self,
        id: &str,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> RepoResult<Option<PostIt>>;
    async fn delete_postit(&self, id: &str) -> RepoResult<bool>;
}

/// A document store holding all four collections.
pub trait Store:
    CompanyRepository + MemberRepository + ChangeLogRepository + PostItRepository + 'static
{
}

impl<T> Store for T where
    T: CompanyRepository + MemberRepository + ChangeLogRepository + PostItRepository + 'static
{
}

/// Message used for duplicate member names, shared by the engine pre-check
/// and the stores' unique-constraint backstop.
pub fn duplicate_member_message(name: &str) -> String {
    format!("Membro com nome '{}' já existe", name)
}
