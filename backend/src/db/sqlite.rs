//! SQLite document store.
//!
//! Each collection is one table. Member programs live in a JSON column and
//! are written with `json_set` / `json_remove`, so a program update is a
//! single statement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::collections::BTreeMap;

use super::repository::{
    duplicate_member_message, ChangeLogRepository, CompanyRepository, MemberRepository,
    PostItRepository, RepoResult,
};
use super::{decode_ts, encode_ts};
use crate::errors::AppError;
use crate::models::{ChangeLogEntry, ChangeType, Company, Member, PostIt, Program};

/// SQLite-backed store for all collections.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// JSON path addressing one program inside the `programs` document.
fn program_path(company_id: &str) -> String {
    format!("$.\"{}\"", company_id.replace('"', "\\\""))
}

#[async_trait]
impl CompanyRepository for SqliteStore {
    async fn list_companies(&self) -> RepoResult<Vec<Company>> {
        let rows = sqlx::query("SELECT id, name, color, points_name FROM companies ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(company_from_row).collect())
    }

    async fn get_company(&self, id: &str) -> RepoResult<Option<Company>> {
        let row = sqlx::query("SELECT id, name, color, points_name FROM companies WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(company_from_row))
    }

    async fn find_company_by_name(&self, name: &str) -> RepoResult<Option<Company>> {
        let row = sqlx::query(
            "SELECT id, name, color, points_name FROM companies WHERE name = ? ORDER BY rowid LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(company_from_row))
    }

    async fn insert_company(&self, company: &Company) -> RepoResult<()> {
        sqlx::query("INSERT INTO companies (id, name, color, points_name) VALUES (?, ?, ?, ?)")
            .bind(&company.id)
            .bind(&company.name)
            .bind(&company.color)
            .bind(&company.points_name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_company(&self, company: &Company) -> RepoResult<bool> {
        let result =
            sqlx::query("UPDATE companies SET name = ?, color = ?, points_name = ? WHERE id = ?")
                .bind(&company.name)
                .bind(&company.color)
                .bind(&company.points_name)
                .bind(&company.id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_companies(&self) -> RepoResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM companies")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("n") as u64)
    }
}

#[async_trait]
impl MemberRepository for SqliteStore {
    async fn list_members(&self) -> RepoResult<Vec<Member>> {
        let rows = sqlx::query(
            "SELECT id, name, programs, created_at, updated_at FROM members ORDER BY created_at, rowid",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(member_from_row).collect()
    }

    async fn get_member(&self, id: &str) -> RepoResult<Option<Member>> {
        let row = sqlx::query(
            "SELECT id, name, programs, created_at, updated_at FROM members WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(member_from_row).transpose()
    }

    async fn find_member_by_name(&self, name: &str) -> RepoResult<Option<Member>> {
        let row = sqlx::query(
            "SELECT id, name, programs, created_at, updated_at FROM members WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(member_from_row).transpose()
    }

    async fn insert_member(&self, member: &Member) -> RepoResult<()> {
        let programs_json = encode_document(&member.programs)?;

        let result = sqlx::query(
            "INSERT INTO members (id, name, programs, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&member.id)
        .bind(&member.name)
        .bind(&programs_json)
        .bind(encode_ts(&member.created_at))
        .bind(encode_ts(&member.updated_at))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(AppError::Conflict(duplicate_member_message(&member.name)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn put_program(
        &self,
        member_id: &str,
        program: &Program,
        updated_at: DateTime<Utc>,
    ) -> RepoResult<bool> {
        let program_json = encode_document(program)?;

        let result = sqlx::query(
            "UPDATE members SET programs = json_set(programs, ?, json(?)), updated_at = ? WHERE id = ?",
        )
        .bind(program_path(&program.company_id))
        .bind(&program_json)
        .bind(encode_ts(&updated_at))
        .bind(member_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_program(
        &self,
        member_id: &str,
        company_id: &str,
        updated_at: DateTime<Utc>,
    ) -> RepoResult<bool> {
        let result = sqlx::query(
            "UPDATE members SET programs = json_remove(programs, ?), updated_at = ? WHERE id = ?",
        )
        .bind(program_path(company_id))
        .bind(encode_ts(&updated_at))
        .bind(member_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_member(&self, id: &str) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM members WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_members(&self) -> RepoResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM members")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("n") as u64)
    }
}

#[async_trait]
impl ChangeLogRepository for SqliteStore {
    async fn append(&self, entry: &ChangeLogEntry) -> RepoResult<()> {
        sqlx::query(
            r#"INSERT INTO global_log (id, member_id, member_name, company_id, company_name,
                                       field_changed, old_value, new_value, timestamp, change_type)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&entry.id)
        .bind(&entry.member_id)
        .bind(&entry.member_name)
        .bind(&entry.company_id)
        .bind(&entry.company_name)
        .bind(&entry.field_changed)
        .bind(&entry.old_value)
        .bind(&entry.new_value)
        .bind(encode_ts(&entry.timestamp))
        .bind(entry.change_type.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn recent(&self, limit: u32) -> RepoResult<Vec<ChangeLogEntry>> {
        let rows = sqlx::query(
            r#"SELECT id, member_id, member_name, company_id, company_name, field_changed,
                      old_value, new_value, timestamp, change_type
               FROM global_log ORDER BY timestamp DESC, rowid DESC LIMIT ?"#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(entry_from_row).collect()
    }

    async fn for_member(&self, member_id: &str, limit: u32) -> RepoResult<Vec<ChangeLogEntry>> {
        let rows = sqlx::query(
            r#"SELECT id, member_id, member_name, company_id, company_name, field_changed,
                      old_value, new_value, timestamp, change_type
               FROM global_log WHERE member_id = ?
               ORDER BY timestamp DESC, rowid DESC LIMIT ?"#,
        )
        .bind(member_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(entry_from_row).collect()
    }

    async fn count_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> RepoResult<u64> {
        let row =
            sqlx::query("SELECT COUNT(*) AS n FROM global_log WHERE timestamp >= ? AND timestamp < ?")
                .bind(encode_ts(&start))
                .bind(encode_ts(&end))
                .fetch_one(&self.pool)
                .await?;
        Ok(row.get::<i64, _>("n") as u64)
    }
}

#[async_trait]
impl PostItRepository for SqliteStore {
    async fn list_postits(&self) -> RepoResult<Vec<PostIt>> {
        let rows = sqlx::query(
            "SELECT id, content, created_at, updated_at FROM postits ORDER BY updated_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(postit_from_row).collect()
    }

    async fn get_postit(&self, id: &str) -> RepoResult<Option<PostIt>> {
        let row = sqlx::query("SELECT id, content, created_at, updated_at FROM postits WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(postit_from_row).transpose()
    }

    async fn insert_postit(&self, postit: &PostIt) -> RepoResult<()> {
        sqlx::query("INSERT INTO postits (id, content, created_at, updated_at) VALUES (?, ?, ?, ?)")
            .bind(&postit.id)
            .bind(&postit.content)
            .bind(encode_ts(&postit.created_at))
            .bind(encode_ts(&postit.updated_at))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_postit(
        &self,
        id: &str,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> RepoResult<Option<PostIt>> {
        let result = sqlx::query("UPDATE postits SET content = ?, updated_at = ? WHERE id = ?")
            .bind(content)
            .bind(encode_ts(&updated_at))
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_postit(id).await
    }

    async fn delete_postit(&self, id: &str) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM postits WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// Helper functions for row conversion

fn company_from_row(row: &SqliteRow) -> Company {
    Company {
        id: row.get("id"),
        name: row.get("name"),
        color: row.get("color"),
        points_name: row.get("points_name"),
    }
}

fn encode_document<T: serde::Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string(value)
        .map_err(|e| AppError::Internal(format!("Falha ao serializar documento: {}", e)))
}

fn member_from_row(row: &SqliteRow) -> Result<Member, AppError> {
    let programs_str: String = row.get("programs");
    let programs: BTreeMap<String, Program> = serde_json::from_str(&programs_str)
        .map_err(|e| AppError::Database(format!("Documento de programas inválido: {}", e)))?;
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Member {
        id: row.get("id"),
        name: row.get("name"),
        programs,
        created_at: decode_ts(&created_at)?,
        updated_at: decode_ts(&updated_at)?,
    })
}

fn entry_from_row(row: &SqliteRow) -> Result<ChangeLogEntry, AppError> {
    let timestamp: String = row.get("timestamp");
    let change_type_str: String = row.get("change_type");
    let change_type = ChangeType::parse(&change_type_str).ok_or_else(|| {
        AppError::Database(format!("Tipo de alteração desconhecido: {}", change_type_str))
    })?;

    Ok(ChangeLogEntry {
        id: row.get("id"),
        member_id: row.get("member_id"),
        member_name: row.get("member_name"),
        company_id: row.get("company_id"),
        company_name: row.get("company_name"),
        field_changed: row.get("field_changed"),
        old_value: row.get("old_value"),
        new_value: row.get("new_value"),
        timestamp: decode_ts(&timestamp)?,
        change_type,
    })
}

fn postit_from_row(row: &SqliteRow) -> Result<PostIt, AppError> {
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");
    Ok(PostIt {
        id: row.get("id"),
        content: row.get("content"),
        created_at: decode_ts(&created_at)?,
        updated_at: decode_ts(&updated_at)?,
    })
}
