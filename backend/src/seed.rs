//! Startup data: the default loyalty companies and the family members.
//!
//! Idempotent. Seeding writes no change-log entries.

use crate::db::{CompanyRepository, MemberRepository};
use crate::errors::AppError;
use crate::models::Company;
use crate::tracking::new_member;

/// `(id, name, color, points_name)`
const DEFAULT_COMPANIES: [(&str, &str, &str, &str); 3] = [
    ("latam", "LATAM Pass", "#d31b2c", "milhas"),
    ("smiles", "Smiles", "#ff6600", "milhas"),
    ("azul", "TudoAzul", "#0072ce", "pontos"),
];

/// Inserts any default company that is missing. Returns how many were added.
pub async fn ensure_default_companies(
    companies: &dyn CompanyRepository,
) -> Result<usize, AppError> {
    let mut added = 0;
    for (id, name, color, points_name) in DEFAULT_COMPANIES {
        if companies.get_company(id).await?.is_some() {
            continue;
        }
        companies
            .insert_company(&Company {
                id: id.to_string(),
                name: name.to_string(),
                color: color.to_string(),
                points_name: points_name.to_string(),
            })
            .await?;
        added += 1;
    }
    Ok(added)
}

/// Creates each named member that does not exist yet, with one empty program
/// per company. Returns how many were added.
pub async fn ensure_members(
    companies: &dyn CompanyRepository,
    members: &dyn MemberRepository,
    names: &[String],
) -> Result<usize, AppError> {
    let all_companies = companies.list_companies().await?;
    let mut added = 0;
    for name in names {
        if members.find_member_by_name(name).await?.is_some() {
            continue;
        }
        members
            .insert_member(&new_member(name, &all_companies))
            .await?;
        added += 1;
    }
    Ok(added)
}
