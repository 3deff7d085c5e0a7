//! Dashboard aggregates.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::clock;
use crate::db::{ChangeLogRepository, CompanyRepository, MemberRepository, Store};
use crate::errors::AppError;
use crate::models::DashboardStats;

#[derive(Clone)]
pub struct DashboardService {
    companies: Arc<dyn CompanyRepository>,
    members: Arc<dyn MemberRepository>,
    log: Arc<dyn ChangeLogRepository>,
}

impl DashboardService {
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

    pub fn from_store<S: Store>(store: Arc<S>) -> Self {
        Self::new(store.clone(), store.clone(), store)
    }

    pub async fn stats(&self) -> Result<DashboardStats, AppError> {
        self.stats_at(clock::now()).await
    }

    /// Stats with "recent" meaning the UTC day that contains `at`.
    pub async fn stats_at(&self, at: DateTime<Utc>) -> Result<DashboardStats, AppError> {
        let members = self.members.list_members().await?;
        let total_points = members
            .iter()
            .flat_map(|m| m.programs.values())
            .fold(0i64, |total, p| total.saturating_add(p.current_balance));

        let (day_start, day_end) = clock::utc_day_bounds(at);

        Ok(DashboardStats {
            total_members: members.len() as u64,
            total_companies: self.companies.count_companies().await?,
            total_points,
            recent_activity: self.log.count_between(day_start, day_end).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{ChangeLogEntry, ChangeType, LogSubject, ProgramUpdate};
    use crate::seed;
    use crate::tracking::ChangeTracker;

    #[tokio::test]
    async fn test_sums_balances_across_all_programs() {
        let store = Arc::new(MemoryStore::new());
        seed::ensure_default_companies(store.as_ref()).await.unwrap();
        let tracker = ChangeTracker::from_store(store.clone());
        let dashboard = DashboardService::from_store(store.clone());

        let ana = tracker.create_member("Ana").await.unwrap().member_id;
        let bia = tracker.create_member("Bia").await.unwrap().member_id;
        let balances = [(&ana, "latam", 25_000), (&ana, "azul", 300), (&bia, "smiles", 7)];
        for (member, company, balance) in balances {
            let update = ProgramUpdate {
                current_balance: Some(balance),
                ..Default::default()
            };
            tracker
                .apply_program_update(member, company, &update)
                .await
                .unwrap();
        }

        let stats = dashboard.stats().await.unwrap();
        assert_eq!(stats.total_members, 2);
        assert_eq!(stats.total_companies, 3);
        assert_eq!(stats.total_points, 25_307);
        // two creates + three balance updates, all today
        assert_eq!(stats.recent_activity, 5);
    }

    #[tokio::test]
    async fn test_total_points_saturates_instead_of_overflowing() {
        let store = Arc::new(MemoryStore::new());
        seed::ensure_default_companies(store.as_ref()).await.unwrap();
        let tracker = ChangeTracker::from_store(store.clone());
        let dashboard = DashboardService::from_store(store.clone());

        let ana = tracker.create_member("Ana").await.unwrap().member_id;
        let update = ProgramUpdate {
            current_balance: Some(i64::MAX),
            ..Default::default()
        };
        for company in ["latam", "smiles"] {
            tracker
                .apply_program_update(&ana, company, &update)
                .await
                .unwrap();
        }

        assert_eq!(dashboard.stats().await.unwrap().total_points, i64::MAX);
    }

    #[tokio::test]
    async fn test_recent_activity_uses_utc_day() {
        let store = Arc::new(MemoryStore::new());
        let dashboard = DashboardService::from_store(store.clone());
        let now = clock::now();
        for ts in [now, now - chrono::Duration::days(1), now - chrono::Duration::days(2)] {
            store
                .append(&ChangeLogEntry::new(
                    LogSubject::member("m", "Ana"),
                    ChangeType::Update,
                    "notes",
                    "",
                    "x",
                    ts,
                ))
                .await
                .unwrap();
        }

        assert_eq!(dashboard.stats_at(now).await.unwrap().recent_activity, 1);
        let yesterday = now - chrono::Duration::days(1);
        assert_eq!(dashboard.stats_at(yesterday).await.unwrap().recent_activity, 1);
    }
}
