//! Engine tests against the in-memory store.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::*;
use crate::db::{ChangeLogRepository, MemoryStore};
use crate::seed;

struct Harness {
    store: Arc<MemoryStore>,
    tracker: ChangeTracker,
}

impl Harness {
    async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        seed::ensure_default_companies(store.as_ref())
            .await
            .expect("seed companies");
        let tracker = ChangeTracker::from_store(store.clone());
        Self { store, tracker }
    }

    async fn member(&self, name: &str) -> String {
        self.tracker.create_member(name).await.unwrap().member_id
    }

    async fn log_len(&self) -> usize {
        self.store.recent(u32::MAX).await.unwrap().len()
    }

    async fn program(&self, member_id: &str, company_id: &str) -> Program {
        self.store.get_member(member_id).await.unwrap().unwrap().programs[company_id].clone()
    }
}

fn balance(n: i64) -> ProgramUpdate {
    ProgramUpdate {
        current_balance: Some(n),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_create_member_seeds_one_program_per_company() {
    let h = Harness::new().await;
    let id = h.member("Ana").await;

    let member = h.store.get_member(&id).await.unwrap().unwrap();
    assert_eq!(
        member.programs.keys().collect::<Vec<_>>(),
        vec!["azul", "latam", "smiles"]
    );
    for (key, program) in &member.programs {
        assert_eq!(&program.company_id, key);
        assert_eq!(program.current_balance, 0);
        assert!(program.custom_fields.is_empty());
    }

    let log = h.store.recent(10).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].change_type, ChangeType::Create);
    assert_eq!(log[0].field_changed, vocab::FIELD_MEMBER);
    assert_eq!(log[0].new_value, vocab::CREATED);
}

#[tokio::test]
async fn test_duplicate_member_is_conflict_without_side_effects() {
    let h = Harness::new().await;
    h.member("Ana").await;
    let log_before = h.log_len().await;

    let err = h.tracker.create_member("Ana").await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(ref msg) if msg.contains("já existe")));
    assert_eq!(h.store.count_members().await.unwrap(), 1);
    assert_eq!(h.log_len().await, log_before);

    // Case-sensitive: a different spelling is a different member.
    h.member("ana").await;
    assert_eq!(h.store.count_members().await.unwrap(), 2);
}

#[tokio::test]
async fn test_blank_member_name_is_rejected() {
    let h = Harness::new().await;
    let err = h.tracker.create_member("   ").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_update_logs_one_entry_per_changed_field() {
    let h = Harness::new().await;
    let id = h.member("Ana").await;
    let before = h.program(&id, "latam").await;
    let log_before = h.log_len().await;

    let update = ProgramUpdate {
        login: Some("ana@latam.com".to_string()),
        current_balance: Some(25_000),
        // Unchanged: stays out of the diff.
        notes: Some(String::new()),
        ..Default::default()
    };
    let outcome = h
        .tracker
        .apply_program_update(&id, "latam", &update)
        .await
        .unwrap();

    assert_eq!(
        outcome.changes,
        vec!["login:  → ana@latam.com", "current_balance: 0 → 25000"]
    );
    assert_eq!(h.log_len().await, log_before + 2);

    let after = h.program(&id, "latam").await;
    assert_eq!(after.login, "ana@latam.com");
    assert_eq!(after.current_balance, 25_000);
    assert!(after.last_updated > before.last_updated);
    assert_eq!(after.last_change, outcome.changes.join("; "));

    let entries = h.store.for_member(&id, 2).await.unwrap();
    let balance_entry = entries
        .iter()
        .find(|e| e.field_changed == "current_balance")
        .unwrap();
    assert_eq!(balance_entry.old_value, "0");
    assert_eq!(balance_entry.new_value, "25000");
    assert_eq!(balance_entry.company_name, "LATAM Pass");
    assert_eq!(balance_entry.change_type, ChangeType::Update);
}

#[tokio::test]
async fn test_same_value_update_is_a_silent_noop() {
    let h = Harness::new().await;
    let id = h.member("Ana").await;
    let before = h.program(&id, "smiles").await;
    let log_before = h.log_len().await;

    let outcome = h
        .tracker
        .apply_program_update(&id, "smiles", &balance(0))
        .await
        .unwrap();

    assert!(outcome.changes.is_empty());
    assert_eq!(h.log_len().await, log_before);
    assert_eq!(h.program(&id, "smiles").await, before);
}

#[tokio::test]
async fn test_repeated_update_is_idempotent() {
    let h = Harness::new().await;
    let id = h.member("Ana").await;
    let update = ProgramUpdate {
        elite_tier: Some("Gold".to_string()),
        card_number: Some("1234".to_string()),
        ..Default::default()
    };

    let first = h
        .tracker
        .apply_program_update(&id, "azul", &update)
        .await
        .unwrap();
    let after_first = h.log_len().await;
    let second = h
        .tracker
        .apply_program_update(&id, "azul", &update)
        .await
        .unwrap();

    assert_eq!(first.changes.len(), 2);
    assert!(second.changes.is_empty());
    assert_eq!(h.log_len().await, after_first);
}

#[tokio::test]
async fn test_consecutive_updates_get_strictly_newer_stamps() {
    let h = Harness::new().await;
    let id = h.member("Ana").await;

    let mut last = h.program(&id, "latam").await.last_updated;
    for n in 1..=5 {
        let outcome = h
            .tracker
            .apply_program_update(&id, "latam", &balance(n))
            .await
            .unwrap();
        assert!(outcome.program.last_updated > last);
        last = outcome.program.last_updated;
    }
}

#[tokio::test]
async fn test_update_unknown_member_or_program_is_not_found() {
    let h = Harness::new().await;
    let id = h.member("Ana").await;

    let err = h
        .tracker
        .apply_program_update("missing", "latam", &balance(1))
        .await
        .unwrap_err();
    assert_eq!(err, AppError::NotFound(MEMBER_NOT_FOUND.to_string()));

    let err = h
        .tracker
        .apply_program_update(&id, "gol", &balance(1))
        .await
        .unwrap_err();
    assert_eq!(err, AppError::NotFound(PROGRAM_NOT_FOUND.to_string()));
}

#[tokio::test]
async fn test_custom_fields_full_replace_with_single_log_entry() {
    let h = Harness::new().await;
    let id = h.member("Ana").await;

    let first: BTreeMap<String, Option<String>> = [
        ("seat".to_string(), Some("Aisle".to_string())),
        ("meal".to_string(), Some("Vegetarian".to_string())),
    ]
    .into_iter()
    .collect();
    h.tracker
        .apply_custom_fields(&id, "smiles", first)
        .await
        .unwrap();

    let log_before = h.log_len().await;
    let second: BTreeMap<String, Option<String>> = [
        ("seat".to_string(), Some("Window".to_string())),
        ("meal".to_string(), None),
    ]
    .into_iter()
    .collect();
    let program = h
        .tracker
        .apply_custom_fields(&id, "smiles", second)
        .await
        .unwrap();

    let expected: BTreeMap<String, String> = [("seat".to_string(), "Window".to_string())]
        .into_iter()
        .collect();
    assert_eq!(program.custom_fields, expected);
    assert_eq!(program.last_change, CUSTOM_FIELDS_UPDATED);
    assert_eq!(h.program(&id, "smiles").await.custom_fields, expected);

    assert_eq!(h.log_len().await, log_before + 1);
    let entry = &h.store.recent(1).await.unwrap()[0];
    assert_eq!(entry.field_changed, vocab::FIELD_CUSTOM_FIELDS);
    assert_eq!(entry.old_value, r#"{"meal":"Vegetarian","seat":"Aisle"}"#);
    assert_eq!(entry.new_value, r#"{"seat":"Window"}"#);
}

#[tokio::test]
async fn test_delete_custom_field() {
    let h = Harness::new().await;
    let id = h.member("Ana").await;
    let fields: BTreeMap<String, Option<String>> = [
        ("keep".to_string(), Some("1".to_string())),
        ("drop".to_string(), Some("2".to_string())),
    ]
    .into_iter()
    .collect();
    h.tracker
        .apply_custom_fields(&id, "azul", fields)
        .await
        .unwrap();

    let program = h
        .tracker
        .delete_custom_field(&id, "azul", "drop")
        .await
        .unwrap();
    assert_eq!(program.custom_fields.keys().collect::<Vec<_>>(), vec!["keep"]);

    let entry = &h.store.recent(1).await.unwrap()[0];
    assert_eq!(entry.change_type, ChangeType::Delete);
    assert_eq!(entry.field_changed, "drop");
    assert_eq!(entry.old_value, "2");

    let err = h
        .tracker
        .delete_custom_field(&id, "azul", "drop")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_add_program_reuses_company_by_exact_name() {
    let h = Harness::new().await;
    let ana = h.member("Ana").await;
    let bia = h.member("Bia").await;

    let first = h
        .tracker
        .add_program(&ana, "Livelo", Some("#e6007e"))
        .await
        .unwrap();
    let second = h.tracker.add_program(&bia, "Livelo", None).await.unwrap();
    assert_eq!(first.company_id, second.company_id);
    assert_eq!(h.store.count_companies().await.unwrap(), 4);

    let program = h.program(&ana, &first.company_id).await;
    assert_eq!(program.company_id, first.company_id);
    assert_eq!(program.last_change, PROGRAM_CREATED);

    let entry = &h.store.recent(1).await.unwrap()[0];
    assert_eq!(entry.change_type, ChangeType::Create);
    assert_eq!(entry.field_changed, vocab::FIELD_PROGRAM);
    assert_eq!(entry.new_value, vocab::ADDED);

    // Same name, different case: a new company.
    let other = h.tracker.add_program(&ana, "livelo", None).await.unwrap();
    assert_ne!(other.company_id, first.company_id);

    let err = h
        .tracker
        .add_program(&ana, "Livelo", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_add_program_resolves_member_before_validating_name() {
    let h = Harness::new().await;

    let err = h.tracker.add_program("ghost", "  ", None).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let ana = h.member("Ana").await;
    let err = h.tracker.add_program(&ana, "  ", None).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(h.store.count_companies().await.unwrap(), 3);
}

#[tokio::test]
async fn test_delete_program() {
    let h = Harness::new().await;
    let id = h.member("Ana").await;

    h.tracker.delete_program(&id, "azul").await.unwrap();
    let member = h.store.get_member(&id).await.unwrap().unwrap();
    assert!(!member.programs.contains_key("azul"));

    let entry = &h.store.recent(1).await.unwrap()[0];
    assert_eq!(entry.change_type, ChangeType::Update);
    assert_eq!(entry.old_value, "TudoAzul");
    assert_eq!(entry.new_value, vocab::REMOVED);

    let err = h.tracker.delete_program(&id, "azul").await.unwrap_err();
    assert_eq!(err, AppError::NotFound(PROGRAM_NOT_FOUND.to_string()));
}

#[tokio::test]
async fn test_delete_member_retains_history() {
    let h = Harness::new().await;
    let id = h.member("Ana").await;
    h.tracker
        .apply_program_update(&id, "latam", &balance(10))
        .await
        .unwrap();

    let deleted = h.tracker.delete_member(&id).await.unwrap();
    assert_eq!(deleted.member_name, "Ana");
    assert!(h.store.get_member(&id).await.unwrap().is_none());

    let history = h.store.for_member(&id, 10).await.unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].change_type, ChangeType::Delete);
    assert_eq!(history[0].old_value, vocab::ACTIVE);
    assert_eq!(history[0].new_value, vocab::DELETED);
}

#[tokio::test]
async fn test_delete_unknown_member_leaves_log_untouched() {
    let h = Harness::new().await;
    h.member("Ana").await;
    let log_before = h.log_len().await;

    let err = h.tracker.delete_member("missing").await.unwrap_err();
    assert_eq!(err, AppError::NotFound(MEMBER_NOT_FOUND.to_string()));
    assert_eq!(h.log_len().await, log_before);
}

#[tokio::test]
async fn test_rename_company_keeps_names_unique() {
    let h = Harness::new().await;

    let renamed = h
        .tracker
        .update_company(
            "azul",
            &UpdateCompanyRequest {
                name: Some("Azul Fidelidade".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Azul Fidelidade");
    assert_eq!(renamed.points_name, "pontos");

    let err = h
        .tracker
        .update_company(
            "azul",
            &UpdateCompanyRequest {
                name: Some("Smiles".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[test]
fn test_diff_ignores_absent_fields() {
    let program = Program::empty("latam", crate::clock::now(), "");
    assert!(diff_program(&program, &ProgramUpdate::default()).is_empty());

    let changes = diff_program(
        &program,
        &ProgramUpdate {
            cpf: Some("123".to_string()),
            ..Default::default()
        },
    );
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].describe(), "cpf:  → 123");
}
