//! Audit trail persistence against a real database.

mod common;

use rust_decimal_macros::dec;
use serde_json::json;

use common::{Ledger, date};
use kontor_core::audit::{AuditAction, AuditRecord};
use kontor_core::ledger::JournalLineInput;
use kontor_db::AuditRepository;
use kontor_db::entities::sea_orm_active_enums::AuditOutcome;
use kontor_db::repositories::{JournalInput, JournalRepository, PeriodRepository};
use kontor_shared::AppError;
use kontor_shared::types::JournalId;

async fn submitted(ledger: &Ledger, repo: &JournalRepository) -> JournalId {
    let created = repo
        .create(
            ledger.tenant_id,
            ledger.controller,
            JournalInput {
                journal_date: date(2025, 1, 20),
                description: Some("Consulting accrual".into()),
                lines: vec![
                    JournalLineInput::debit(ledger.expense, dec!(75.00)),
                    JournalLineInput::credit(ledger.payable, dec!(75.00)),
                ],
            },
        )
        .await
        .unwrap();
    let id = JournalId::from_uuid(created.journal.id);
    repo.submit(ledger.tenant_id, ledger.maker, id).await.unwrap();
    id
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_refused_approve_leaves_failure_record() {
    let ledger = Ledger::new().await;
    let journals = JournalRepository::new(ledger.db.clone());
    let audit = AuditRepository::new(ledger.db.clone());
    let id = submitted(&ledger, &journals).await;

    let result = journals
        .approve(ledger.tenant_id, ledger.controller, id)
        .await
        .map_err(AppError::from);
    assert!(result.is_err());
    audit
        .record(
            AuditRecord::new(
                ledger.tenant_id,
                ledger.controller,
                AuditAction::JournalApprove,
                id.into_inner(),
            )
            .finish(&result),
        )
        .await;

    let trail = audit
        .list_for_entity(ledger.tenant_id, id.into_inner())
        .await
        .unwrap();
    assert_eq!(trail.len(), 1);
    let record = &trail[0];
    assert_eq!(record.action, "journal.approve");
    assert_eq!(record.actor_id, ledger.controller.into_inner());
    assert_eq!(record.outcome, AuditOutcome::Failure);
    assert_eq!(record.error_code.as_deref(), Some("SOD_VIOLATION"));
    assert!(record.detail.as_ref().is_some_and(|d| d.get("error").is_some()));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_trail_keeps_success_and_failure_in_order() {
    let ledger = Ledger::new().await;
    let journals = JournalRepository::new(ledger.db.clone());
    let audit = AuditRepository::new(ledger.db.clone());
    let id = submitted(&ledger, &journals).await;

    let approved = journals
        .approve(ledger.tenant_id, ledger.checker, id)
        .await
        .map_err(AppError::from);
    audit
        .record(
            AuditRecord::new(
                ledger.tenant_id,
                ledger.checker,
                AuditAction::JournalApprove,
                id.into_inner(),
            )
            .finish(&approved),
        )
        .await;

    ledger.complete_checklist().await;
    PeriodRepository::new(ledger.db.clone())
        .close(ledger.tenant_id, ledger.maker, ledger.period_id(), true)
        .await
        .unwrap();

    let posted = journals
        .post(ledger.tenant_id, ledger.checker, id)
        .await
        .map_err(AppError::from);
    audit
        .record(
            AuditRecord::new(
                ledger.tenant_id,
                ledger.checker,
                AuditAction::JournalPost,
                id.into_inner(),
            )
            .with_detail(json!({ "attempt": 1 }))
            .finish(&posted),
        )
        .await;

    let trail = audit
        .list_for_entity(ledger.tenant_id, id.into_inner())
        .await
        .unwrap();
    let summary: Vec<_> = trail
        .iter()
        .map(|r| (r.action.as_str(), r.outcome, r.error_code.as_deref()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("journal.approve", AuditOutcome::Success, None),
            ("journal.post", AuditOutcome::Failure, Some("PERIOD_CLOSED")),
        ]
    );
    let detail = trail[1].detail.as_ref().unwrap();
    assert_eq!(detail["attempt"], 1);
    assert!(detail["error"].is_string());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_trail_is_tenant_scoped() {
    let ledger = Ledger::new().await;
    let other = Ledger::new().await;
    let audit = AuditRepository::new(ledger.db.clone());
    let entity = uuid::Uuid::now_v7();

    audit
        .record(AuditRecord::new(
            ledger.tenant_id,
            ledger.maker,
            AuditAction::PeriodClose,
            entity,
        ))
        .await;

    assert_eq!(
        audit.list_for_entity(ledger.tenant_id, entity).await.unwrap().len(),
        1
    );
    assert!(
        audit
            .list_for_entity(other.tenant_id, entity)
            .await
            .unwrap()
            .is_empty()
    );
}
