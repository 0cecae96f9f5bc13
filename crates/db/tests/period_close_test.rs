//! Period close, lock and reopen against a real database.

mod common;

use common::{Ledger, date};
use kontor_core::period::PeriodError;
use kontor_db::entities::sea_orm_active_enums::PeriodStatus;
use kontor_db::repositories::{CreatePeriodInput, PeriodRepository};

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_close_waits_for_checklist() {
    let ledger = Ledger::new().await;
    let repo = PeriodRepository::new(ledger.db.clone());

    let refused = repo
        .close(ledger.tenant_id, ledger.maker, ledger.period_id(), true)
        .await;
    match refused {
        Err(PeriodError::ChecklistIncomplete { outstanding }) => {
            assert_eq!(outstanding.len(), ledger.period.checklist.len());
        }
        other => panic!("expected ChecklistIncomplete, got {other:?}"),
    }

    ledger.complete_checklist().await;
    let closed = repo
        .close(ledger.tenant_id, ledger.maker, ledger.period_id(), true)
        .await
        .unwrap();
    assert_eq!(closed.period.status, PeriodStatus::Closed);
    assert_eq!(closed.period.closed_by, Some(ledger.maker.into_inner()));

    let again = repo
        .close(ledger.tenant_id, ledger.maker, ledger.period_id(), true)
        .await
        .unwrap();
    assert_eq!(again.period.status, PeriodStatus::Closed);
    assert_eq!(again.period.closed_at, closed.period.closed_at);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_complete_item_is_idempotent() {
    let ledger = Ledger::new().await;
    let repo = PeriodRepository::new(ledger.db.clone());
    let code = ledger.period.checklist[0].code.clone();

    let first = repo
        .complete_checklist_item(ledger.tenant_id, ledger.maker, ledger.period_id(), &code)
        .await
        .unwrap();
    let second = repo
        .complete_checklist_item(ledger.tenant_id, ledger.maker, ledger.period_id(), &code)
        .await
        .unwrap();
    assert!(first.completed_at.is_some());
    assert_eq!(first.completed_at, second.completed_at);

    let unknown = repo
        .complete_checklist_item(ledger.tenant_id, ledger.maker, ledger.period_id(), "NOPE")
        .await;
    assert!(matches!(unknown, Err(PeriodError::UnknownChecklistItem(_))));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_lock_and_reopen() {
    let ledger = Ledger::new().await;
    let repo = PeriodRepository::new(ledger.db.clone());

    let early = repo
        .lock(ledger.tenant_id, ledger.maker, ledger.period_id())
        .await;
    assert!(matches!(early, Err(PeriodError::InvalidTransition { .. })));

    ledger.complete_checklist().await;
    repo.close(ledger.tenant_id, ledger.maker, ledger.period_id(), true)
        .await
        .unwrap();
    let locked = repo
        .lock(ledger.tenant_id, ledger.maker, ledger.period_id())
        .await
        .unwrap();
    assert_eq!(locked.period.status, PeriodStatus::Locked);

    let denied = repo
        .reopen(ledger.tenant_id, ledger.maker, ledger.period_id())
        .await;
    assert!(matches!(denied, Err(PeriodError::Policy(_))));

    let reopened = repo
        .reopen(ledger.tenant_id, ledger.controller, ledger.period_id())
        .await
        .unwrap();
    assert_eq!(reopened.period.status, PeriodStatus::Open);
    assert_eq!(reopened.period.reopened_by, Some(ledger.controller.into_inner()));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_new_periods_must_be_contiguous() {
    let ledger = Ledger::new().await;
    let repo = PeriodRepository::new(ledger.db.clone());

    let overlapping = repo
        .create(
            ledger.tenant_id,
            ledger.maker,
            CreatePeriodInput {
                name: None,
                start_date: date(2025, 1, 15),
                end_date: date(2025, 2, 14),
            },
        )
        .await;
    assert!(matches!(overlapping, Err(PeriodError::Overlaps(_))));

    let gap = repo
        .create(
            ledger.tenant_id,
            ledger.maker,
            CreatePeriodInput {
                name: None,
                start_date: date(2025, 3, 1),
                end_date: date(2025, 3, 31),
            },
        )
        .await;
    assert!(matches!(gap, Err(PeriodError::NotContiguous { .. })));

    let february = repo
        .create(
            ledger.tenant_id,
            ledger.maker,
            CreatePeriodInput {
                name: None,
                start_date: date(2025, 2, 1),
                end_date: date(2025, 2, 28),
            },
        )
        .await
        .unwrap();
    assert_eq!(february.period.name, "2025-02-01 to 2025-02-28");
    assert_eq!(february.checklist.len(), ledger.period.checklist.len());

    let periods = repo.list(ledger.tenant_id).await.unwrap();
    assert_eq!(periods.len(), 2);
}
