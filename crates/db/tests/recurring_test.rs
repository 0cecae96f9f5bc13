//! Recurring generation against a real database.

mod common;

use rust_decimal_macros::dec;

use common::{Ledger, date};
use kontor_core::ledger::JournalLineInput;
use kontor_core::recurring::{RecurringError, Schedule};
use kontor_db::entities::sea_orm_active_enums::JournalStatus;
use kontor_db::repositories::{
    CreateTemplateInput, JournalFilter, JournalRepository, RecurringRepository,
};
use kontor_shared::types::{PageRequest, TemplateId};

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_generate_once_per_period() {
    let ledger = Ledger::new().await;
    let repo = RecurringRepository::new(ledger.db.clone());

    let template = repo
        .create_template(
            ledger.tenant_id,
            ledger.maker,
            CreateTemplateInput {
                name: "Monthly rent".into(),
                schedule: Schedule::Monthly,
                lines: vec![
                    JournalLineInput::debit(ledger.expense, dec!(1500.00)),
                    JournalLineInput::credit(ledger.payable, dec!(1500.00)),
                ],
            },
        )
        .await
        .unwrap();
    let template_id = TemplateId::from_uuid(template.id);

    let generated = repo
        .generate(ledger.tenant_id, ledger.maker, template_id, ledger.period_id())
        .await
        .unwrap();
    assert_eq!(generated.journal.status, JournalStatus::Draft);
    assert_eq!(generated.journal.journal_date, date(2025, 1, 1));
    assert_eq!(generated.journal.source_template_id, Some(template.id));
    assert_eq!(generated.lines[0].debit, dec!(1500.00));

    let again = repo
        .generate(ledger.tenant_id, ledger.maker, template_id, ledger.period_id())
        .await;
    assert!(matches!(again, Err(RecurringError::AlreadyGenerated { .. })));

    let (journals, total) = JournalRepository::new(ledger.db.clone())
        .list(
            ledger.tenant_id,
            &JournalFilter {
                status: None,
                period_id: Some(ledger.period_id()),
            },
            &PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(journals[0].id, generated.journal.id);

    let stored = repo.get_template(ledger.tenant_id, template_id).await.unwrap();
    assert_eq!(stored.last_generated_period_id, Some(ledger.period.period.id));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_generation_yields_one_journal() {
    let ledger = Ledger::new().await;
    let repo = RecurringRepository::new(ledger.db.clone());
    let template = repo
        .create_template(
            ledger.tenant_id,
            ledger.maker,
            CreateTemplateInput {
                name: "Depreciation".into(),
                schedule: Schedule::Monthly,
                lines: vec![
                    JournalLineInput::debit(ledger.expense, dec!(80)),
                    JournalLineInput::credit(ledger.suspense, dec!(80)),
                ],
            },
        )
        .await
        .unwrap();
    let template_id = TemplateId::from_uuid(template.id);

    let (a, b) = tokio::join!(
        repo.generate(ledger.tenant_id, ledger.maker, template_id, ledger.period_id()),
        repo.generate(ledger.tenant_id, ledger.maker, template_id, ledger.period_id()),
    );
    assert_eq!(u8::from(a.is_ok()) + u8::from(b.is_ok()), 1);
    let failure = a.err().or(b.err()).unwrap();
    assert!(matches!(failure, RecurringError::AlreadyGenerated { .. }));
}
