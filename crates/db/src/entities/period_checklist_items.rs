//! `SeaORM` Entity for period_checklist_items table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "period_checklist_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub period_id: Uuid,
    pub code: String,
    pub label: String,
    pub completed_by: Option<Uuid>,
    pub completed_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounting_periods::Entity",
        from = "Column::PeriodId",
        to = "super::accounting_periods::Column::Id"
    )]
    AccountingPeriods,
}

impl Related<super::accounting_periods::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccountingPeriods.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
