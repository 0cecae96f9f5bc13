//! `SeaORM` Entity for accounting_periods table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::PeriodStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounting_periods")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub start_date: Date,
    pub end_date: Date,
    pub status: PeriodStatus,
    pub closed_by: Option<Uuid>,
    pub closed_at: Option<DateTimeWithTimeZone>,
    pub locked_by: Option<Uuid>,
    pub locked_at: Option<DateTimeWithTimeZone>,
    pub reopened_by: Option<Uuid>,
    pub reopened_at: Option<DateTimeWithTimeZone>,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::period_checklist_items::Entity")]
    PeriodChecklistItems,
    #[sea_orm(has_many = "super::journals::Entity")]
    Journals,
}

impl Related<super::period_checklist_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PeriodChecklistItems.def()
    }
}

impl Related<super::journals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Journals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
