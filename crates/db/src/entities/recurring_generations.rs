//! `SeaORM` Entity for recurring_generations table.
//!
//! One row per (template, period); the unique index is the idempotency guard.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recurring_generations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub template_id: Uuid,
    pub period_id: Uuid,
    pub journal_id: Uuid,
    pub generated_by: Uuid,
    pub generated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::recurring_templates::Entity",
        from = "Column::TemplateId",
        to = "super::recurring_templates::Column::Id"
    )]
    RecurringTemplates,
}

impl Related<super::recurring_templates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecurringTemplates.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
