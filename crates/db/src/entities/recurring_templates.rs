//! `SeaORM` Entity for recurring_templates table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::RecurringSchedule;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recurring_templates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub schedule: RecurringSchedule,
    /// Line template as a JSON array of journal lines.
    pub lines: Json,
    pub is_active: bool,
    pub last_generated_period_id: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::recurring_generations::Entity")]
    RecurringGenerations,
}

impl Related<super::recurring_generations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecurringGenerations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
