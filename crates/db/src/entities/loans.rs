//! `SeaORM` Entity for loans table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "loans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub persona_id: Uuid,
    pub creditor_id: Option<Uuid>,
    pub label: String,
    pub description: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub principal: Decimal,
    #[sea_orm(column_type = "Decimal(Some((6, 2)))")]
    pub annual_rate: Decimal,
    pub installment_count: i32,
    pub start_date: Date,
    pub currency: String,
    pub display_currency: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::personas::Entity",
        from = "Column::PersonaId",
        to = "super::personas::Column::Id"
    )]
    Personas,
    #[sea_orm(
        belongs_to = "super::creditors::Entity",
        from = "Column::CreditorId",
        to = "super::creditors::Column::Id"
    )]
    Creditors,
    #[sea_orm(has_many = "super::installments::Entity")]
    Installments,
}

impl Related<super::personas::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Personas.def()
    }
}

impl Related<super::creditors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creditors.def()
    }
}

impl Related<super::installments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Installments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
