//! `SeaORM` entity definitions.

pub mod alerts;
pub mod creditors;
pub mod exchange_rates;
pub mod history;
pub mod installments;
pub mod loans;
pub mod personas;
pub mod sea_orm_active_enums;
