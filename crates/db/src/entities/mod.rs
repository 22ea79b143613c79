//! `SeaORM` entity definitions.

pub mod budgets;
pub mod categories;
pub mod households;
pub mod receipts;
pub mod sea_orm_active_enums;
pub mod users;
