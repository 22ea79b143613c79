//! `SeaORM` active enum definitions.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether a receipt is a personal or a shared household expense.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "expense_type")]
#[serde(rename_all = "snake_case")]
pub enum ExpenseType {
    /// Personal expense.
    #[sea_orm(string_value = "personal")]
    Personal,
    /// Shared household expense.
    #[sea_orm(string_value = "household")]
    Household,
}
