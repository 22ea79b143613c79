//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod budget;
pub mod category;
pub mod receipt;

pub use budget::{BudgetError, BudgetRepository};
pub use category::{CategoryError, CategoryRepository, CreateCategoryInput, UpdateCategoryInput};
pub use receipt::{
    CreateReceiptInput, ReceiptError, ReceiptFilter, ReceiptRepository, UpdateReceiptInput,
};
