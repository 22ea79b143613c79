//! Category repository for household-scoped category operations.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::categories;

/// Error types for category operations.
#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    /// Category not found in this household.
    #[error("Category not found: {0}")]
    NotFound(Uuid),

    /// Slug already taken within the household (active or inactive).
    #[error("Category with slug '{0}' already exists")]
    DuplicateSlug(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryInput {
    /// Household scope.
    pub household_id: Uuid,
    /// Display name.
    pub name: String,
    /// Unique-per-household slug.
    pub slug: String,
    /// Optional icon.
    pub icon: Option<String>,
    /// UI ordering.
    pub sort_order: i32,
}

/// Input for updating a category.
#[derive(Debug, Clone, Default)]
pub struct UpdateCategoryInput {
    /// New display name.
    pub name: Option<String>,
    /// New slug.
    pub slug: Option<String>,
    /// New icon.
    pub icon: Option<String>,
    /// New active flag.
    pub is_active: Option<bool>,
    /// New sort order.
    pub sort_order: Option<i32>,
}

/// Category repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    db: DatabaseConnection,
}

impl CategoryRepository {
    /// Creates a new category repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists a household's categories ordered by sort order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        household_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<categories::Model>, CategoryError> {
        let mut query =
            categories::Entity::find().filter(categories::Column::HouseholdId.eq(household_id));

        if !include_inactive {
            query = query.filter(categories::Column::IsActive.eq(true));
        }

        Ok(query
            .order_by_asc(categories::Column::SortOrder)
            .all(&self.db)
            .await?)
    }

    /// Finds a category by ID within a household.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        id: Uuid,
        household_id: Uuid,
    ) -> Result<Option<categories::Model>, CategoryError> {
        Ok(categories::Entity::find_by_id(id)
            .filter(categories::Column::HouseholdId.eq(household_id))
            .one(&self.db)
            .await?)
    }

    /// Finds several categories by ID within a household.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_ids(
        &self,
        household_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<categories::Model>, CategoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Ok(categories::Entity::find()
            .filter(categories::Column::HouseholdId.eq(household_id))
            .filter(categories::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await?)
    }

    /// Creates a new category.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::DuplicateSlug` when the slug is already
    /// taken within the household, active or not.
    pub async fn create(
        &self,
        input: CreateCategoryInput,
    ) -> Result<categories::Model, CategoryError> {
        self.ensure_slug_free(input.household_id, &input.slug).await?;

        let category = categories::ActiveModel {
            id: Set(Uuid::new_v4()),
            household_id: Set(input.household_id),
            name: Set(input.name),
            slug: Set(input.slug),
            icon: Set(input.icon),
            is_active: Set(true),
            sort_order: Set(input.sort_order),
            created_at: Set(Utc::now().into()),
        };

        Ok(category.insert(&self.db).await?)
    }

    /// Updates a category's fields.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::NotFound` when the category does not exist
    /// in this household, `CategoryError::DuplicateSlug` when a slug change
    /// collides.
    pub async fn update(
        &self,
        id: Uuid,
        household_id: Uuid,
        input: UpdateCategoryInput,
    ) -> Result<categories::Model, CategoryError> {
        let existing = self
            .find_by_id(id, household_id)
            .await?
            .ok_or(CategoryError::NotFound(id))?;

        if let Some(slug) = &input.slug
            && slug != &existing.slug
        {
            self.ensure_slug_free(household_id, slug).await?;
        }

        let mut category: categories::ActiveModel = existing.into();
        if let Some(name) = input.name {
            category.name = Set(name);
        }
        if let Some(slug) = input.slug {
            category.slug = Set(slug);
        }
        if let Some(icon) = input.icon {
            category.icon = Set(Some(icon));
        }
        if let Some(is_active) = input.is_active {
            category.is_active = Set(is_active);
        }
        if let Some(sort_order) = input.sort_order {
            category.sort_order = Set(sort_order);
        }

        Ok(category.update(&self.db).await?)
    }

    /// Soft-deletes a category (sets `is_active = false`).
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::NotFound` when the category does not exist
    /// in this household.
    pub async fn soft_delete(&self, id: Uuid, household_id: Uuid) -> Result<(), CategoryError> {
        let existing = self
            .find_by_id(id, household_id)
            .await?
            .ok_or(CategoryError::NotFound(id))?;

        let mut category: categories::ActiveModel = existing.into();
        category.is_active = Set(false);
        category.update(&self.db).await?;

        Ok(())
    }

    /// Fails when the slug is taken by any category (active or inactive)
    /// within the household.
    async fn ensure_slug_free(&self, household_id: Uuid, slug: &str) -> Result<(), CategoryError> {
        let existing = categories::Entity::find()
            .filter(categories::Column::HouseholdId.eq(household_id))
            .filter(categories::Column::Slug.eq(slug))
            .one(&self.db)
            .await?;

        if existing.is_some() {
            return Err(CategoryError::DuplicateSlug(slug.to_string()));
        }

        Ok(())
    }
}
