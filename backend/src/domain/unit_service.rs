use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::domain::errors::{conflict_on_unique, DomainError, DomainResult};
use crate::storage::DbConnection;
use shared::{CreateUnitRequest, Unit, UpdateUnitRequest};

/// Service for managing organizational units
#[derive(Clone)]
pub struct UnitService {
    db: Arc<DbConnection>,
}

impl UnitService {
    pub fn new(db: Arc<DbConnection>) -> Self {
        Self { db }
    }

    /// All units ordered by name
    pub async fn list_units(&self) -> DomainResult<Vec<Unit>> {
        Ok(self.db.list_units().await?)
    }

    /// Create a unit. Names are stored trimmed and upper-cased; duplicates
    /// are rejected.
    pub async fn create_unit(&self, request: CreateUnitRequest) -> DomainResult<Unit> {
        let name = normalize_name(&request.name)?;
        info!("Creating unit: {}", name);

        let now = Utc::now().to_rfc3339();
        let unit = Unit {
            id: Unit::generate_id(),
            name,
            description: request.description.unwrap_or_default().trim().to_string(),
            family_count: 0,
            created_at: now.clone(),
            updated_at: now,
        };

        self.db
            .store_unit(&unit)
            .await
            .map_err(|e| conflict_on_unique(e, "Unit name already exists"))?;

        info!("Created unit: {} with ID: {}", unit.name, unit.id);
        Ok(unit)
    }

    pub async fn update_unit(&self, unit_id: &str, request: UpdateUnitRequest) -> DomainResult<Unit> {
        info!("Updating unit: {}", unit_id);

        let mut unit = self
            .db
            .get_unit(unit_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Unit not found"))?;

        unit.name = normalize_name(&request.name)?;
        unit.description = request.description.unwrap_or_default().trim().to_string();
        unit.updated_at = Utc::now().to_rfc3339();

        self.db
            .update_unit(&unit)
            .await
            .map_err(|e| conflict_on_unique(e, "Unit name already exists"))?;

        Ok(unit)
    }

    /// Delete a unit. Refused while any family still references it.
    pub async fn delete_unit(&self, unit_id: &str) -> DomainResult<Unit> {
        info!("Deleting unit: {}", unit_id);

        let unit = self
            .db
            .get_unit(unit_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Unit not found"))?;

        let family_count = self.db.count_families_in_unit(unit_id).await?;
        if family_count > 0 {
            return Err(DomainError::validation(
                "Cannot delete unit with existing families",
            ));
        }

        self.db.delete_unit(unit_id).await?;
        info!("Deleted unit: {} with ID: {}", unit.name, unit.id);
        Ok(unit)
    }
}

fn normalize_name(name: &str) -> DomainResult<String> {
    let name = name.trim().to_uppercase();
    if name.is_empty() {
        return Err(DomainError::validation("Unit name is required"));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DbConnection;

    async fn setup_test() -> UnitService {
        let db = Arc::new(DbConnection::init_test().await.expect("Failed to create test database"));
        UnitService::new(db)
    }

    fn create_request(name: &str) -> CreateUnitRequest {
        CreateUnitRequest {
            name: name.to_string(),
            description: Some("North zone".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_unit_normalizes_name() {
        let service = setup_test().await;

        let unit = service
            .create_unit(create_request("  st mary  "))
            .await
            .expect("Failed to create unit");
        assert_eq!(unit.name, "ST MARY");
        assert_eq!(unit.family_count, 0);
    }

    #[tokio::test]
    async fn test_create_unit_rejects_empty_name() {
        let service = setup_test().await;

        let result = service.create_unit(create_request("   ")).await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_duplicate_unit_is_conflict() {
        let service = setup_test().await;

        service.create_unit(create_request("ST MARY")).await.expect("First create");
        // Different casing normalizes to the same stored name
        let result = service.create_unit(create_request("st mary")).await;
        assert!(matches!(result, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_list_units_sorted_by_name() {
        let service = setup_test().await;

        service.create_unit(create_request("ST MARY")).await.unwrap();
        service.create_unit(create_request("ST GEORGE")).await.unwrap();

        let units = service.list_units().await.expect("Failed to list units");
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].name, "ST GEORGE");
        assert_eq!(units[1].name, "ST MARY");
    }

    #[tokio::test]
    async fn test_update_unit() {
        let service = setup_test().await;

        let unit = service.create_unit(create_request("ST MARY")).await.unwrap();
        let updated = service
            .update_unit(
                &unit.id,
                UpdateUnitRequest {
                    name: "st mary major".to_string(),
                    description: Some("Renamed".to_string()),
                },
            )
            .await
            .expect("Failed to update unit");

        assert_eq!(updated.name, "ST MARY MAJOR");
        assert_eq!(updated.description, "Renamed");
        assert_eq!(updated.created_at, unit.created_at);
    }

    #[tokio::test]
    async fn test_update_nonexistent_unit() {
        let service = setup_test().await;

        let result = service
            .update_unit(
                "unit::nonexistent",
                UpdateUnitRequest {
                    name: "X".to_string(),
                    description: None,
                },
            )
            .await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_unit() {
        let service = setup_test().await;

        let unit = service.create_unit(create_request("ST MARY")).await.unwrap();
        let deleted = service.delete_unit(&unit.id).await.expect("Failed to delete unit");
        assert_eq!(deleted.id, unit.id);

        let units = service.list_units().await.unwrap();
        assert!(units.is_empty());
    }

    #[tokio::test]
    async fn test_delete_nonexistent_unit() {
        let service = setup_test().await;

        let result = service.delete_unit("unit::nonexistent").await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }
}
