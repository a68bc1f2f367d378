use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::domain::errors::{conflict_on_unique, DomainError, DomainResult};
use crate::domain::notification::{NotificationEvent, Notifier};
use crate::storage::DbConnection;
use shared::{
    CreateFamilyRequest, Family, FamilyListRequest, FamilyListResponse, FamilyWithUnit,
    PaginationMeta, UpdateFamilyRequest,
};

const DEFAULT_PAGE_SIZE: u32 = 50;

/// Service for managing family records.
///
/// Keeps the denormalized unit family counts in step with family CRUD and
/// emits a welcome notification when a family with an email is registered.
#[derive(Clone)]
pub struct FamilyService {
    db: Arc<DbConnection>,
    notifier: Option<Notifier>,
}

impl FamilyService {
    pub fn new(db: Arc<DbConnection>, notifier: Option<Notifier>) -> Self {
        Self { db, notifier }
    }

    /// Paginated listing with optional unit filter and search
    pub async fn list_families(&self, request: FamilyListRequest) -> DomainResult<FamilyListResponse> {
        let page = request.page.unwrap_or(1).max(1);
        let limit = request.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let offset = (page - 1) as i64 * limit as i64;

        let unit_filter = match request.unit_id.as_deref() {
            None | Some("all") | Some("") => String::new(),
            Some(id) => id.to_string(),
        };
        let search_pattern = match request.search.as_deref().map(str::trim) {
            None | Some("") => String::new(),
            Some(s) => format!("%{}%", s),
        };

        let families = self
            .db
            .list_families(&unit_filter, &search_pattern, limit as i64, offset)
            .await?;
        let total = self.db.count_families_filtered(&unit_filter, &search_pattern).await? as u64;

        Ok(FamilyListResponse {
            families,
            pagination: PaginationMeta::new(page, limit, total),
        })
    }

    pub async fn get_family(&self, family_id: &str) -> DomainResult<FamilyWithUnit> {
        self.db
            .get_family_with_unit(family_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Family not found"))
    }

    pub async fn create_family(&self, request: CreateFamilyRequest) -> DomainResult<FamilyWithUnit> {
        let card_no = normalize_card_no(&request.card_no)?;
        let head_name = required_trimmed(&request.head_name, "Head of family name is required")?;
        let email = normalize_email(request.email.as_deref())?;
        info!("Creating family: card_no={}, head={}", card_no, head_name);

        let unit = self
            .db
            .get_unit(&request.unit_id)
            .await?
            .ok_or_else(|| DomainError::validation("Invalid unit selected"))?;

        let now = Utc::now().to_rfc3339();
        let family = Family {
            id: Family::generate_id(),
            unit_id: unit.id.clone(),
            card_no,
            head_name,
            address: request.address.unwrap_or_default().trim().to_string(),
            phone: request.phone.unwrap_or_default().trim().to_string(),
            email,
            pincode: request.pincode.unwrap_or_default().trim().to_string(),
            member_count: 0,
            created_at: now.clone(),
            updated_at: now,
        };

        self.db
            .store_family(&family)
            .await
            .map_err(|e| conflict_on_unique(e, "Family card number already exists"))?;
        self.db.adjust_unit_family_count(&unit.id, 1).await?;

        info!("Created family: {} with ID: {}", family.card_no, family.id);

        if let (Some(notifier), Some(email)) = (&self.notifier, &family.email) {
            notifier.send(NotificationEvent::Welcome {
                email: email.clone(),
                head_name: family.head_name.clone(),
                card_no: family.card_no.clone(),
                unit_name: unit.name.clone(),
            });
        }

        Ok(FamilyWithUnit {
            family,
            unit_name: unit.name,
        })
    }

    pub async fn update_family(
        &self,
        family_id: &str,
        request: UpdateFamilyRequest,
    ) -> DomainResult<FamilyWithUnit> {
        info!("Updating family: {}", family_id);

        let mut family = self
            .db
            .get_family(family_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Family not found"))?;

        let unit = self
            .db
            .get_unit(&request.unit_id)
            .await?
            .ok_or_else(|| DomainError::validation("Invalid unit selected"))?;

        let old_unit_id = family.unit_id.clone();

        family.unit_id = unit.id.clone();
        family.card_no = normalize_card_no(&request.card_no)?;
        family.head_name = required_trimmed(&request.head_name, "Head of family name is required")?;
        family.address = request.address.unwrap_or_default().trim().to_string();
        family.phone = request.phone.unwrap_or_default().trim().to_string();
        family.email = normalize_email(request.email.as_deref())?;
        family.pincode = request.pincode.unwrap_or_default().trim().to_string();
        family.updated_at = Utc::now().to_rfc3339();

        self.db
            .update_family(&family)
            .await
            .map_err(|e| conflict_on_unique(e, "Family card number already exists"))?;

        // Moving between units shifts both denormalized counts
        if old_unit_id != family.unit_id {
            self.db.adjust_unit_family_count(&old_unit_id, -1).await?;
            self.db.adjust_unit_family_count(&family.unit_id, 1).await?;
        }

        Ok(FamilyWithUnit {
            family,
            unit_name: unit.name,
        })
    }

    /// Delete a family along with its members and payment records
    pub async fn delete_family(&self, family_id: &str) -> DomainResult<Family> {
        info!("Deleting family: {}", family_id);

        let family = self
            .db
            .get_family(family_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Family not found"))?;

        self.db.delete_members_for_family(family_id).await?;
        self.db.delete_payments_for_family(family_id).await?;
        self.db.delete_family(family_id).await?;
        self.db.adjust_unit_family_count(&family.unit_id, -1).await?;

        info!("Deleted family: {} with ID: {}", family.card_no, family.id);
        Ok(family)
    }
}

fn normalize_card_no(card_no: &str) -> DomainResult<String> {
    let card_no = card_no.trim().to_uppercase();
    if card_no.is_empty() {
        return Err(DomainError::validation("Family card number is required"));
    }
    Ok(card_no)
}

fn required_trimmed(value: &str, message: &str) -> DomainResult<String> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(DomainError::validation(message));
    }
    Ok(value)
}

fn normalize_email(email: Option<&str>) -> DomainResult<Option<String>> {
    match email.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => {
            let email = raw.to_lowercase();
            if !is_plausible_email(&email) {
                return Err(DomainError::validation("Please provide a valid email address"));
            }
            Ok(Some(email))
        }
    }
}

fn is_plausible_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !local.contains(char::is_whitespace)
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains(char::is_whitespace)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::unit_service::UnitService;
    use crate::storage::DbConnection;
    use shared::CreateUnitRequest;

    async fn setup_test() -> (FamilyService, UnitService) {
        let db = Arc::new(DbConnection::init_test().await.expect("Failed to create test database"));
        (FamilyService::new(db.clone(), None), UnitService::new(db))
    }

    async fn create_unit(units: &UnitService, name: &str) -> shared::Unit {
        units
            .create_unit(CreateUnitRequest {
                name: name.to_string(),
                description: None,
            })
            .await
            .expect("Failed to create unit")
    }

    fn create_request(unit_id: &str, card_no: &str, head_name: &str) -> CreateFamilyRequest {
        CreateFamilyRequest {
            unit_id: unit_id.to_string(),
            card_no: card_no.to_string(),
            head_name: head_name.to_string(),
            address: Some("Church Road".to_string()),
            phone: Some("9999999999".to_string()),
            email: None,
            pincode: Some("682001".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_family_normalizes_and_counts() {
        let (families, units) = setup_test().await;
        let unit = create_unit(&units, "ST MARY").await;

        let mut request = create_request(&unit.id, "hc-001", "Thomas Mathew");
        request.email = Some("Family@Example.COM".to_string());

        let created = families.create_family(request).await.expect("Failed to create family");
        assert_eq!(created.family.card_no, "HC-001");
        assert_eq!(created.family.email.as_deref(), Some("family@example.com"));
        assert_eq!(created.unit_name, "ST MARY");

        let unit = units.list_units().await.unwrap().remove(0);
        assert_eq!(unit.family_count, 1);
    }

    #[tokio::test]
    async fn test_create_family_requires_existing_unit() {
        let (families, _units) = setup_test().await;

        let result = families
            .create_family(create_request("unit::nonexistent", "HC-001", "Thomas Mathew"))
            .await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_family_rejects_bad_email() {
        let (families, units) = setup_test().await;
        let unit = create_unit(&units, "ST MARY").await;

        let mut request = create_request(&unit.id, "HC-001", "Thomas Mathew");
        request.email = Some("not-an-address".to_string());
        let result = families.create_family(request).await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_duplicate_card_no_is_conflict() {
        let (families, units) = setup_test().await;
        let unit = create_unit(&units, "ST MARY").await;

        families
            .create_family(create_request(&unit.id, "HC-001", "Thomas Mathew"))
            .await
            .expect("First create");
        let result = families
            .create_family(create_request(&unit.id, "hc-001", "Another Family"))
            .await;
        assert!(matches!(result, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_list_families_search_and_pagination() {
        let (families, units) = setup_test().await;
        let unit = create_unit(&units, "ST MARY").await;

        for (card, head) in [("HC-001", "Thomas Mathew"), ("HC-002", "Varghese Kurian"), ("HC-003", "Antony Joseph")] {
            families.create_family(create_request(&unit.id, card, head)).await.unwrap();
        }

        let all = families
            .list_families(FamilyListRequest {
                unit_id: None,
                search: None,
                page: None,
                limit: None,
            })
            .await
            .unwrap();
        assert_eq!(all.families.len(), 3);
        assert_eq!(all.pagination.total, 3);
        assert_eq!(all.families[0].family.head_name, "Antony Joseph");

        let searched = families
            .list_families(FamilyListRequest {
                unit_id: None,
                search: Some("kurian".to_string()),
                page: None,
                limit: None,
            })
            .await
            .unwrap();
        assert_eq!(searched.families.len(), 1);
        assert_eq!(searched.families[0].family.card_no, "HC-002");

        let page2 = families
            .list_families(FamilyListRequest {
                unit_id: None,
                search: None,
                page: Some(2),
                limit: Some(2),
            })
            .await
            .unwrap();
        assert_eq!(page2.families.len(), 1);
        assert_eq!(page2.pagination.pages, 2);
    }

    #[tokio::test]
    async fn test_update_family_moves_unit_counts() {
        let (families, units) = setup_test().await;
        let unit_a = create_unit(&units, "ST MARY").await;
        let unit_b = create_unit(&units, "ST GEORGE").await;

        let created = families
            .create_family(create_request(&unit_a.id, "HC-001", "Thomas Mathew"))
            .await
            .unwrap();

        let updated = families
            .update_family(
                &created.family.id,
                UpdateFamilyRequest {
                    unit_id: unit_b.id.clone(),
                    card_no: "HC-001".to_string(),
                    head_name: "Thomas Mathew".to_string(),
                    address: None,
                    phone: None,
                    email: None,
                    pincode: None,
                },
            )
            .await
            .expect("Failed to update family");
        assert_eq!(updated.unit_name, "ST GEORGE");

        let listed = units.list_units().await.unwrap();
        let st_george = listed.iter().find(|u| u.name == "ST GEORGE").unwrap();
        let st_mary = listed.iter().find(|u| u.name == "ST MARY").unwrap();
        assert_eq!(st_george.family_count, 1);
        assert_eq!(st_mary.family_count, 0);
    }

    #[tokio::test]
    async fn test_delete_family_updates_unit_count() {
        let (families, units) = setup_test().await;
        let unit = create_unit(&units, "ST MARY").await;

        let created = families
            .create_family(create_request(&unit.id, "HC-001", "Thomas Mathew"))
            .await
            .unwrap();
        let deleted = families.delete_family(&created.family.id).await.expect("Failed to delete");
        assert_eq!(deleted.id, created.family.id);

        let unit = units.list_units().await.unwrap().remove(0);
        assert_eq!(unit.family_count, 0);
        let result = families.get_family(&created.family.id).await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_nonexistent_family() {
        let (families, _units) = setup_test().await;

        let result = families.get_family("family::nonexistent").await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }
}
