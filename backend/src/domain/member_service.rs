use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::info;

use crate::domain::errors::{conflict_on_unique, DomainError, DomainResult};
use crate::storage::DbConnection;
use shared::{CreateMemberRequest, Member, UpdateMemberRequest};

/// Service for managing family members.
///
/// Every mutation recomputes the owning family's denormalized member count so
/// it always equals the number of stored members.
#[derive(Clone)]
pub struct MemberService {
    db: Arc<DbConnection>,
}

impl MemberService {
    pub fn new(db: Arc<DbConnection>) -> Self {
        Self { db }
    }

    /// Members of a family in registration order
    pub async fn list_members(&self, family_id: &str) -> DomainResult<Vec<Member>> {
        self.ensure_family_exists(family_id).await?;
        Ok(self.db.list_members(family_id).await?)
    }

    pub async fn create_member(
        &self,
        family_id: &str,
        request: CreateMemberRequest,
    ) -> DomainResult<Member> {
        self.ensure_family_exists(family_id).await?;

        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("Member name is required"));
        }
        validate_optional_date(&request.dob, "Invalid date of birth")?;
        validate_optional_date(&request.baptism_date, "Invalid baptism date")?;
        validate_optional_date(&request.communion_date, "Invalid communion date")?;
        validate_optional_date(&request.confirmation_date, "Invalid confirmation date")?;
        validate_optional_date(&request.marriage_date, "Invalid marriage date")?;

        info!("Creating member: family={}, name={}", family_id, name);

        let now = Utc::now().to_rfc3339();
        let member = Member {
            id: Member::generate_id(),
            family_id: family_id.to_string(),
            name,
            dob: request.dob,
            gender: request.gender,
            relationship: request.relationship,
            baptism_date: request.baptism_date,
            communion_date: request.communion_date,
            confirmation_date: request.confirmation_date,
            marriage_date: request.marriage_date,
            education: request.education,
            occupation: request.occupation,
            remarks: request.remarks,
            created_at: now.clone(),
            updated_at: now,
        };

        self.db.store_member(&member).await.map_err(|e| {
            conflict_on_unique(e, "A member with this name already exists in this family")
        })?;
        self.refresh_member_count(family_id).await?;

        Ok(member)
    }

    pub async fn update_member(
        &self,
        family_id: &str,
        member_id: &str,
        request: UpdateMemberRequest,
    ) -> DomainResult<Member> {
        self.ensure_family_exists(family_id).await?;

        let mut member = self
            .db
            .get_member(family_id, member_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Member not found"))?;

        if let Some(name) = request.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(DomainError::validation("Member name is required"));
            }
            member.name = name;
        }
        if let Some(dob) = request.dob {
            validate_date(&dob, "Invalid date of birth")?;
            member.dob = Some(dob);
        }
        if let Some(gender) = request.gender {
            member.gender = gender;
        }
        if let Some(relationship) = request.relationship {
            member.relationship = relationship;
        }
        if let Some(date) = request.baptism_date {
            validate_date(&date, "Invalid baptism date")?;
            member.baptism_date = Some(date);
        }
        if let Some(date) = request.communion_date {
            validate_date(&date, "Invalid communion date")?;
            member.communion_date = Some(date);
        }
        if let Some(date) = request.confirmation_date {
            validate_date(&date, "Invalid confirmation date")?;
            member.confirmation_date = Some(date);
        }
        if let Some(date) = request.marriage_date {
            validate_date(&date, "Invalid marriage date")?;
            member.marriage_date = Some(date);
        }
        if let Some(education) = request.education {
            member.education = Some(education);
        }
        if let Some(occupation) = request.occupation {
            member.occupation = Some(occupation);
        }
        if let Some(remarks) = request.remarks {
            member.remarks = Some(remarks);
        }
        member.updated_at = Utc::now().to_rfc3339();

        self.db.update_member(&member).await.map_err(|e| {
            conflict_on_unique(e, "A member with this name already exists in this family")
        })?;

        Ok(member)
    }

    pub async fn delete_member(&self, family_id: &str, member_id: &str) -> DomainResult<Member> {
        self.ensure_family_exists(family_id).await?;

        let member = self
            .db
            .get_member(family_id, member_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Member not found"))?;

        self.db.delete_member(family_id, member_id).await?;
        self.refresh_member_count(family_id).await?;

        info!("Deleted member: {} from family {}", member.name, family_id);
        Ok(member)
    }

    async fn ensure_family_exists(&self, family_id: &str) -> DomainResult<()> {
        self.db
            .get_family(family_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Family not found"))?;
        Ok(())
    }

    async fn refresh_member_count(&self, family_id: &str) -> DomainResult<()> {
        let count = self.db.count_members(family_id).await?;
        self.db.set_family_member_count(family_id, count).await?;
        Ok(())
    }
}

fn validate_date(value: &str, message: &str) -> DomainResult<()> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| DomainError::validation(message))
}

fn validate_optional_date(value: &Option<String>, message: &str) -> DomainResult<()> {
    match value {
        Some(v) => validate_date(v, message),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::family_service::FamilyService;
    use crate::domain::unit_service::UnitService;
    use crate::storage::DbConnection;
    use shared::{CreateFamilyRequest, CreateUnitRequest, Gender, Relationship};

    struct Fixture {
        members: MemberService,
        families: FamilyService,
        family_id: String,
    }

    async fn setup_test() -> Fixture {
        let db = Arc::new(DbConnection::init_test().await.expect("Failed to create test database"));
        let units = UnitService::new(db.clone());
        let families = FamilyService::new(db.clone(), None);
        let members = MemberService::new(db);

        let unit = units
            .create_unit(CreateUnitRequest {
                name: "ST MARY".to_string(),
                description: None,
            })
            .await
            .expect("Failed to create unit");
        let family = families
            .create_family(CreateFamilyRequest {
                unit_id: unit.id,
                card_no: "HC-001".to_string(),
                head_name: "Thomas Mathew".to_string(),
                address: None,
                phone: None,
                email: None,
                pincode: None,
            })
            .await
            .expect("Failed to create family");

        Fixture {
            members,
            families,
            family_id: family.family.id,
        }
    }

    fn create_request(name: &str) -> CreateMemberRequest {
        CreateMemberRequest {
            name: name.to_string(),
            dob: Some("1980-03-15".to_string()),
            gender: Gender::Male,
            relationship: Relationship::Head,
            baptism_date: Some("1980-04-01".to_string()),
            communion_date: None,
            confirmation_date: None,
            marriage_date: None,
            education: None,
            occupation: Some("Teacher".to_string()),
            remarks: None,
        }
    }

    #[tokio::test]
    async fn test_create_member_updates_family_count() {
        let fx = setup_test().await;

        fx.members
            .create_member(&fx.family_id, create_request("Thomas Mathew"))
            .await
            .expect("Failed to create member");

        let family = fx.families.get_family(&fx.family_id).await.unwrap();
        assert_eq!(family.family.member_count, 1);
    }

    #[tokio::test]
    async fn test_duplicate_member_name_is_conflict() {
        let fx = setup_test().await;

        fx.members
            .create_member(&fx.family_id, create_request("Thomas Mathew"))
            .await
            .unwrap();
        let result = fx
            .members
            .create_member(&fx.family_id, create_request("thomas mathew"))
            .await;
        assert!(matches!(result, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_member_validates_dates() {
        let fx = setup_test().await;

        let mut request = create_request("Thomas Mathew");
        request.dob = Some("15-03-1980".to_string());
        let result = fx.members.create_member(&fx.family_id, request).await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_member_for_missing_family() {
        let fx = setup_test().await;

        let result = fx
            .members
            .create_member("family::nonexistent", create_request("Thomas Mathew"))
            .await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_member_partial() {
        let fx = setup_test().await;

        let member = fx
            .members
            .create_member(&fx.family_id, create_request("Thomas Mathew"))
            .await
            .unwrap();

        let updated = fx
            .members
            .update_member(
                &fx.family_id,
                &member.id,
                UpdateMemberRequest {
                    occupation: Some("Farmer".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("Failed to update member");

        assert_eq!(updated.occupation.as_deref(), Some("Farmer"));
        // Untouched fields survive
        assert_eq!(updated.name, "Thomas Mathew");
        assert_eq!(updated.dob.as_deref(), Some("1980-03-15"));
    }

    #[tokio::test]
    async fn test_delete_member_recounts() {
        let fx = setup_test().await;

        let member = fx
            .members
            .create_member(&fx.family_id, create_request("Thomas Mathew"))
            .await
            .unwrap();
        fx.members
            .create_member(&fx.family_id, {
                let mut r = create_request("Annamma Thomas");
                r.gender = Gender::Female;
                r.relationship = Relationship::Wife;
                r
            })
            .await
            .unwrap();

        fx.members
            .delete_member(&fx.family_id, &member.id)
            .await
            .expect("Failed to delete member");

        let family = fx.families.get_family(&fx.family_id).await.unwrap();
        assert_eq!(family.family.member_count, 1);

        let remaining = fx.members.list_members(&fx.family_id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "Annamma Thomas");
    }

    #[tokio::test]
    async fn test_delete_nonexistent_member() {
        let fx = setup_test().await;

        let result = fx.members.delete_member(&fx.family_id, "member::nonexistent").await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }
}
