use chrono::{DateTime, Utc};
use common::{BusinessId, ImageId, Outcome, UserId, optional_text};
use serde::{Deserialize, Serialize};

use crate::entity::{DomainEvent, DomainEvents, EntityMeta, impl_aggregate_root};
use crate::value_objects::{BusinessLocation, ContactInformation, GeoCoordinate};

use super::{BusinessCategory, BusinessError, BusinessProfile, BusinessStatus, Service};

/// Events recorded by the business aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BusinessDomainEvent {
    Created {
        business_id: BusinessId,
        owner_id: UserId,
        occurred_at: DateTime<Utc>,
    },
    StatusChanged {
        business_id: BusinessId,
        status: BusinessStatus,
        occurred_at: DateTime<Utc>,
    },
    Verified {
        business_id: BusinessId,
        occurred_at: DateTime<Utc>,
    },
    ImageRemoved {
        business_id: BusinessId,
        image_id: ImageId,
        blob_name: String,
        occurred_at: DateTime<Utc>,
    },
}

impl DomainEvent for BusinessDomainEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BusinessDomainEvent::Created { .. } => "BusinessCreated",
            BusinessDomainEvent::StatusChanged { .. } => "BusinessStatusChanged",
            BusinessDomainEvent::Verified { .. } => "BusinessVerified",
            BusinessDomainEvent::ImageRemoved { .. } => "BusinessImageRemoved",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            BusinessDomainEvent::Created { occurred_at, .. }
            | BusinessDomainEvent::StatusChanged { occurred_at, .. }
            | BusinessDomainEvent::Verified { occurred_at, .. }
            | BusinessDomainEvent::ImageRemoved { occurred_at, .. } => *occurred_at,
        }
    }
}

/// A gallery image. At most one image of a business is primary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessImage {
    pub id: ImageId,
    pub original_url: String,
    pub blob_name: String,
    pub alt_text: Option<String>,
    pub is_primary: bool,
    pub display_order: u32,
    pub uploaded_at: DateTime<Utc>,
}

/// Business listing aggregate root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Business {
    id: BusinessId,
    owner_id: UserId,
    profile: BusinessProfile,
    location: BusinessLocation,
    contact_info: ContactInformation,
    category: BusinessCategory,
    status: BusinessStatus,
    is_verified: bool,
    verified_at: Option<DateTime<Utc>>,
    services: Vec<Service>,
    images: Vec<BusinessImage>,
    meta: EntityMeta,
    #[serde(skip)]
    events: DomainEvents<BusinessDomainEvent>,
}

impl_aggregate_root!(Business, BusinessId, BusinessDomainEvent, "Business");

// Query methods
impl Business {
    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    pub fn profile(&self) -> &BusinessProfile {
        &self.profile
    }

    pub fn location(&self) -> &BusinessLocation {
        &self.location
    }

    pub fn contact_info(&self) -> &ContactInformation {
        &self.contact_info
    }

    pub fn category(&self) -> BusinessCategory {
        self.category
    }

    pub fn status(&self) -> BusinessStatus {
        self.status
    }

    pub fn is_verified(&self) -> bool {
        self.is_verified
    }

    pub fn verified_at(&self) -> Option<DateTime<Utc>> {
        self.verified_at
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn images(&self) -> &[BusinessImage] {
        &self.images
    }

    pub fn primary_image(&self) -> Option<&BusinessImage> {
        self.images.iter().find(|image| image.is_primary)
    }

    pub fn distance_to(&self, point: &GeoCoordinate) -> Option<f64> {
        self.location.distance_to(point)
    }
}

// Command methods
impl Business {
    /// Registers a business awaiting approval.
    pub fn create(
        profile: BusinessProfile,
        location: BusinessLocation,
        contact_info: ContactInformation,
        category: BusinessCategory,
        owner_id: UserId,
        now: DateTime<Utc>,
    ) -> Outcome<Self> {
        if owner_id.is_nil() {
            return Err(BusinessError::OwnerRequired.into());
        }

        let id = BusinessId::new();
        let mut business = Self {
            id,
            owner_id,
            profile,
            location,
            contact_info,
            category,
            status: BusinessStatus::PendingApproval,
            is_verified: false,
            verified_at: None,
            services: Vec::new(),
            images: Vec::new(),
            meta: EntityMeta::new(now),
            events: DomainEvents::default(),
        };
        business.events.record(BusinessDomainEvent::Created {
            business_id: id,
            owner_id,
            occurred_at: now,
        });
        Ok(business)
    }

    pub fn update_profile(&mut self, profile: BusinessProfile, now: DateTime<Utc>) -> Outcome {
        self.profile = profile;
        self.meta.mark_updated(now);
        Ok(())
    }

    pub fn update_location(&mut self, location: BusinessLocation, now: DateTime<Utc>) -> Outcome {
        self.location = location;
        self.meta.mark_updated(now);
        Ok(())
    }

    pub fn update_contact_info(&mut self, contact_info: ContactInformation, now: DateTime<Utc>) -> Outcome {
        self.contact_info = contact_info;
        self.meta.mark_updated(now);
        Ok(())
    }

    pub fn update_category(&mut self, category: BusinessCategory, now: DateTime<Utc>) -> Outcome {
        self.category = category;
        self.meta.mark_updated(now);
        Ok(())
    }

    pub fn activate(&mut self, now: DateTime<Utc>) -> Outcome {
        if self.status == BusinessStatus::Active {
            return Err(BusinessError::AlreadyActive.into());
        }
        self.change_status(BusinessStatus::Active, now);
        Ok(())
    }

    pub fn suspend(&mut self, now: DateTime<Utc>) -> Outcome {
        if self.status == BusinessStatus::Suspended {
            return Err(BusinessError::AlreadySuspended.into());
        }
        self.change_status(BusinessStatus::Suspended, now);
        Ok(())
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) -> Outcome {
        self.change_status(BusinessStatus::Inactive, now);
        Ok(())
    }

    pub fn verify(&mut self, now: DateTime<Utc>) -> Outcome {
        if self.is_verified {
            return Err(BusinessError::AlreadyVerified.into());
        }
        self.is_verified = true;
        self.verified_at = Some(now);
        self.meta.mark_updated(now);
        self.events.record(BusinessDomainEvent::Verified {
            business_id: self.id,
            occurred_at: now,
        });
        Ok(())
    }

    pub fn unverify(&mut self, now: DateTime<Utc>) -> Outcome {
        if !self.is_verified {
            return Err(BusinessError::NotVerified.into());
        }
        self.is_verified = false;
        self.verified_at = None;
        self.meta.mark_updated(now);
        Ok(())
    }

    pub fn add_service(&mut self, service: Service, now: DateTime<Utc>) -> Outcome {
        if self
            .services
            .iter()
            .any(|s| s.name().eq_ignore_ascii_case(service.name()))
        {
            return Err(BusinessError::DuplicateService.into());
        }
        self.services.push(service);
        self.meta.mark_updated(now);
        Ok(())
    }

    pub fn remove_service(&mut self, name: &str, now: DateTime<Utc>) -> Outcome<Service> {
        let position = self
            .services
            .iter()
            .position(|s| s.name().eq_ignore_ascii_case(name.trim()))
            .ok_or(BusinessError::ServiceNotFound)?;
        let removed = self.services.remove(position);
        self.meta.mark_updated(now);
        Ok(removed)
    }

    /// Adds an uploaded image. The first image, or one flagged primary,
    /// becomes the primary image.
    pub fn add_image(
        &mut self,
        url: &str,
        blob_name: &str,
        alt_text: Option<&str>,
        make_primary: bool,
        now: DateTime<Utc>,
    ) -> Outcome<ImageId> {
        let url = url.trim();
        if url.is_empty() {
            return Err(BusinessError::ImageUrlRequired.into());
        }
        if self
            .images
            .iter()
            .any(|image| image.original_url.eq_ignore_ascii_case(url))
        {
            return Err(BusinessError::DuplicateImage.into());
        }
        let alt_text = optional_text(alt_text, "Alt text", 255)?;

        let is_primary = make_primary || self.images.is_empty();
        if is_primary {
            self.images.iter_mut().for_each(|image| image.is_primary = false);
        }
        let image = BusinessImage {
            id: ImageId::new(),
            original_url: url.to_string(),
            blob_name: blob_name.trim().to_string(),
            alt_text,
            is_primary,
            display_order: self.next_display_order(),
            uploaded_at: now,
        };
        let image_id = image.id;
        self.images.push(image);
        self.meta.mark_updated(now);
        Ok(image_id)
    }

    /// Removes an image and returns it for blob cleanup. Removing the
    /// primary image promotes the image with the lowest display order.
    pub fn remove_image(&mut self, image_id: ImageId, now: DateTime<Utc>) -> Outcome<BusinessImage> {
        let position = self
            .images
            .iter()
            .position(|image| image.id == image_id)
            .ok_or(BusinessError::ImageNotFound)?;
        let removed = self.images.remove(position);

        if removed.is_primary
            && let Some(next) = self.images.iter_mut().min_by_key(|image| image.display_order)
        {
            next.is_primary = true;
        }
        self.meta.mark_updated(now);
        self.events.record(BusinessDomainEvent::ImageRemoved {
            business_id: self.id,
            image_id,
            blob_name: removed.blob_name.clone(),
            occurred_at: now,
        });
        Ok(removed)
    }

    pub fn set_primary_image(&mut self, image_id: ImageId, now: DateTime<Utc>) -> Outcome {
        let target = self
            .images
            .iter()
            .find(|image| image.id == image_id)
            .ok_or(BusinessError::ImageNotFound)?;
        if target.is_primary {
            return Err(BusinessError::AlreadyPrimary.into());
        }

        for image in &mut self.images {
            image.is_primary = image.id == image_id;
        }
        self.meta.mark_updated(now);
        Ok(())
    }

    fn next_display_order(&self) -> u32 {
        self.images
            .iter()
            .map(|image| image.display_order + 1)
            .max()
            .unwrap_or(0)
    }

    fn change_status(&mut self, status: BusinessStatus, now: DateTime<Utc>) {
        self.status = status;
        self.meta.mark_updated(now);
        self.events.record(BusinessDomainEvent::StatusChanged {
            business_id: self.id,
            status,
            occurred_at: now,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::Address;
    use common::{ErrorKind, OutcomeExt};

    fn business() -> Business {
        let profile =
            BusinessProfile::create("Ceylon Spices", "Imported spices", None, &[], &[]).unwrap();
        let address = Address::create("12 Queen St", "Toronto", "ON", "M5H 2N2", "Canada").unwrap();
        let location = BusinessLocation::create(address, None).unwrap();
        let contact = ContactInformation::create(Some("shop@example.com"), None, None).unwrap();
        Business::create(
            profile,
            location,
            contact,
            BusinessCategory::Grocery,
            UserId::new(),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_create_starts_pending() {
        let business = business();
        assert_eq!(business.status(), BusinessStatus::PendingApproval);
        assert!(!business.is_verified());
    }

    #[test]
    fn test_create_requires_owner() {
        let b = business();
        let outcome = Business::create(
            b.profile().clone(),
            b.location().clone(),
            b.contact_info().clone(),
            BusinessCategory::Grocery,
            UserId::nil(),
            Utc::now(),
        );
        assert_eq!(outcome.messages(), vec!["Owner ID is required"]);
    }

    #[test]
    fn test_status_transitions() {
        let mut business = business();
        business.activate(Utc::now()).unwrap();
        assert_eq!(
            business.activate(Utc::now()).messages(),
            vec!["Business is already active"]
        );
        business.suspend(Utc::now()).unwrap();
        assert!(business.suspend(Utc::now()).is_failure());
        business.deactivate(Utc::now()).unwrap();
        assert_eq!(business.status(), BusinessStatus::Inactive);
    }

    #[test]
    fn test_verification() {
        let mut business = business();
        assert_eq!(business.unverify(Utc::now()).messages(), vec!["Business is not verified"]);
        let now = Utc::now();
        business.verify(now).unwrap();
        assert_eq!(business.verified_at(), Some(now));
        assert!(business.verify(now).is_failure());
    }

    #[test]
    fn test_services_are_unique_by_name() {
        let mut business = business();
        business
            .add_service(Service::create("Catering", None, None).unwrap(), Utc::now())
            .unwrap();
        let duplicate = business.add_service(Service::create("CATERING", None, None).unwrap(), Utc::now());
        assert_eq!(duplicate.unwrap_err().kind(), ErrorKind::Conflict);

        business.remove_service("catering", Utc::now()).unwrap();
        assert!(business.services().is_empty());
        assert_eq!(
            business.remove_service("catering", Utc::now()).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_single_primary_image() {
        let mut business = business();
        let first = business.add_image("https://cdn/a.jpg", "a.jpg", None, false, Utc::now()).unwrap();
        let second = business.add_image("https://cdn/b.jpg", "b.jpg", None, true, Utc::now()).unwrap();
        assert_eq!(business.primary_image().unwrap().id, second);

        business.set_primary_image(first, Utc::now()).unwrap();
        assert_eq!(business.images().iter().filter(|i| i.is_primary).count(), 1);
        assert_eq!(
            business.set_primary_image(first, Utc::now()).messages(),
            vec!["Image is already set as primary"]
        );
    }

    #[test]
    fn test_duplicate_image_url() {
        let mut business = business();
        business.add_image("https://cdn/a.jpg", "a.jpg", None, false, Utc::now()).unwrap();
        let outcome = business.add_image("HTTPS://CDN/A.JPG", "a2.jpg", None, false, Utc::now());
        assert_eq!(outcome.messages(), vec!["An image with this URL already exists"]);
    }

    #[test]
    fn test_removing_primary_promotes_next() {
        let mut business = business();
        let first = business.add_image("https://cdn/a.jpg", "a.jpg", None, false, Utc::now()).unwrap();
        let second = business.add_image("https://cdn/b.jpg", "b.jpg", None, false, Utc::now()).unwrap();

        let removed = business.remove_image(first, Utc::now()).unwrap();
        assert_eq!(removed.blob_name, "a.jpg");
        assert_eq!(business.primary_image().unwrap().id, second);
    }
}
