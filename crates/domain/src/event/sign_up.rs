//! Sign-up lists: what attendees volunteer to bring.

use chrono::{DateTime, Utc};
use common::{
    DomainError, ErrorKind, Failure, Outcome, SignUpItemId, SignUpListId, UserId, Validator,
    optional_text, required_text,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by sign-up list operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignUpError {
    #[error("Category cannot be empty")]
    CategoryRequired,

    #[error("Predefined items list cannot be empty")]
    PredefinedItemsRequired,

    #[error("Item '{0}' is not in the predefined items list")]
    ItemNotPredefined(String),

    #[error("User has already committed to this sign-up")]
    AlreadyCommitted,

    #[error("User has no commitment to cancel")]
    NoCommitment,

    #[error("At least one item is required")]
    ItemsRequired,

    #[error("Sign-up item not found")]
    ItemNotFound,

    #[error("Requested quantity {requested} exceeds remaining quantity {remaining}")]
    InsufficientQuantity { requested: u32, remaining: u32 },

    #[error("Quantity must be greater than 0")]
    InvalidQuantity,

    #[error("This sign-up list does not take item commitments")]
    WrongSignUpType,
}

impl SignUpError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SignUpError::CategoryRequired
            | SignUpError::PredefinedItemsRequired
            | SignUpError::ItemsRequired
            | SignUpError::InvalidQuantity => ErrorKind::Validation,
            SignUpError::ItemNotFound => ErrorKind::NotFound,
            _ => ErrorKind::DomainRule,
        }
    }
}

impl From<SignUpError> for Failure {
    fn from(err: SignUpError) -> Self {
        Failure::new(DomainError::new(err.kind(), err.to_string()))
    }
}

/// How attendees sign up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignUpType {
    /// Attendees write what they bring.
    Open,
    /// Attendees pick from a fixed list of item names.
    Predefined,
    /// Items with quantities, grouped by priority category.
    Categorized,
}

/// Priority of a categorized sign-up item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemCategory {
    Mandatory,
    Preferred,
    Suggested,
}

/// Which item categories a categorized list uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SignUpCategories {
    pub has_mandatory_items: bool,
    pub has_preferred_items: bool,
    pub has_suggested_items: bool,
}

impl SignUpCategories {
    /// Returns true when at least one category is enabled.
    pub fn any(&self) -> bool {
        self.has_mandatory_items || self.has_preferred_items || self.has_suggested_items
    }

    pub fn allows(&self, category: ItemCategory) -> bool {
        match category {
            ItemCategory::Mandatory => self.has_mandatory_items,
            ItemCategory::Preferred => self.has_preferred_items,
            ItemCategory::Suggested => self.has_suggested_items,
        }
    }
}

/// Input for one categorized item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewSignUpItem {
    pub description: String,
    pub quantity: u32,
    pub category: ItemCategory,
    pub notes: Option<String>,
}

/// A categorized item with its remaining quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUpItem {
    id: SignUpItemId,
    description: String,
    quantity: u32,
    remaining_quantity: u32,
    category: ItemCategory,
    notes: Option<String>,
}

impl SignUpItem {
    pub const MAX_DESCRIPTION: usize = 200;
    pub const MAX_NOTES: usize = 500;

    fn create(input: &NewSignUpItem) -> Outcome<Self> {
        let mut validator = Validator::new();
        let description = validator.collect(required_text(
            &input.description,
            "Item description",
            Self::MAX_DESCRIPTION,
        ));
        validator.check(input.quantity > 0, "Item quantity must be greater than 0");
        let notes = validator.collect(optional_text(
            input.notes.as_deref(),
            "Item notes",
            Self::MAX_NOTES,
        ));
        validator.finish()?;

        Ok(Self {
            id: SignUpItemId::new(),
            description: description.unwrap_or_default(),
            quantity: input.quantity,
            remaining_quantity: input.quantity,
            category: input.category,
            notes: notes.flatten(),
        })
    }

    pub fn id(&self) -> SignUpItemId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn remaining_quantity(&self) -> u32 {
        self.remaining_quantity
    }

    pub fn category(&self) -> ItemCategory {
        self.category
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

/// One attendee's pledge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    pub user_id: UserId,
    pub item_description: String,
    pub quantity: u32,
    pub item_id: Option<SignUpItemId>,
    pub notes: Option<String>,
    pub committed_at: DateTime<Utc>,
}

/// A sign-up list owned by an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUpList {
    id: SignUpListId,
    category: String,
    description: Option<String>,
    sign_up_type: SignUpType,
    predefined_items: Vec<String>,
    categories: SignUpCategories,
    items: Vec<SignUpItem>,
    commitments: Vec<Commitment>,
}

// Query methods
impl SignUpList {
    pub fn id(&self) -> SignUpListId {
        self.id
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn sign_up_type(&self) -> SignUpType {
        self.sign_up_type
    }

    pub fn predefined_items(&self) -> &[String] {
        &self.predefined_items
    }

    pub fn categories(&self) -> SignUpCategories {
        self.categories
    }

    pub fn items(&self) -> &[SignUpItem] {
        &self.items
    }

    pub fn commitments(&self) -> &[Commitment] {
        &self.commitments
    }

    pub fn has_commitments(&self) -> bool {
        !self.commitments.is_empty()
    }

    /// Returns the user's commitments.
    pub fn commitments_for(&self, user_id: UserId) -> impl Iterator<Item = &Commitment> {
        self.commitments.iter().filter(move |c| c.user_id == user_id)
    }
}

// Command methods
impl SignUpList {
    /// Creates an open or predefined list.
    pub fn create(
        category: &str,
        description: Option<&str>,
        sign_up_type: SignUpType,
        predefined_items: Vec<String>,
    ) -> Outcome<Self> {
        let category = Self::validate_category(category)?;
        let description = optional_text(description, "Description", 500)?;

        let predefined_items: Vec<String> = predefined_items
            .iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect();
        if sign_up_type == SignUpType::Predefined && predefined_items.is_empty() {
            return Err(SignUpError::PredefinedItemsRequired.into());
        }

        Ok(Self {
            id: SignUpListId::new(),
            category,
            description,
            sign_up_type,
            predefined_items,
            categories: SignUpCategories::default(),
            items: Vec::new(),
            commitments: Vec::new(),
        })
    }

    /// Creates a categorized list with quantified items.
    ///
    /// Whether at least one category flag is set is a command-level rule and
    /// is not checked here.
    pub fn create_with_categories_and_items(
        category: &str,
        description: Option<&str>,
        categories: SignUpCategories,
        items: &[NewSignUpItem],
    ) -> Outcome<Self> {
        let category = Self::validate_category(category)?;
        let description = optional_text(description, "Description", 500)?;
        if items.is_empty() {
            return Err(SignUpError::ItemsRequired.into());
        }

        let mut validator = Validator::new();
        let items: Vec<SignUpItem> = items
            .iter()
            .filter_map(|item| validator.collect(SignUpItem::create(item)))
            .collect();
        validator.finish()?;

        Ok(Self {
            id: SignUpListId::new(),
            category,
            description,
            sign_up_type: SignUpType::Categorized,
            predefined_items: Vec::new(),
            categories,
            items,
            commitments: Vec::new(),
        })
    }

    /// Commits to bring something on an open or predefined list.
    pub fn commit(
        &mut self,
        user_id: UserId,
        item_description: &str,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Outcome {
        if self.sign_up_type == SignUpType::Categorized {
            return Err(SignUpError::WrongSignUpType.into());
        }
        if quantity == 0 {
            return Err(SignUpError::InvalidQuantity.into());
        }
        if self.commitments_for(user_id).next().is_some() {
            return Err(SignUpError::AlreadyCommitted.into());
        }

        let item_description = required_text(item_description, "Item description", 200)?;
        if self.sign_up_type == SignUpType::Predefined
            && !self
                .predefined_items
                .iter()
                .any(|item| item.eq_ignore_ascii_case(&item_description))
        {
            return Err(SignUpError::ItemNotPredefined(item_description).into());
        }

        self.commitments.push(Commitment {
            user_id,
            item_description,
            quantity,
            item_id: None,
            notes: None,
            committed_at: now,
        });
        Ok(())
    }

    /// Commits to a quantity of one categorized item.
    pub fn commit_to_item(
        &mut self,
        user_id: UserId,
        item_id: SignUpItemId,
        quantity: u32,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> Outcome {
        if quantity == 0 {
            return Err(SignUpError::InvalidQuantity.into());
        }
        let notes = optional_text(notes, "Notes", SignUpItem::MAX_NOTES)?;
        if self
            .commitments
            .iter()
            .any(|c| c.user_id == user_id && c.item_id == Some(item_id))
        {
            return Err(SignUpError::AlreadyCommitted.into());
        }

        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or(SignUpError::ItemNotFound)?;
        if quantity > item.remaining_quantity {
            return Err(SignUpError::InsufficientQuantity {
                requested: quantity,
                remaining: item.remaining_quantity,
            }
            .into());
        }

        item.remaining_quantity -= quantity;
        let item_description = item.description.clone();
        self.commitments.push(Commitment {
            user_id,
            item_description,
            quantity,
            item_id: Some(item_id),
            notes,
            committed_at: now,
        });
        Ok(())
    }

    /// Withdraws every commitment the user made, restoring item quantities.
    pub fn cancel_commitment(&mut self, user_id: UserId) -> Outcome {
        if self.commitments_for(user_id).next().is_none() {
            return Err(SignUpError::NoCommitment.into());
        }

        let (cancelled, kept): (Vec<_>, Vec<_>) = self
            .commitments
            .drain(..)
            .partition(|c| c.user_id == user_id);
        self.commitments = kept;

        for commitment in cancelled {
            if let Some(item) = commitment
                .item_id
                .and_then(|id| self.items.iter_mut().find(|item| item.id == id))
            {
                item.remaining_quantity += commitment.quantity;
            }
        }
        Ok(())
    }

    fn validate_category(category: &str) -> Outcome<String> {
        let category = category.trim();
        if category.is_empty() {
            return Err(SignUpError::CategoryRequired.into());
        }
        required_text(category, "Category", 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::OutcomeExt;

    fn item(description: &str, quantity: u32, category: ItemCategory) -> NewSignUpItem {
        NewSignUpItem {
            description: description.to_string(),
            quantity,
            category,
            notes: None,
        }
    }

    fn categorized() -> SignUpList {
        SignUpList::create_with_categories_and_items(
            "Food",
            Some("Potluck dishes"),
            SignUpCategories {
                has_mandatory_items: true,
                ..Default::default()
            },
            &[item("Rice (10 cups)", 3, ItemCategory::Mandatory)],
        )
        .unwrap()
    }

    #[test]
    fn test_category_is_required() {
        let outcome = SignUpList::create("  ", None, SignUpType::Open, Vec::new());
        assert_eq!(outcome.messages(), vec!["Category cannot be empty"]);
    }

    #[test]
    fn test_predefined_list_needs_items() {
        let outcome = SignUpList::create("Drinks", None, SignUpType::Predefined, vec![" ".into()]);
        assert_eq!(outcome.messages(), vec!["Predefined items list cannot be empty"]);
    }

    #[test]
    fn test_predefined_commit_checks_item() {
        let mut list = SignUpList::create(
            "Drinks",
            None,
            SignUpType::Predefined,
            vec!["Tea".into(), "Juice".into()],
        )
        .unwrap();
        let user = UserId::new();

        let outcome = list.commit(user, "Soda", 1, Utc::now());
        assert_eq!(
            outcome.messages(),
            vec!["Item 'Soda' is not in the predefined items list"]
        );
        list.commit(user, "tea", 1, Utc::now()).unwrap();
        assert!(list.has_commitments());
    }

    #[test]
    fn test_user_commits_once() {
        let mut list = SignUpList::create("Help", None, SignUpType::Open, Vec::new()).unwrap();
        let user = UserId::new();
        list.commit(user, "Setup chairs", 1, Utc::now()).unwrap();
        let outcome = list.commit(user, "Clean up", 1, Utc::now());
        assert_eq!(
            outcome.messages(),
            vec!["User has already committed to this sign-up"]
        );
    }

    #[test]
    fn test_cancel_without_commitment_fails() {
        let mut list = SignUpList::create("Help", None, SignUpType::Open, Vec::new()).unwrap();
        assert_eq!(
            list.cancel_commitment(UserId::new()).messages(),
            vec!["User has no commitment to cancel"]
        );
    }

    #[test]
    fn test_categorized_item_validation() {
        let outcome = SignUpList::create_with_categories_and_items(
            "Food",
            None,
            SignUpCategories::default(),
            &[item("", 0, ItemCategory::Suggested)],
        );
        assert_eq!(
            outcome.messages(),
            vec![
                "Item description is required",
                "Item quantity must be greater than 0"
            ]
        );
    }

    #[test]
    fn test_categorized_list_without_flags_is_accepted_by_entity() {
        let outcome = SignUpList::create_with_categories_and_items(
            "Food",
            None,
            SignUpCategories::default(),
            &[item("Cake", 1, ItemCategory::Suggested)],
        );
        assert!(outcome.is_success());
    }

    #[test]
    fn test_commit_to_item_tracks_remaining_quantity() {
        let mut list = categorized();
        let item_id = list.items()[0].id();
        let (alice, bob) = (UserId::new(), UserId::new());

        list.commit_to_item(alice, item_id, 2, Some("Basmati"), Utc::now())
            .unwrap();
        assert_eq!(list.items()[0].remaining_quantity(), 1);

        let outcome = list.commit_to_item(bob, item_id, 2, None, Utc::now());
        assert!(outcome.unwrap_err().mentions("exceeds remaining quantity"));

        list.cancel_commitment(alice).unwrap();
        assert_eq!(list.items()[0].remaining_quantity(), 3);
        assert!(!list.has_commitments());
    }

    #[test]
    fn test_commit_to_unknown_item() {
        let mut list = categorized();
        let outcome = list.commit_to_item(UserId::new(), SignUpItemId::new(), 1, None, Utc::now());
        assert_eq!(outcome.unwrap_err().kind(), ErrorKind::NotFound);
    }
}
