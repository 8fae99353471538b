//! Per-request context shared by every handler: who is acting, what time it
//! is and the tunables.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use common::{Failure, Outcome, UserId};
use domain::DedupWindow;
use persistence::{DocumentStore, Session};

use crate::dispatch::DomainEventDispatcher;

/// The acting user, passed explicitly to every handler that authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub is_admin: bool,
}

impl Principal {
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: false,
        }
    }

    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: true,
        }
    }

    /// Returns true for the owner of a resource or an admin.
    pub fn can_manage(&self, owner: UserId) -> bool {
        self.is_admin || self.user_id == owner
    }

    /// Fails with `Forbidden` unless [`can_manage`](Self::can_manage) holds.
    pub fn ensure_can_manage(&self, owner: UserId, action: &str) -> Outcome {
        if self.can_manage(owner) {
            Ok(())
        } else {
            Err(forbidden(action))
        }
    }

    /// Fails with `Forbidden` unless the principal is an admin.
    pub fn ensure_admin(&self, action: &str) -> Outcome {
        if self.is_admin {
            Ok(())
        } else {
            Err(forbidden(action))
        }
    }
}

fn forbidden(action: &str) -> Failure {
    Failure::forbidden(format!("You do not have permission to {action}"))
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<RwLock<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(RwLock::new(now)),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.write().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Tunables for handlers.
#[derive(Debug, Clone)]
pub struct HandlerSettings {
    /// Repeat views from one viewer inside this window are not counted.
    pub view_dedup_window: DedupWindow,
    /// Email template used when sending newsletters.
    pub newsletter_template: String,
    /// Blob container for event images.
    pub event_image_container: String,
    /// Blob container for business images.
    pub business_image_container: String,
    /// Blob container for badge images.
    pub badge_image_container: String,
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self {
            view_dedup_window: DedupWindow::default(),
            newsletter_template: "newsletter".to_string(),
            event_image_container: "event-images".to_string(),
            business_image_container: "business-images".to_string(),
            badge_image_container: "badges".to_string(),
        }
    }
}

/// Everything a handler needs besides its collaborators.
#[derive(Clone)]
pub struct HandlerContext<S: DocumentStore> {
    pub store: S,
    pub clock: Arc<dyn Clock>,
    pub dispatcher: Arc<dyn DomainEventDispatcher>,
    pub settings: HandlerSettings,
}

impl<S: DocumentStore> HandlerContext<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>, dispatcher: Arc<dyn DomainEventDispatcher>) -> Self {
        Self {
            store,
            clock,
            dispatcher,
            settings: HandlerSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: HandlerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Opens the unit of work for one handler invocation.
    pub fn session(&self) -> Session<S> {
        Session::new(self.store.clone())
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
