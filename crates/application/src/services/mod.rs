//! Outbound collaborators and their in-memory implementations.

pub mod blob_storage;
pub mod email;
pub mod recipients;

pub use blob_storage::{BlobStorage, InMemoryBlobStorage, StoredBlob};
pub use email::{EmailService, InMemoryEmailService, SentEmail};
pub use recipients::{InMemoryRecipientDirectory, RecipientResolver};
