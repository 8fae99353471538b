pub mod error;
pub mod memory;
pub mod postgres;
pub mod repository;
pub mod store;

pub use error::{PersistenceError, Result};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use repository::{Repository, Session, UnitOfWork};
pub use store::{DocumentChange, DocumentStore, StoredDocument, ViewRecordStore};
