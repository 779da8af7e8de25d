// custstore - Customer records in a single JSON document

pub mod collection;
pub mod filter;
pub mod json;
pub mod models;
pub mod store;
pub mod validate;

// Re-export main types for convenience
pub use collection::RecordNotFound;
pub use filter::{Query, SortField, SortOrder};
pub use models::{Customer, CustomerFields};
pub use store::Store;
pub use validate::{FieldError, ValidationErrors};
