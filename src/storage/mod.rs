mod genres;
mod movies;
mod schema;
mod store;
mod types;

pub use schema::Database;
pub use store::LocalStore;
pub use types::{DatabaseError, StoreCounts};
