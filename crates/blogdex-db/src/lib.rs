//! Blogdex DB - Database abstractions
//!
//! SQLx-based database layer for Blogdex services.
//!
//! # Example
//!
//! ```rust,ignore
//! use blogdex_db::{create_pool, Repositories};
//!
//! let pool = create_pool("postgres://localhost/blogdex").await?;
//! let repos = Repositories::new(pool);
//!
//! // Use repositories
//! let blogger = repos.bloggers.find_by_id(blogger_id).await?;
//! ```

pub mod error;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pg::Repositories;
pub use pool::{create_pool, DbPool};
pub use repo::*;
