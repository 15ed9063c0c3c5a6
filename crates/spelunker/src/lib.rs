//! # spelunker
//!
//! Pick a gazetteer backend from a configuration URI and use it through the
//! [`Spelunker`] contract.
//!
//! ```rust,no_run
//! use spelunker::{open, Spelunker};
//!
//! # async fn example() -> spelunker::Result<()> {
//! let spelunker = open("sql://sqlite?dsn=sqlite:///usr/local/data/gazetteer.db").await?;
//! let count = spelunker.count_descendants(85633793).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Supported schemes:
//! - `sql://{engine}?dsn={dsn}`
//! - `opensearch://?client-uri={uri}&reader-uri={uri}&cache-uri={uri}`
//! - `null://`

mod backend;
pub mod uris;

pub use backend::{open, schemes, AnySpelunker};
pub use uris::Uris;

pub use spelunker_query::{Result, Spelunker, SpelunkerError};
