//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `Cursor`: Pagination position within a seed's connection pages
//! - `Checkpoint`: Persisted resume point (seed, page number, cursor)
//! - `FrontierState`: In-memory visited and eligible sets rebuilt from the directory

mod checkpoint;
mod cursor;
mod frontier;

// Re-export main types
pub use checkpoint::Checkpoint;
pub use cursor::Cursor;
pub use frontier::FrontierState;
