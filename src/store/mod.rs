//! Persistence of certification requests and their reviews
//!
//! [`RequestStore`] is the seam the workflow writes through. Two backends are
//! provided: [`InMemoryStore`] for tests and embedding, [`JsonFileStore`] for
//! the command line tool.

pub mod file;
pub mod memory;
pub mod state;
pub mod traits;

pub use file::JsonFileStore;
pub use memory::InMemoryStore;
pub use state::{StoreSnapshot, StoreState};
pub use traits::{Commit, RequestStore, StoreError};
