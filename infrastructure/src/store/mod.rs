//! Document persistence adapters.

mod fs_store;

pub use fs_store::{FsDocumentStore, FsDocumentStoreFactory};
