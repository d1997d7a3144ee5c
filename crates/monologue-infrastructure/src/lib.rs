//! Infrastructure layer: document store implementations, stored document
//! formats, memo/column repositories and configuration loading.

pub mod config_service;
pub mod content_repository;
pub mod dto;
pub mod file_store;
pub mod memory_store;
pub mod paths;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::content_repository::{DocumentColumnRepository, DocumentMemoRepository};
pub use crate::file_store::JsonFileDocumentStore;
pub use crate::memory_store::InMemoryDocumentStore;
pub use crate::paths::MonologuePaths;
