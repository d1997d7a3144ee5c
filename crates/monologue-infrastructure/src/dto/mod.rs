//! Data Transfer Objects for the documents kept in the store.
//!
//! DTOs own the stored field names and the lenient decoding of documents
//! written by older clients; domain models never see raw JSON.

pub mod content;
pub mod lenient;
pub mod user_document;

pub use content::{ColumnDocument, MemoDocument, OWNER_FIELD};
pub use user_document::{
    FOLLOWERS_FIELD, FOLLOWINGS_FIELD, REGISTRATION_DATE_FIELD, UserDocument, patch_to_document,
};
