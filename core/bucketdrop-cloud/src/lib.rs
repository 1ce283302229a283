//! Google sign-in and Cloud Storage access for bucketdrop.
//!
//! Two seams are exposed as traits so the upload flow can be driven by fakes:
//! - [`IdentityProvider`]: obtains an [`Account`] (OAuth 2.0 installed-app flow)
//! - [`ObjectStorage`]: lists buckets and uploads objects with that account
//!
//! [`GoogleIdentity`] and [`GcsClient`] implement them against the real
//! Google endpoints; every base URL comes from [`GoogleConfig`] so tests can
//! point them at a mock server.

mod account;
mod config;
mod error;
pub mod identity;
pub mod storage;

pub use account::{AccessCredential, Account};
pub use config::{GoogleConfig, DEVSTORAGE_READ_WRITE, EMAIL_SCOPE};
pub use error::{AuthError, CloudError, CloudResult};
pub use identity::{GoogleIdentity, IdentityProvider, SIGN_IN_PREFS};
pub use storage::{GcsClient, GcsFactory, ObjectStorage, StorageFactory, StoredObject};
