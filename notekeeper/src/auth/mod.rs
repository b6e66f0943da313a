//! Authentication and authorization.
//!
//! Clients authenticate with a signed bearer token obtained from `/signup` or `/login`:
//!
//! ```text
//! Authorization: Bearer <header>.<payload>.<signature>
//! ```
//!
//! The token carries the caller's id, email and role and expires after
//! `auth.security.jwt_expiry` (24h by default). Nothing is stored server side, so each
//! request is verified on its own and tokens cannot be revoked before they expire.
//!
//! # Request flow
//!
//! 1. [`middleware::require_authentication`] validates the header on every protected route
//!    and inserts a [`CurrentUser`](crate::api::models::users::CurrentUser) into the request
//!    extensions. Failures end the request with 401.
//! 2. [`middleware::admin_only`] additionally requires the admin role on `/users/*`.
//! 3. Handlers take `CurrentUser` as an extractor and call
//!    [`permissions::authorize_owned`] before reading, changing or deleting a note or task.
//!
//! # Modules
//!
//! - [`session`]: token issuance and verification
//! - [`password`]: Argon2 hashing and verification
//! - [`current_user`]: bearer header parsing and the `CurrentUser` extractor
//! - [`middleware`]: route-group middleware
//! - [`permissions`]: role and ownership rules

pub mod current_user;
pub mod middleware;
pub mod password;
pub mod permissions;
pub mod session;
