//! sea-orm entities for the `users` and `posts` tables.
//!
//! The one-to-many user/post association is declared here once, through the
//! `Relation` enums and `Related` impls, and reused by every joined query.

pub mod post;
pub mod user;
