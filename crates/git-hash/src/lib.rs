//! Object identity for minigit.
//!
//! Every object is named by the SHA-1 of `"<kind> <len>\0" + content`.
//! This crate provides the [`ObjectId`] type and the streaming
//! [`Hasher`](hasher::Hasher) that produces it.

mod error;
mod oid;
pub mod hasher;

pub use error::HashError;
pub use oid::ObjectId;
