//! # Earshot Link
//!
//! Chunked byte-link abstraction for the earshot protocol.
//!
//! This crate provides:
//! - The [`Link`] trait over any bidirectional chunk transport
//! - [`LinkEvent`] notifications (inbound chunks, status text, closure)
//! - [`MemoryLink`], an in-process link pair for tests and demos
//!
//! A link moves opaque byte chunks no larger than its MTU and knows nothing
//! about payload framing or the packet protocol; those live in
//! `earshot-core`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod link;
pub mod memory;

pub use link::{DEFAULT_MTU, Link, LinkError, LinkEvent, LinkResult, LinkStats};
pub use memory::MemoryLink;
