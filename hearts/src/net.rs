//! Networking layer for the four-peer ring.
//!
//! This module provides UDP-based peer messaging with a tagged JSON wire
//! protocol plus a bare token sentinel. Delivery is fire-and-forget; the
//! protocol layers no acknowledgments on top of it.

/// Error types for wire decoding and transport operations.
pub mod errors;

/// Wire message kinds and their encoding.
pub mod messages;

/// The bound UDP socket, peer addressing, and the receive path.
pub mod transport;
