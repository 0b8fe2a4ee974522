//! Inbound adapters that translate external requests into domain service
//! calls while keeping framework details at the edge.
//!
//! The REST surface and the identity provider's blocking hooks both live
//! under [`http`].

pub mod http;
