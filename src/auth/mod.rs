//! Installation authentication: webhook signature verification and the
//! OAuth-style token authority.

pub mod signature;
pub mod tokens;
