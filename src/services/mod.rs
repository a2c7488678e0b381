//! Service layer for business logic
//!
//! Shared by the HTTP API and the runtime wiring: link creation and lookup,
//! redirect resolution and the remote lookup client.

mod link_service;
pub mod redirect;
pub mod remote;
mod types;

pub use link_service::{LinkService, LinkServiceOptions};
pub use redirect::{LinkLookup, RedirectResolver, StoreLookup};
pub use remote::RemoteLinkLookup;
pub use types::*;
