//! WebDAV Module
//!
//! Minimal WebDAV surface (GET, PUT, DELETE, MOVE) over a flat object store.
//! Requests flow through [`handler::handle_request`]: the credential is
//! checked, the request is parsed into an [`Operation`], the operation is
//! executed against the store, and the store's response is translated back
//! to HTTP.

pub mod auth;
pub mod destination;
pub mod executor;
pub mod handler;
pub mod operation;
pub mod response;
mod server;

pub use auth::BasicAuth;
pub use destination::resolve_destination;
pub use executor::execute;
pub use handler::{handle_request, DavRequest, DavState};
pub use operation::{parse_operation, ObjectKey, Operation, ParseFailure, Verb};
pub use response::to_http_response;
pub use server::{create_router, DavServer};
