//! HTTP hosting subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, per-request span)
//!     → view.rs (ViewRequest from the HTTP request, Dispatcher)
//!     → response.rs (dispatch errors → status codes)
//!     → Send to client
//!
//! Startup:
//!     site.rs (ViewConfig[] → registries → axum routes)
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod site;
pub mod view;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::HttpServer;
pub use site::{MountView, Site, ViewKind};
pub use view::{as_view, MountedView};
