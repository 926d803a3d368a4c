//! Viewer: HTTP + WebSocket page that shows the display element in a browser.
//!
//! `GET /` serves a page with the image element; `GET /ws` pushes each new image source,
//! which the page assigns to the element. `GET /health` and `GET /frame.jpg` serve status checks and scripts.

mod page;
mod server;

pub use server::{bind_viewer, serve_viewer, shutdown_signal};
