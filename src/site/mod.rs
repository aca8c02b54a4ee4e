//! Site server. Renders Handlebars pages from JSON data and hosts the
//! admin editor.
//!
//! ## Module Map
//!
//! ```text
//! ┌──────────┐   HTTP   ┌──────────────────────────────────────────────────┐
//! │ Browser  │ ───────> │  server.rs  (axum Router, ServerConfig, images)  │
//! │          │ <─────── │    └─ api.rs  (page + admin handlers, AppState)  │
//! └──────────┘          │         │                                        │
//!                       │         │ DataStore::load_data() / save_data()   │
//!                       │         v                                        │
//!                       │  store.rs   (templates, data/*.json, public/)    │
//!                       │         │                                        │
//!                       │         │ PageRenderer::render(source, data)     │
//!                       │         v                                        │
//!                       │  render.rs  (Handlebars registry, helpers)       │
//!                       └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Typical Request Flow (admin edit)
//!
//! 1. `GET /admin-change` renders `admin-change.hbs`; its `{{#eachFlat}}`
//!    block turns the data document into one form field per leaf, named by
//!    the leaf's dotted path.
//! 2. `POST /admin-change` decodes the form body into a `FlatMap`, rebuilds
//!    the nested document with `path_transform::unflatten`, and overwrites
//!    `data/page.json` with the pretty-printed result.
//! 3. The next page render reads the new document from disk.

pub mod api;
pub mod render;
pub mod server;
pub mod store;
