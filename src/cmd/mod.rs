//! CLI command implementations.
//!
//! | Module      | Commands handled          |
//! |-------------|---------------------------|
//! | `serve`     | `Serve`                   |
//! | `transform` | `Flatten`, `Unflatten`    |
//! | `config`    | `Config`                  |

pub mod config;
pub mod serve;
pub mod transform;

pub use config::cmd_config;
pub use serve::cmd_serve;
pub use transform::{cmd_flatten, cmd_unflatten};
