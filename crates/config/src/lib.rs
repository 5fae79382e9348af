//! Configuration loading for the canvasgate gateway.
//!
//! Uses figment to layer built-in defaults, an optional YAML file and the
//! process environment. `CANVAS_*` variables map onto the `canvas` section
//! (`CANVAS_URL`, `CANVAS_CLIENT_ID`, ...); every other key can be set with a
//! `CANVASGATE_` prefix and `__` as the nesting separator.

pub mod schema;

pub use schema::{CanvasConfig, Config, LogConfig, LogFormat, SessionConfig, UpstreamConfig};
