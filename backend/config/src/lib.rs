//! `tron-config` — deployment settings for tron services.
//!
//! Provides:
//! - Dotted-path lookup (`logging.maxSize`) over a loaded settings tree
//! - YAML / TOML / JSON file loading
//! - `${ENV_VAR}` substitution with `${VAR:-fallback}` defaults

pub mod env;
pub mod io;
pub mod source;

pub use env::{resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::load_settings;
pub use source::{ConfigSource, Settings};
