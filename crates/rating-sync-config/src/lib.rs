pub mod config;
pub mod form;
pub mod paths;

pub use config::{Config, ConfigError, EndpointConfig, ResolverConfig, ServerConfig, DEFAULT_CRON, PLUGIN_ID};
pub use form::{config_form, form_values, ConfigForm, FieldKind, FormField};
pub use paths::{container_base_path, PathManager};
