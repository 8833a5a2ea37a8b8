// Configuration module
// Raw JSON is parsed and validated once; the resulting AppConfig is read-only.

pub mod loader;
pub mod types;

pub use loader::{ConfigLoader, parse_config, resolve_config_path};
pub use types::{
    AppConfig, CaptureConfig, ClickConfig, ColorRange, Point, Region, TemplateDescriptor,
    TimingConfig, TradeDefinition,
};
