// src/config/mod.rs

//! Configuration loading and validation for tapcheck.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Turn the raw model into a validated `ScenarioConfig` (`validate.rs`).
//! - Parse the small duration strings used throughout (`duration.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{
    ApiServerSection, BinariesSection, RawScenarioConfig, ScenarioConfig, ScenarioSection,
    StoreSection, TapperSection,
};
