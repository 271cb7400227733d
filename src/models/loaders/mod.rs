pub mod toml_loader;

pub use toml_loader::{load_taxonomy_from_toml, parse_taxonomy_toml};
