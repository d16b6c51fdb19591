//! Catalog Config

use std::path::PathBuf;

use clap::Args;

/// Catalog bundled with the workspace.
pub const DEFAULT_CATALOG_PATH: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/../core/fixtures/catalog.yml");

/// Catalog source settings.
#[derive(Debug, Clone, Args)]
pub struct CatalogConfig {
    /// Path to the YAML catalog
    #[arg(long, env = "CATALOG_PATH", default_value = DEFAULT_CATALOG_PATH)]
    pub catalog_path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
        }
    }
}
