//! Loading lineage settings for the hook binary.
//!
//! Sources, lowest priority first:
//! 1. Defaults
//! 2. Config file (`lineage.toml`, or the given prefix)
//! 3. Environment variables (`LINEAGE__` prefix, `__` between levels,
//!    e.g. `LINEAGE__STORE__CLASSES=neo4j`)

use lineage_core::LineageConfig;

use crate::error::Result;

pub fn load_config(file_prefix: &str) -> Result<LineageConfig> {
    let cfg = ::config::Config::builder()
        .add_source(::config::File::with_name(file_prefix).required(false))
        .add_source(
            ::config::Environment::with_prefix("LINEAGE")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(cfg.try_deserialize::<LineageConfig>()?)
}
