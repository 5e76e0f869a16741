//! Config loader: assembles sources in precedence order and deserializes.

use super::merge_policy::builder_with_defaults;
use super::sources::{environment, global_file, workspace_file};
use super::BookConfig;
use crate::error::BookError;
use config::File;
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load defaults, global file, `<workspace_root>/colorbook.toml`, then environment.
    pub fn load(workspace_root: &Path) -> Result<BookConfig, BookError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);
        Ok(builder.build()?.try_deserialize()?)
    }

    /// Load defaults, the given file (required), then environment.
    pub fn load_from_file(path: &Path) -> Result<BookConfig, BookError> {
        let builder = builder_with_defaults()?.add_source(File::from(path).required(true));
        let builder = environment::add_to_builder(builder);
        Ok(builder.build()?.try_deserialize()?)
    }

    pub fn default() -> BookConfig {
        BookConfig::default()
    }
}
