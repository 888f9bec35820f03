use crate::Result;
use std::path::{Path, PathBuf};

/// Rollback artifacts live next to the forward files, named
/// `rollback_<identifier>`. The prefix also keeps them out of the catalog
/// listing, since it does not start with a digit.
pub const ROLLBACK_PREFIX: &str = "rollback_";

/// One versioned schema-change artifact.
///
/// Identity is the file name; the SQL body is read lazily, only once the
/// unit has been selected for execution. Content is not checksummed, so two
/// units with the same identifier are the same logical migration regardless
/// of their text.
#[derive(Clone, Debug)]
pub struct MigrationUnit {
    identifier: String,
    path: PathBuf,
}

impl MigrationUnit {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn source(&self) -> Result<String> {
        Ok(tokio::fs::read_to_string(&self.path).await?)
    }
}

/// A directory of versioned `.sql` files.
pub struct Catalog {
    directory: PathBuf,
}

impl Catalog {
    pub fn new<P: Into<PathBuf>>(directory: P) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Lists migration units in ascending identifier order, regardless of
    /// the order the filesystem yields them in.
    ///
    /// Only `.sql` files whose name begins with a digit count as migration
    /// units. Ordering is a plain lexical sort, so numeric prefixes must be
    /// zero-padded to a fixed width by convention ("10_" sorts before "2_").
    pub async fn list_units(&self) -> Result<Vec<MigrationUnit>> {
        let mut units = vec![];
        let mut entries = tokio::fs::read_dir(&self.directory).await?;

        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };

            if !Self::is_migration_name(name) {
                continue;
            }

            units.push(MigrationUnit {
                identifier: name.to_string(),
                path: entry.path(),
            });
        }

        units.sort_by(|a, b| a.identifier.cmp(&b.identifier));

        Ok(units)
    }

    /// Path of the rollback artifact paired to `identifier`, if one exists.
    pub async fn rollback_artifact(&self, identifier: &str) -> Result<Option<PathBuf>> {
        let path = self.directory.join(format!("{ROLLBACK_PREFIX}{identifier}"));

        if tokio::fs::try_exists(&path).await? {
            Ok(Some(path))
        } else {
            Ok(None)
        }
    }

    fn is_migration_name(name: &str) -> bool {
        name.ends_with(".sql") && name.chars().next().is_some_and(|c| c.is_ascii_digit())
    }
}
