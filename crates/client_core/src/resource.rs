//! Session-scoped storage for report documents handed to viewers.

use std::{
    collections::HashMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use shared::domain::ResourceId;
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use url::Url;

/// Locator for a published document. Valid only while its store keeps it live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    id: ResourceId,
    path: PathBuf,
    url: Url,
    size_bytes: u64,
}

impl ResourceRef {
    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

/// Owns the backing files of every live [`ResourceRef`]. Dropping the store
/// removes them all.
#[derive(Debug, Default)]
pub struct ResourceStore {
    dir: Option<PathBuf>,
    live: HashMap<ResourceId, NamedTempFile>,
    last_id: ResourceId,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            ..Self::default()
        }
    }

    pub fn publish(&mut self, bytes: &[u8]) -> io::Result<ResourceRef> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("report-").suffix(".pdf");
        let mut file = match &self.dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(bytes)?;
        file.flush()?;

        let url = Url::from_file_path(file.path()).map_err(|()| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot express '{}' as a file URL", file.path().display()),
            )
        })?;

        self.last_id = self.last_id.next();
        let resource = ResourceRef {
            id: self.last_id,
            path: file.path().to_path_buf(),
            url,
            size_bytes: bytes.len() as u64,
        };
        self.live.insert(resource.id, file);
        debug!(resource = %resource.id, bytes = resource.size_bytes, "published report resource");
        Ok(resource)
    }

    /// Deletes the backing file. Returns `false` when the reference was already released.
    pub fn release(&mut self, resource: &ResourceRef) -> bool {
        let Some(file) = self.live.remove(&resource.id) else {
            return false;
        };
        if let Err(err) = file.close() {
            warn!(resource = %resource.id, "failed to remove report resource: {err}");
        }
        debug!(resource = %resource.id, "released report resource");
        true
    }

    pub fn is_live(&self, resource: &ResourceRef) -> bool {
        self.live.contains_key(&resource.id)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn read(&self, resource: &ResourceRef) -> io::Result<Vec<u8>> {
        self.ensure_live(resource)?;
        fs::read(resource.path())
    }

    /// Copies a live document to `dest`, returning the number of bytes written.
    pub fn save_as(&self, resource: &ResourceRef, dest: &Path) -> io::Result<u64> {
        self.ensure_live(resource)?;
        fs::copy(resource.path(), dest)
    }

    fn ensure_live(&self, resource: &ResourceRef) -> io::Result<()> {
        if self.is_live(resource) {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("report resource {} was already released", resource.id),
            ))
        }
    }
}

#[cfg(test)]
#[path = "tests/resource_tests.rs"]
mod tests;
