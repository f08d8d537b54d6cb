//! Token persistence
//!
//! The only client state that outlives a run: one bearer token stored as a
//! plain string. A missing token means "logged out".

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;

/// Where the bearer token lives between runs
pub trait TokenStore: Send + Sync {
    fn load(&self) -> StoreResult<Option<String>>;
    fn save(&self, token: &str) -> StoreResult<()>;
    /// Remove the token. Clearing an absent token is not an error.
    fn clear(&self) -> StoreResult<()>;
}

/// Errors raised by a token store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access token file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Lock error: {0}")]
    Lock(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Token kept in a single file
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data_local_dir>/signup-desk/token`, or a dotfile in the working directory
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .map(|p| p.join("signup-desk").join("token"))
            .unwrap_or_else(|| PathBuf::from("./.signup-desk-token"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl Default for FileTokenStore {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> StoreResult<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&self, token: &str) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path).map_err(|e| self.io_error(e))?;

        // `mode` only applies on creation; tighten a file left by an older run
        // before the token goes in
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .map_err(|e| self.io_error(e))?;
        }

        file.write_all(token.as_bytes())
            .map_err(|e| self.io_error(e))
    }

    fn clear(&self) -> StoreResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// Token kept only for the life of the process
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> StoreResult<Option<String>> {
        self.token
            .read()
            .map(|t| t.clone())
            .map_err(|e| StoreError::Lock(e.to_string()))
    }

    fn save(&self, token: &str) -> StoreResult<()> {
        let mut slot = self
            .token
            .write()
            .map_err(|e| StoreError::Lock(e.to_string()))?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        let mut slot = self
            .token
            .write()
            .map_err(|e| StoreError::Lock(e.to_string()))?;
        *slot = None;
        Ok(())
    }
}
