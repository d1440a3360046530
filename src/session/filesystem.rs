use super::storage::CredentialStore;
use crate::error::Result;
use crate::models::Identity;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

const IDENTITY_FILE: &str = "identity.json";
const TOKEN_FILE: &str = "token";

/// Stores the identity and token as two files under one directory.
pub struct FilesystemCredentialStore {
    dir: PathBuf,
}

impl FilesystemCredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `~/.cache/userdesk`, or `.userdesk` in the working directory when no
    /// home directory is known.
    pub fn default_dir() -> PathBuf {
        dirs::home_dir()
            .map(|home| home.join(".cache").join("userdesk"))
            .unwrap_or_else(|| PathBuf::from(".userdesk"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write_private(&self, name: &str, contents: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        fs::write(&path, contents)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        match fs::remove_file(self.dir.join(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl CredentialStore for FilesystemCredentialStore {
    fn identity(&self) -> Option<Identity> {
        let path = self.dir.join(IDENTITY_FILE);
        let content = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(identity) => Some(identity),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable identity file");
                None
            }
        }
    }

    fn token(&self) -> Option<String> {
        let content = fs::read_to_string(self.dir.join(TOKEN_FILE)).ok()?;
        let token = content.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }

    fn set_identity(&self, identity: Option<&Identity>) -> Result<()> {
        match identity {
            Some(identity) => {
                let content = serde_json::to_string_pretty(identity)?;
                self.write_private(IDENTITY_FILE, &content)
            }
            None => self.remove(IDENTITY_FILE),
        }
    }

    fn set_token(&self, token: Option<&str>) -> Result<()> {
        match token {
            Some(token) if !token.is_empty() => self.write_private(TOKEN_FILE, token),
            _ => self.remove(TOKEN_FILE),
        }
    }
}

impl Default for FilesystemCredentialStore {
    fn default() -> Self {
        Self::new(Self::default_dir())
    }
}
