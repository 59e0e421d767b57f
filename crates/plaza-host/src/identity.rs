//! Local identity and profile cache.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use plaza_core::result::AppResult;
use plaza_core::types::Identity;
use plaza_entity::profile::Profile;

const IDENTITY_FILE: &str = "identity";
const PROFILE_FILE: &str = "profile.json";

/// Persists the generated identity and the last known profile under a
/// state directory.
#[derive(Debug, Clone)]
pub struct IdentityStore {
    dir: PathBuf,
}

impl IdentityStore {
    /// Open the store, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    /// State directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Return the persisted identity, generating and saving one on first
    /// use. An unreadable identity file is replaced.
    pub async fn load_or_create_identity(&self) -> AppResult<Identity> {
        let path = self.dir.join(IDENTITY_FILE);
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match raw.parse::<Identity>() {
                Ok(identity) => {
                    debug!(%identity, "Loaded identity");
                    return Ok(identity);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Replacing invalid identity"),
            },
            Err(e) if e.kind() == IoErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let identity = Identity::generate();
        tokio::fs::write(&path, identity.as_str()).await?;
        info!(%identity, "Generated new identity");
        Ok(identity)
    }

    /// Last known profile, if any. Corrupt JSON counts as absent.
    pub async fn load_profile(&self) -> AppResult<Option<Profile>> {
        let path = self.dir.join(PROFILE_FILE);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&raw) {
            Ok(profile) => Ok(Some(profile)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring corrupt cached profile");
                Ok(None)
            }
        }
    }

    /// Overwrite the cached profile.
    pub async fn save_profile(&self, profile: &Profile) -> AppResult<()> {
        let json = serde_json::to_string_pretty(profile)?;
        tokio::fs::write(self.dir.join(PROFILE_FILE), json).await?;
        Ok(())
    }
}
