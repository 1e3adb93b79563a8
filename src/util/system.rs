//! Filesystem and identity access behind an injectable capability.
//!
//! The registry credential sync runs with elevated privileges on behalf of a
//! normal user; everything it touches on disk goes through [`SystemAccess`]
//! so tests can substitute an in-memory double.

use crate::constants;
use crate::util::fs as util_fs;
use anyhow::{Context, Result};
use nix::unistd::{Gid, Uid};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// The (uid, gid) pair applied to files and directories written on behalf of
/// the invoking user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ownership {
    pub uid: Uid,
    pub gid: Gid,
}

/// Filesystem and identity operations used by the credential store writer.
pub trait SystemAccess {
    /// Home directory of the invoking user, when resolvable.
    fn home_dir(&self) -> Option<PathBuf>;

    /// Per-user runtime directory, when the environment provides one.
    fn runtime_dir(&self) -> Option<PathBuf>;

    /// Read a file. `Ok(None)` when it does not exist; any other failure is
    /// an error.
    fn read_file(&self, path: &Path) -> Result<Option<Vec<u8>>>;

    /// Write a file with the given permission mode.
    fn write_file(&self, path: &Path, content: &[u8], mode: u32) -> Result<()>;

    /// Create a directory and missing parents; newly created directories get
    /// the given mode.
    fn make_dir_all(&self, path: &Path, mode: u32) -> Result<()>;

    /// The (uid, gid) currently owning `path`.
    fn owner_of(&self, path: &Path) -> Result<Ownership>;

    /// Reassign `path` to `owner`.
    fn set_owner(&self, path: &Path, owner: Ownership) -> Result<()>;
}

/// Production implementation backed by the real filesystem.
pub struct RealSystem;

impl SystemAccess for RealSystem {
    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    fn runtime_dir(&self) -> Option<PathBuf> {
        env::var_os(constants::RUNTIME_DIR_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    }

    fn read_file(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("read {}", path.display())),
        }
    }

    fn write_file(&self, path: &Path, content: &[u8], mode: u32) -> Result<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("create temp file in {}", dir.display()))?;
        tmp.write_all(content)
            .with_context(|| format!("write {}", path.display()))?;
        tmp.flush().ok();

        #[cfg(unix)]
        {
            let perm = fs::Permissions::from_mode(mode);
            tmp.as_file()
                .set_permissions(perm)
                .with_context(|| format!("set permissions on {}", path.display()))?;
        }

        tmp.persist(path)
            .map_err(|err| anyhow::anyhow!("persist {}: {}", path.display(), err))?;
        Ok(())
    }

    fn make_dir_all(&self, path: &Path, mode: u32) -> Result<()> {
        util_fs::ensure_dir(path, mode)
    }

    fn owner_of(&self, path: &Path) -> Result<Ownership> {
        let meta = fs::metadata(path).with_context(|| format!("stat {}", path.display()))?;
        Ok(Ownership {
            uid: Uid::from_raw(meta.uid()),
            gid: Gid::from_raw(meta.gid()),
        })
    }

    fn set_owner(&self, path: &Path, owner: Ownership) -> Result<()> {
        nix::unistd::chown(path, Some(owner.uid), Some(owner.gid))
            .with_context(|| format!("chown {}", path.display()))
    }
}
