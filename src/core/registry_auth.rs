//! Registry credential synchronization for host (de)registration.
//!
//! Installs or retracts the subscription-issued registry credential in the
//! container engines' shared credential stores. Store maintenance is best
//! effort by design: a broken or unwritable store must never fail the host
//! (de)registration itself, and one store's failure must not keep the other
//! from being updated.

use crate::constants;
use crate::core::auth_store::{self, AuthEntry, AuthFile};
use crate::models::registry::RegistryCredentials;
use crate::util::system::{Ownership, SystemAccess};
use anyhow::{Context, Result};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Docker,
    Podman,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Docker => write!(f, "docker"),
            StoreKind::Podman => write!(f, "podman"),
        }
    }
}

/// A resolved credential store location.
#[derive(Debug, Clone)]
pub struct StoreLocation {
    pub kind: StoreKind,
    pub path: PathBuf,
}

/// Resolve the credential stores for the current user and session.
///
/// Each location resolves independently: a missing home directory or an
/// unset runtime directory only drops its own store.
pub fn known_stores(system: &dyn SystemAccess) -> Vec<StoreLocation> {
    let mut stores = Vec::new();
    if let Some(home) = system.home_dir() {
        stores.push(StoreLocation {
            kind: StoreKind::Docker,
            path: home.join(constants::DOCKER_CONFIG_PATH),
        });
    }
    if let Some(runtime) = system.runtime_dir() {
        stores.push(StoreLocation {
            kind: StoreKind::Podman,
            path: runtime.join(constants::PODMAN_AUTH_PATH),
        });
    }
    stores
}

enum StoreUpdate<'a> {
    Install(&'a AuthEntry),
    Retract(&'a AuthEntry),
}

/// Install the issued credential into every known store.
///
/// Never returns an error: store failures are reported on stderr and
/// absorbed so they cannot interrupt the registration flow.
pub fn setup_registry_authentication(system: &dyn SystemAccess, login: &str, password: &str) {
    let credentials = RegistryCredentials::new(login, password);
    let entry = AuthEntry::new(credentials.auth_token());
    sync_stores(
        system,
        constants::DEFAULT_REGISTRY,
        StoreUpdate::Install(&entry),
    );
}

/// Retract a previously installed credential from every known store.
///
/// Entries that no longer hold the issued secret are left alone; like setup,
/// this never surfaces an error to the deregistration flow.
pub fn remove_registry_authentication(system: &dyn SystemAccess, login: &str, password: &str) {
    let credentials = RegistryCredentials::new(login, password);
    let entry = AuthEntry::new(credentials.auth_token());
    sync_stores(
        system,
        constants::DEFAULT_REGISTRY,
        StoreUpdate::Retract(&entry),
    );
}

fn sync_stores(system: &dyn SystemAccess, registry: &str, update: StoreUpdate<'_>) {
    let stores = known_stores(system);
    if stores.is_empty() {
        return;
    }
    let owner = match resolve_ownership(system) {
        Ok(owner) => owner,
        Err(err) => {
            eprintln!("warning: registry credential stores skipped: {}", err);
            return;
        }
    };
    for store in stores {
        if let Err(err) = update_store(system, &store, registry, &update, owner) {
            eprintln!("warning: {} credential store skipped: {}", store.kind, err);
        }
    }
}

/// Ownership for everything written in one operation, taken from a directory
/// that predates this process: the runtime directory when the session has
/// one, the home directory otherwise. Stat-ing a directory we just created
/// ourselves would report the elevated identity instead of the invoking user.
fn resolve_ownership(system: &dyn SystemAccess) -> Result<Ownership> {
    let base = system
        .runtime_dir()
        .or_else(|| system.home_dir())
        .context("no runtime or home directory to take ownership from")?;
    system.owner_of(&base)
}

fn update_store(
    system: &dyn SystemAccess,
    store: &StoreLocation,
    registry: &str,
    update: &StoreUpdate<'_>,
    owner: Ownership,
) -> Result<()> {
    let dir = store
        .path
        .parent()
        .context("store path has no parent directory")?;
    system.make_dir_all(dir, constants::AUTH_DIR_MODE)?;
    system.set_owner(dir, owner)?;

    let raw = system.read_file(&store.path)?;
    let mut file = match &raw {
        Some(bytes) => auth_store::decode(bytes)
            .with_context(|| format!("decode {}", store.path.display()))?,
        None => AuthFile::default(),
    };

    match update {
        StoreUpdate::Install(entry) => auth_store::upsert(&mut file, registry, (*entry).clone()),
        StoreUpdate::Retract(entry) => {
            if raw.is_none() {
                // nothing stored, nothing to retract
                return Ok(());
            }
            auth_store::remove_matching(&mut file, registry, entry);
        }
    }

    let encoded = auth_store::encode(&file)?;
    system.write_file(&store.path, &encoded, constants::AUTH_FILE_MODE)?;
    system.set_owner(&store.path, owner)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use nix::unistd::{Gid, Uid};
    use std::cell::RefCell;
    use std::collections::{BTreeMap, BTreeSet};
    use std::path::Path;

    const LOGIN: &str = "REG_a9b5e32370fb41e1";
    const PASSWORD: &str = "a3cd1331fb714e82";

    fn issued_token() -> String {
        STANDARD.encode(format!("{}:{}", LOGIN, PASSWORD))
    }

    struct FakeSystem {
        home: Option<PathBuf>,
        runtime: Option<PathBuf>,
        owner: Ownership,
        files: RefCell<BTreeMap<PathBuf, Vec<u8>>>,
        dirs: RefCell<BTreeSet<PathBuf>>,
        chowns: RefCell<Vec<PathBuf>>,
        unreadable: BTreeSet<PathBuf>,
        unwritable: BTreeSet<PathBuf>,
        unstatable: bool,
    }

    impl FakeSystem {
        fn new() -> Self {
            Self {
                home: Some(PathBuf::from("/home/user")),
                runtime: Some(PathBuf::from("/run/user/1000")),
                owner: Ownership {
                    uid: Uid::from_raw(1000),
                    gid: Gid::from_raw(100),
                },
                files: RefCell::default(),
                dirs: RefCell::default(),
                chowns: RefCell::default(),
                unreadable: BTreeSet::new(),
                unwritable: BTreeSet::new(),
                unstatable: false,
            }
        }

        fn docker_path(&self) -> PathBuf {
            PathBuf::from("/home/user").join(constants::DOCKER_CONFIG_PATH)
        }

        fn podman_path(&self) -> PathBuf {
            PathBuf::from("/run/user/1000").join(constants::PODMAN_AUTH_PATH)
        }

        fn seed(&self, path: &Path, content: &str) {
            self.files
                .borrow_mut()
                .insert(path.to_path_buf(), content.as_bytes().to_vec());
        }

        fn stored(&self, path: &Path) -> Option<AuthFile> {
            let raw = self.files.borrow().get(path).cloned()?;
            Some(auth_store::decode(&raw).unwrap())
        }

        fn write_count(&self) -> usize {
            self.files.borrow().len()
        }
    }

    impl SystemAccess for FakeSystem {
        fn home_dir(&self) -> Option<PathBuf> {
            self.home.clone()
        }

        fn runtime_dir(&self) -> Option<PathBuf> {
            self.runtime.clone()
        }

        fn read_file(&self, path: &Path) -> Result<Option<Vec<u8>>> {
            if self.unreadable.contains(path) {
                bail!("permission denied reading {}", path.display());
            }
            Ok(self.files.borrow().get(path).cloned())
        }

        fn write_file(&self, path: &Path, content: &[u8], _mode: u32) -> Result<()> {
            if self.unwritable.contains(path) {
                bail!("permission denied writing {}", path.display());
            }
            self.files
                .borrow_mut()
                .insert(path.to_path_buf(), content.to_vec());
            Ok(())
        }

        fn make_dir_all(&self, path: &Path, _mode: u32) -> Result<()> {
            self.dirs.borrow_mut().insert(path.to_path_buf());
            Ok(())
        }

        fn owner_of(&self, path: &Path) -> Result<Ownership> {
            if self.unstatable {
                bail!("cannot stat {}", path.display());
            }
            Ok(self.owner)
        }

        fn set_owner(&self, path: &Path, owner: Ownership) -> Result<()> {
            assert_eq!(owner, self.owner);
            self.chowns.borrow_mut().push(path.to_path_buf());
            Ok(())
        }
    }

    const SEEDED_DOCKER: &str = r#"{
        "auths": {"internal.example.org": {"auth": "aW50ZXJuYWw="}},
        "credHelpers": {"gcr.example.org": "gcloud"}
    }"#;

    #[test]
    fn test_setup_updates_both_stores() {
        let system = FakeSystem::new();
        system.seed(&system.docker_path(), SEEDED_DOCKER);

        setup_registry_authentication(&system, LOGIN, PASSWORD);

        let docker = system.stored(&system.docker_path()).unwrap();
        assert_eq!(docker.auths[constants::DEFAULT_REGISTRY].auth, issued_token());
        assert_eq!(docker.auths["internal.example.org"].auth, "aW50ZXJuYWw=");
        assert!(docker.extra.contains_key("credHelpers"));

        let podman = system.stored(&system.podman_path()).unwrap();
        assert_eq!(podman.auths[constants::DEFAULT_REGISTRY].auth, issued_token());
        assert_eq!(podman.auths.len(), 1);
    }

    #[test]
    fn test_setup_creates_parent_directories() {
        let system = FakeSystem::new();
        setup_registry_authentication(&system, LOGIN, PASSWORD);
        let dirs = system.dirs.borrow();
        assert!(dirs.contains(Path::new("/home/user/.docker")));
        assert!(dirs.contains(Path::new("/run/user/1000/containers")));
    }

    #[test]
    fn test_setup_survives_unreadable_store() {
        let mut system = FakeSystem::new();
        system.unreadable.insert(system.docker_path());

        setup_registry_authentication(&system, LOGIN, PASSWORD);

        assert!(system.stored(&system.docker_path()).is_none());
        let podman = system.stored(&system.podman_path()).unwrap();
        assert_eq!(podman.auths[constants::DEFAULT_REGISTRY].auth, issued_token());
    }

    #[test]
    fn test_setup_survives_write_failure() {
        let mut system = FakeSystem::new();
        system.unwritable.insert(system.docker_path());

        setup_registry_authentication(&system, LOGIN, PASSWORD);

        let podman = system.stored(&system.podman_path()).unwrap();
        assert_eq!(podman.auths[constants::DEFAULT_REGISTRY].auth, issued_token());
    }

    #[test]
    fn test_setup_survives_malformed_store() {
        let system = FakeSystem::new();
        system.seed(&system.docker_path(), "not json at all");

        setup_registry_authentication(&system, LOGIN, PASSWORD);

        // the malformed store is left as-is, the healthy one is updated
        let raw = system.files.borrow()[&system.docker_path()].clone();
        assert_eq!(raw, b"not json at all");
        let podman = system.stored(&system.podman_path()).unwrap();
        assert_eq!(podman.auths[constants::DEFAULT_REGISTRY].auth, issued_token());
    }

    #[test]
    fn test_remove_deletes_matching_entry() {
        let system = FakeSystem::new();
        system.seed(
            &system.docker_path(),
            &format!(
                r#"{{"auths": {{"{}": {{"auth": "{}"}}, "internal.example.org": {{"auth": "aW50ZXJuYWw="}}}}}}"#,
                constants::DEFAULT_REGISTRY,
                issued_token()
            ),
        );

        remove_registry_authentication(&system, LOGIN, PASSWORD);

        let docker = system.stored(&system.docker_path()).unwrap();
        assert!(!docker.auths.contains_key(constants::DEFAULT_REGISTRY));
        assert_eq!(docker.auths["internal.example.org"].auth, "aW50ZXJuYWw=");
    }

    #[test]
    fn test_remove_spares_custom_entry() {
        let system = FakeSystem::new();
        let custom = STANDARD.encode("custom:secret");
        system.seed(
            &system.docker_path(),
            &format!(
                r#"{{"auths": {{"{}": {{"auth": "{}"}}}}}}"#,
                constants::DEFAULT_REGISTRY,
                custom
            ),
        );
        let before = system.stored(&system.docker_path()).unwrap();

        remove_registry_authentication(&system, LOGIN, PASSWORD);

        assert_eq!(system.stored(&system.docker_path()).unwrap(), before);
    }

    #[test]
    fn test_remove_absent_stores_writes_nothing() {
        let system = FakeSystem::new();
        remove_registry_authentication(&system, LOGIN, PASSWORD);
        assert_eq!(system.write_count(), 0);
    }

    #[test]
    fn test_remove_unreadable_store_writes_nothing() {
        let mut system = FakeSystem::new();
        system.unreadable.insert(system.docker_path());
        system.unreadable.insert(system.podman_path());

        remove_registry_authentication(&system, LOGIN, PASSWORD);

        assert_eq!(system.write_count(), 0);
    }

    #[test]
    fn test_runtime_dir_unset_still_updates_home_store() {
        let mut system = FakeSystem::new();
        system.runtime = None;

        setup_registry_authentication(&system, LOGIN, PASSWORD);

        let docker = system.stored(&system.docker_path()).unwrap();
        assert_eq!(docker.auths[constants::DEFAULT_REGISTRY].auth, issued_token());
        assert!(system.stored(&system.podman_path()).is_none());
    }

    #[test]
    fn test_missing_home_still_updates_runtime_store() {
        let mut system = FakeSystem::new();
        system.home = None;

        setup_registry_authentication(&system, LOGIN, PASSWORD);

        let podman = system.stored(&system.podman_path()).unwrap();
        assert_eq!(podman.auths[constants::DEFAULT_REGISTRY].auth, issued_token());
        assert_eq!(system.write_count(), 1);
    }

    #[test]
    fn test_ownership_applied_to_directories_and_files() {
        let system = FakeSystem::new();
        setup_registry_authentication(&system, LOGIN, PASSWORD);

        let chowns = system.chowns.borrow();
        assert!(chowns.contains(&PathBuf::from("/home/user/.docker")));
        assert!(chowns.contains(&system.docker_path()));
        assert!(chowns.contains(&PathBuf::from("/run/user/1000/containers")));
        assert!(chowns.contains(&system.podman_path()));
    }

    #[test]
    fn test_ownership_failure_skips_all_stores() {
        let mut system = FakeSystem::new();
        system.unstatable = true;

        setup_registry_authentication(&system, LOGIN, PASSWORD);

        assert_eq!(system.write_count(), 0);
    }

    #[test]
    fn test_known_stores_resolve_independently() {
        let mut system = FakeSystem::new();
        system.home = None;
        let stores = known_stores(&system);
        assert_eq!(stores.len(), 1);
        assert_eq!(stores[0].kind, StoreKind::Podman);
        assert_eq!(stores[0].path, system.podman_path());
    }
}
