//! Centralized constants for registry hosts, store paths, and permissions.

/// Container registry served by the subscription service.
pub const DEFAULT_REGISTRY: &str = "registry.hostlink.dev";

/// Docker-style credential store, relative to the invoking user's home.
pub const DOCKER_CONFIG_PATH: &str = ".docker/config.json";

/// Podman-style credential store, relative to the runtime directory.
pub const PODMAN_AUTH_PATH: &str = "containers/auth.json";

/// Environment variable naming the per-user runtime directory.
pub const RUNTIME_DIR_ENV: &str = "XDG_RUNTIME_DIR";

/// Permission mode for newly created store parent directories.
pub const AUTH_DIR_MODE: u32 = 0o777;

/// Permission mode for written credential store files.
pub const AUTH_FILE_MODE: u32 = 0o600;

/// Package manager binary queried for products, services, and repositories.
pub const PACKAGE_MANAGER: &str = "zypper";

/// Root the OEM release-type lookup is resolved against.
pub const DEFAULT_FILESYSTEM_ROOT: &str = "/";

/// OEM release-type directory, relative to the filesystem root.
pub const OEM_RELEASE_DIR: &str = "var/lib/hostlink/oem";

/// Package manager exit code: success.
pub const ZYPPER_EXIT_OK: i32 = 0;

/// Package manager exit code: no repositories defined.
pub const ZYPPER_EXIT_NO_REPOS: i32 = 6;

/// Package manager exit code: search matched nothing.
pub const ZYPPER_EXIT_CAP_NOT_FOUND: i32 = 104;

/// Repository priority reported when the attribute is absent.
pub const DEFAULT_REPO_PRIORITY: i32 = 99;
