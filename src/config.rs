//! Runtime configuration resolved from the command line and the
//! executable's directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Cli;

/// Base URLs of the provider's API hosts.
///
/// Tests point every host at a mock server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Provisioning, groups, orgs, email settings, audit, admin settings.
    pub apps: String,
    /// Calendar, profiles, reporting and the OAuth token endpoints.
    pub www: String,
    /// Group settings and admin audit (JSON).
    pub googleapis: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            apps: "https://apps-apis.google.com".to_string(),
            www: "https://www.google.com".to_string(),
            googleapis: "https://www.googleapis.com".to_string(),
        }
    }
}

impl Endpoints {
    /// Every host rooted at one base URL.
    pub fn single(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            apps: base.clone(),
            www: base.clone(),
            googleapis: base,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the executable; relative paths resolve against it.
    pub gam_dir: PathBuf,
    pub oauth_file: PathBuf,
    pub debug: bool,
    pub timeout: Duration,
    pub endpoints: Endpoints,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Self {
        let gam_dir = executable_dir();
        let oauth_file = resolve(&gam_dir, &cli.oauth_file);
        let debug = cli.debug || gam_dir.join("debug.gam").is_file();
        Self {
            gam_dir,
            oauth_file,
            debug,
            timeout: Duration::from_millis(cli.timeout_ms),
            endpoints: Endpoints::default(),
        }
    }

    /// Configuration rooted at `dir`, used by tests.
    pub fn in_dir(dir: &Path, endpoints: Endpoints) -> Self {
        Self {
            gam_dir: dir.to_path_buf(),
            oauth_file: dir.join("oauth.txt"),
            debug: false,
            timeout: Duration::from_secs(10),
            endpoints,
        }
    }

    /// Resolves a file name the way the credential file is resolved.
    pub fn path(&self, name: impl AsRef<Path>) -> PathBuf {
        resolve(&self.gam_dir, name.as_ref())
    }
}

fn resolve(dir: &Path, name: &Path) -> PathBuf {
    if name.is_absolute() {
        name.to_path_buf()
    } else {
        dir.join(name)
    }
}

fn executable_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.canonicalize().ok())
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_names_resolve_against_gam_dir() {
        let config = Config::in_dir(Path::new("/opt/gam"), Endpoints::default());
        assert_eq!(config.path("oauth.txt"), PathBuf::from("/opt/gam/oauth.txt"));
        assert_eq!(config.path("/tmp/x.txt"), PathBuf::from("/tmp/x.txt"));
    }

    #[test]
    fn single_endpoint_strips_trailing_slash() {
        let e = Endpoints::single("http://127.0.0.1:9000/");
        assert_eq!(e.apps, "http://127.0.0.1:9000");
        assert_eq!(e.googleapis, e.www);
    }
}
