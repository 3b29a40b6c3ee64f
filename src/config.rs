//! Auth file configuration
//!
//! Credentials can be kept in a small JSON file instead of being passed on
//! the command line:
//!
//! ```json
//! {
//!   "dhis": {
//!     "baseurl": "https://play.dhis2.org/demo",
//!     "username": "admin",
//!     "password": "district"
//!   }
//! }
//! ```
//!
//! Without an explicit path the file is looked up as `$DHIS_HOME/dish.json`,
//! then by searching the home directory for `dish.json`.

use crate::error::{Error, Result};
use crate::utils::load_json;
use serde::Deserialize;
use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default auth file name
pub const AUTH_FILE_NAME: &str = "dish.json";

/// Environment variable naming the directory holding the auth file
pub const DHIS_HOME_ENV: &str = "DHIS_HOME";

// ============================================================================
// Auth File
// ============================================================================

/// Top-level auth file layout
#[derive(Debug, Clone, Deserialize)]
pub struct AuthFile {
    /// Server section
    pub dhis: AuthSection,
}

/// Server and credentials from an auth file
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct AuthSection {
    /// Server base URL
    #[serde(default)]
    pub baseurl: String,
    /// Username
    #[serde(default)]
    pub username: String,
    /// Password
    #[serde(default)]
    pub password: String,
}

impl AuthSection {
    fn is_complete(&self) -> bool {
        !self.baseurl.is_empty() && !self.username.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for AuthSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSection")
            .field("baseurl", &self.baseurl)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Load and check an auth file
pub fn load_auth_file(path: &Path) -> Result<AuthSection> {
    let value = load_json(path)?;
    let invalid = || Error::client(format!("Auth file found but not valid: {}", path.display()));

    let file: AuthFile = serde_json::from_value(value).map_err(|_| invalid())?;
    if !file.dhis.is_complete() {
        return Err(invalid());
    }

    debug!("Loaded auth file {}", path.display());
    Ok(file.dhis)
}

// ============================================================================
// Search
// ============================================================================

/// Locate the auth file from the environment
pub fn search_auth_file(filename: &str) -> Result<PathBuf> {
    let dhis_home = std::env::var_os(DHIS_HOME_ENV).map(PathBuf::from);
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from);
    search_auth_file_in(dhis_home.as_deref(), home.as_deref(), filename)
}

/// Locate the auth file given the `DHIS_HOME` and home directories
///
/// `DHIS_HOME` wins whenever it is set; the file is not checked for
/// existence there. Otherwise the home directory is searched breadth-first.
pub fn search_auth_file_in(
    dhis_home: Option<&Path>,
    home: Option<&Path>,
    filename: &str,
) -> Result<PathBuf> {
    if let Some(dir) = dhis_home {
        return Ok(dir.join(filename));
    }

    if let Some(home) = home {
        if let Some(found) = find_file(home, filename) {
            return Ok(found);
        }
    }

    Err(Error::client(format!(
        "'{filename}' not found - searched in ${DHIS_HOME_ENV} and in home folder"
    )))
}

/// Breadth-first search for `filename` below `root`, skipping symlinks and
/// unreadable directories
fn find_file(root: &Path, filename: &str) -> Option<PathBuf> {
    let mut queue = VecDeque::from([root.to_path_buf()]);

    while let Some(dir) = queue.pop_front() {
        let candidate = dir.join(filename);
        if candidate.is_file() {
            return Some(candidate);
        }

        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        let mut subdirs: Vec<PathBuf> = entries
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
            .map(|e| e.path())
            .collect();
        subdirs.sort();
        queue.extend(subdirs);
    }

    None
}
