use std::fs;
use std::io::{self, BufRead, ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Environment override for the access token; takes precedence over the
/// credential file.
pub const TOKEN_ENV_VAR: &str = "RSBASIN_TOKEN";

/// Environment override for the credential file location.
pub const CREDENTIALS_ENV_VAR: &str = "RSBASIN_CREDENTIALS";

const CREDENTIALS_REL_PATH: &str = ".config/rsbasin/credentials.json";

/// URL shown to the user during the interactive flow; the platform issues
/// tokens out of band.
const AUTH_HELP_URL: &str = "https://code.earthengine.google.com";

/// Bearer credentials for the geospatial compute platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
}

impl Credentials {
    /// Load stored credentials: the token env var if set, otherwise the
    /// credential file.
    pub fn stored() -> Result<Credentials, EngineError> {
        if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
            if !token.trim().is_empty() {
                return Ok(Credentials {
                    access_token: token.trim().to_string(),
                });
            }
        }
        Credentials::load_from(&credential_path()?)
    }

    /// One-shot interactive credential acquisition: print instructions, read
    /// a pasted token from stdin, persist it for later runs. The caller
    /// decides whether to retry afterwards; this flow itself never loops.
    pub fn acquire_interactive() -> Result<Credentials, EngineError> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        writeln!(out, "Authentication required.")?;
        writeln!(
            out,
            "Obtain an access token for your project at {} and paste it below.",
            AUTH_HELP_URL
        )?;
        write!(out, "Access token: ")?;
        out.flush()?;

        let stdin = io::stdin();
        let credentials = Credentials::read_token(&mut stdin.lock())?;
        let path = credential_path()?;
        credentials.save_to(&path)?;
        log::info!("stored credentials at {}", path.display());
        Ok(credentials)
    }

    fn read_token(reader: &mut impl BufRead) -> Result<Credentials, EngineError> {
        let mut line = String::new();
        reader.read_line(&mut line)?;
        let token = line.trim();
        if token.is_empty() {
            return Err(EngineError::MissingCredentials(
                "no token entered".to_string(),
            ));
        }
        Ok(Credentials {
            access_token: token.to_string(),
        })
    }

    fn load_from(path: &Path) -> Result<Credentials, EngineError> {
        let raw = fs::read_to_string(path).map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                EngineError::MissingCredentials(format!(
                    "no credential file at {}",
                    path.display()
                ))
            } else {
                EngineError::CredentialStore(err)
            }
        })?;
        let credentials: Credentials = serde_json::from_str(&raw)?;
        if credentials.access_token.trim().is_empty() {
            return Err(EngineError::MissingCredentials(format!(
                "empty access token in {}",
                path.display()
            )));
        }
        Ok(credentials)
    }

    fn save_to(&self, path: &Path) -> Result<(), EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

fn credential_path() -> Result<PathBuf, EngineError> {
    if let Ok(path) = std::env::var(CREDENTIALS_ENV_VAR) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    let home = std::env::var("HOME").map_err(|_| {
        EngineError::MissingCredentials("HOME is not set; cannot locate credentials".to_string())
    })?;
    Ok(PathBuf::from(home).join(CREDENTIALS_REL_PATH))
}
