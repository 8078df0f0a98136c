use anyhow::{Context, Result};
use serde_json::Value;

use crate::engine::auth::Credentials;
use crate::engine::transport::{HttpTransport, Transport, DEFAULT_ENDPOINT, ENDPOINT_ENV_VAR};
use crate::error::EngineError;
use crate::query::expr::Expr;

/// An authenticated session against one platform project.
///
/// All lazy handles funnel through [`Session::evaluate`] when they are
/// materialized; that call is the process's only I/O with the platform.
pub struct Session {
    project: String,
    transport: Box<dyn Transport>,
}

impl Session {
    /// Initialize a session against a fixed project.
    ///
    /// On any bootstrap failure the interactive credential flow runs exactly
    /// once, then connection is retried. A second failure is fatal and
    /// propagates to the caller; there is no further fallback.
    pub fn connect(project: &str) -> Result<Session> {
        Session::bootstrap(
            |credentials| Session::open(project, credentials),
            Credentials::stored,
            Credentials::acquire_interactive,
        )
    }

    /// Credential fallback chain behind [`Session::connect`]. The retry uses
    /// the credentials returned by `acquire` directly, so a stale token env
    /// var cannot shadow the token the user just entered.
    fn bootstrap(
        attempt: impl Fn(&Credentials) -> Result<Session>,
        stored: impl FnOnce() -> Result<Credentials, EngineError>,
        acquire: impl FnOnce() -> Result<Credentials, EngineError>,
    ) -> Result<Session> {
        let first = stored()
            .context("loading stored credentials")
            .and_then(|credentials| attempt(&credentials));
        match first {
            Ok(session) => Ok(session),
            Err(err) => {
                log::warn!("session bootstrap failed: {:#}", err);
                let credentials = acquire().context("interactive authentication failed")?;
                attempt(&credentials)
                    .context("session bootstrap failed after re-authentication")
            }
        }
    }

    fn open(project: &str, credentials: &Credentials) -> Result<Session> {
        let endpoint =
            std::env::var(ENDPOINT_ENV_VAR).unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        let transport = HttpTransport::new(&endpoint, credentials)
            .context("building platform transport")?;
        let session = Session::with_transport(project, Box::new(transport));
        session.probe().context("session validation probe failed")?;
        log::info!("session established for project `{}`", project);
        Ok(session)
    }

    /// Build a session over an explicit transport. Used by tests and by
    /// callers targeting non-standard deployments.
    pub fn with_transport(project: &str, transport: Box<dyn Transport>) -> Session {
        Session {
            project: project.to_string(),
            transport,
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Trivial round trip proving the credentials and endpoint are usable.
    fn probe(&self) -> Result<()> {
        let value = self.evaluate(&Expr::constant(1))?;
        anyhow::ensure!(
            value.as_i64() == Some(1),
            "probe returned unexpected value: {}",
            value
        );
        Ok(())
    }

    /// Serialize an expression graph, evaluate it on the platform, and return
    /// the result. Blocking I/O; every query failure surfaces here.
    pub fn evaluate(&self, expr: &Expr) -> Result<Value> {
        log::debug!("materializing expression graph ({} nodes)", expr.node_count());
        let result = self
            .transport
            .compute(&self.project, &expr.encode())
            .context("evaluating expression on the platform")?;
        Ok(result)
    }
}
