use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use crate::{Error, Result};

/// Port the load listens and answers on.
pub const DEFAULT_PORT: u16 = 18190;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(200);

/// Endpoints and tuning for one driver session.
///
/// The load replies to the port it was addressed on, so by default the
/// local socket binds the same port as the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub local: SocketAddr,
    pub remote: SocketAddr,
    pub timeout: Duration,
    pub verbose: bool,
}

impl SessionConfig {
    pub fn new(target: IpAddr) -> Self {
        SessionConfig {
            local: SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), DEFAULT_PORT),
            remote: SocketAddr::new(target, DEFAULT_PORT),
            timeout: DEFAULT_TIMEOUT,
            verbose: false,
        }
    }

    pub fn with_local(mut self, local: SocketAddr) -> Self {
        self.local = local;
        self
    }

    /// Binds to `source` on the current local port.
    pub fn with_source_ip(mut self, source: IpAddr) -> Self {
        self.local.set_ip(source);
        self
    }

    /// Sets both the local and the remote port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.local.set_port(port);
        self.remote.set_port(port);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_verbosity(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Reads the session from `MP71077X_TARGET` (required), `MP71077X_SOURCE`,
    /// `MP71077X_PORT`, `MP71077X_TIMEOUT_MS` and `MP71077X_VERBOSE`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let target = lookup("MP71077X_TARGET")
            .ok_or_else(|| Error::Config("Environment variable MP71077X_TARGET not set!".into()))?;
        let mut config = SessionConfig::new(parse("MP71077X_TARGET", &target)?);

        if let Some(source) = lookup("MP71077X_SOURCE") {
            config = config.with_source_ip(parse("MP71077X_SOURCE", &source)?);
        }
        if let Some(port) = lookup("MP71077X_PORT") {
            config = config.with_port(parse("MP71077X_PORT", &port)?);
        }
        if let Some(millis) = lookup("MP71077X_TIMEOUT_MS") {
            config = config.with_timeout(Duration::from_millis(parse(
                "MP71077X_TIMEOUT_MS",
                &millis,
            )?));
        }
        if let Some(verbose) = lookup("MP71077X_VERBOSE") {
            config = config.with_verbosity(matches!(
                verbose.to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            ));
        }

        Ok(config)
    }
}

fn parse<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("{key}=`{value}`: {e}")))
}
