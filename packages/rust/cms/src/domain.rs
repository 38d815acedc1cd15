//! Tenant domain resolution from the request host.

use std::fmt;
use std::net::IpAddr;

use serde::Serialize;
use sitekit_storage::{DEV_DOMAIN_KEY, PreferenceStore};
use tracing::{debug, warn};
use url::{Host, Url};

/// Host names treated as a local development machine.
const LOOPBACK_HOSTS: [&str; 2] = ["localhost", "localhost.localdomain"];

/// The key a tenant is looked up by (the site's `domain` field).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DomainKey(String);

impl DomainKey {
    pub fn new(domain: impl Into<String>) -> Self {
        Self(domain.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DomainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives a [`DomainKey`] from the ambient host context.
#[derive(Debug, Clone)]
pub struct DomainResolver {
    host: Option<String>,
    base_domain: String,
}

impl DomainResolver {
    /// `host` is the request host (`Host` header or `--host`), `None` when
    /// running without one.
    pub fn new(host: Option<String>, base_domain: impl Into<String>) -> Self {
        Self {
            host,
            base_domain: base_domain.into(),
        }
    }

    /// Resolve the tenant key. Never fails; every path yields a usable key.
    pub async fn resolve<S: PreferenceStore>(&self, store: &S) -> DomainKey {
        let Some(host) = self.host.as_deref().map(normalize_host) else {
            debug!(base = %self.base_domain, "no host context, using base domain");
            return DomainKey::new(&self.base_domain);
        };

        if host.is_empty() {
            return DomainKey::new(&self.base_domain);
        }

        if !is_loopback(&host) {
            return DomainKey::new(host);
        }

        match store.get(DEV_DOMAIN_KEY).await {
            Ok(Some(domain)) if !domain.trim().is_empty() => {
                debug!(%domain, "loopback host, using stored dev domain");
                DomainKey::new(domain.trim())
            }
            Ok(_) => DomainKey::new(&self.base_domain),
            Err(e) => {
                warn!(error = %e, "failed to read dev domain override");
                DomainKey::new(&self.base_domain)
            }
        }
    }
}

/// Lower-case the host and strip any port (`[::1]:3000` → `::1`).
///
/// Returns an empty string for hosts that don't parse.
fn normalize_host(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(ip) = raw.parse::<IpAddr>() {
        return ip.to_string();
    }
    let host = match Url::parse(&format!("http://{raw}")) {
        Ok(url) => match url.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(ip)) => ip.to_string(),
            Some(Host::Ipv6(ip)) => ip.to_string(),
            None => String::new(),
        },
        Err(e) => {
            debug!(host = raw, error = %e, "unparseable host");
            String::new()
        }
    };
    host.trim_end_matches('.').to_ascii_lowercase()
}

fn is_loopback(host: &str) -> bool {
    if LOOPBACK_HOSTS.contains(&host) {
        return true;
    }
    host.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback())
}
