//! Base URL normalization

use crate::error::{Error, Result};
use url::Url;

const LOOPBACK_HOSTS: [&str; 3] = ["localhost", "127.0.0.1", "[::1]"];

/// Normalize a server argument into a base URL
///
/// - rejects anything containing `/api`
/// - adds `http://` for loopback hosts and `https://` otherwise, unless a
///   scheme is already given
/// - drops credentials, query, fragment and a trailing `/`
pub fn normalize_base_url(server: &str) -> Result<String> {
    if server.contains("/api") {
        return Err(Error::client(
            "Do not include /api/ in the DHIS2 `server` argument",
        ));
    }

    let server = server.trim();
    if server.is_empty() {
        return Err(Error::client("Must submit a DHIS2 `server`"));
    }

    let url = if server.contains("://") {
        server.to_string()
    } else if is_loopback(server) {
        format!("http://{server}")
    } else {
        format!("https://{server}")
    };

    let parsed = Url::parse(&url)
        .map_err(|e| Error::client(format!("Invalid DHIS2 `server` '{server}': {e}")))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| Error::client(format!("Invalid DHIS2 `server` '{server}': no host")))?;

    let mut base = format!("{}://{}", parsed.scheme(), host);
    if let Some(port) = parsed.port() {
        base.push(':');
        base.push_str(&port.to_string());
    }
    base.push_str(parsed.path().trim_end_matches('/'));

    Ok(base)
}

fn is_loopback(server: &str) -> bool {
    let authority = server.split('/').next().unwrap_or(server);
    LOOPBACK_HOSTS.iter().any(|host| {
        authority == *host
            || authority
                .strip_prefix(host)
                .is_some_and(|rest| rest.starts_with(':'))
    })
}
