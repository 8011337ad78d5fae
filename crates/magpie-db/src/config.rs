//! Connection configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Configuration of one pool member.
///
/// The endpoint is a host/port pair or a unix socket path; a set socket
/// takes precedence. An empty allow-list means the connection serves any
/// table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Connection id; auto-assigned at construction when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Server host name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Server port; drivers default to 3306 when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Unix socket path; takes precedence over host/port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket: Option<String>,
    /// Database name.
    #[serde(default)]
    pub database: String,
    /// User name.
    #[serde(default)]
    pub username: String,
    /// Password.
    #[serde(default)]
    pub password: String,
    /// Character set, applied with `SET NAMES` right after connect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charset: Option<String>,
    /// Driver-specific options, passed through verbatim.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
    /// Tables this connection is permitted to serve; empty = unrestricted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow: Vec<String>,
}

impl ConnectionConfig {
    /// Creates a configuration for the given database.
    #[must_use]
    pub fn new(database: &str) -> Self {
        Self {
            database: String::from(database),
            ..Self::default()
        }
    }

    /// Sets the connection id.
    #[must_use]
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(String::from(id));
        self
    }

    /// Sets the server host.
    #[must_use]
    pub fn host(mut self, host: &str) -> Self {
        self.host = Some(String::from(host));
        self
    }

    /// Sets the server port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the unix socket path.
    #[must_use]
    pub fn socket(mut self, socket: &str) -> Self {
        self.socket = Some(String::from(socket));
        self
    }

    /// Sets the credentials.
    #[must_use]
    pub fn credentials(mut self, username: &str, password: &str) -> Self {
        self.username = String::from(username);
        self.password = String::from(password);
        self
    }

    /// Sets the character set.
    #[must_use]
    pub fn charset(mut self, charset: &str) -> Self {
        self.charset = Some(String::from(charset));
        self
    }

    /// Sets a driver option.
    #[must_use]
    pub fn option(mut self, key: &str, value: &str) -> Self {
        self.options.insert(String::from(key), String::from(value));
        self
    }

    /// Restricts the connection to the given tables.
    #[must_use]
    pub fn allow(mut self, tables: &[&str]) -> Self {
        self.allow = tables.iter().map(|t| String::from(*t)).collect();
        self
    }

    /// Returns the endpoint: the socket path when set, the host otherwise.
    #[must_use]
    pub fn source(&self) -> &str {
        self.socket
            .as_deref()
            .or(self.host.as_deref())
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = ConnectionConfig::new("test")
            .host("localhost")
            .port(3307)
            .credentials("root", "secret")
            .charset("utf8mb4")
            .allow(&["user", "order"]);
        assert_eq!(config.database, "test");
        assert_eq!(config.port, Some(3307));
        assert_eq!(config.allow.len(), 2);
    }

    #[test]
    fn test_source_prefers_socket() {
        let config = ConnectionConfig::new("test")
            .host("localhost")
            .socket("/var/run/mysqld.sock");
        assert_eq!(config.source(), "/var/run/mysqld.sock");
    }

    #[test]
    fn test_source_falls_back_to_host() {
        let config = ConnectionConfig::new("test").host("db1");
        assert_eq!(config.source(), "db1");
    }
}
