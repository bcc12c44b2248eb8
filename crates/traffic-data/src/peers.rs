//! Peer display names read from a WireGuard server config.
//!
//! The config is expected to annotate each `[Peer]` block with a comment of
//! the form `### Client <name>` ahead of its `PublicKey = <key>` line.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use traffic_core::error::{Result, TrafficError};
use traffic_core::masking::MaskPolicy;
use tracing::debug;

const CLIENT_PREFIX: &str = "### Client ";
const PUBLIC_KEY_PREFIX: &str = "PublicKey = ";

/// Immutable lookup from public key to display name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerNameTable {
    names: HashMap<String, String>,
}

impl PeerNameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and parse the config at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|source| TrafficError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::parse(std::io::BufReader::new(file)).map_err(|err| match err {
            TrafficError::Io(source) => TrafficError::FileRead {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        debug!("Loaded {} peer names from {}", table.len(), path.display());
        Ok(table)
    }

    /// Parse config text line by line.
    ///
    /// A `PublicKey` line is attributed to the most recent unclaimed client
    /// header. Keys without one (the server's own `[Interface]` key, or peers
    /// without an annotation) are skipped.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut names = HashMap::new();
        let mut current_client: Option<String> = None;

        for line in reader.lines() {
            let line = line?;
            if let Some(name) = line.strip_prefix(CLIENT_PREFIX) {
                current_client = Some(name.trim().to_string());
                continue;
            }
            if let Some(key) = line.strip_prefix(PUBLIC_KEY_PREFIX) {
                let key = key.trim();
                match current_client.take() {
                    Some(name) => {
                        names.insert(key.to_string(), name);
                    }
                    None => debug!("PublicKey without a client header, skipping"),
                }
            }
        }

        Ok(Self { names })
    }

    /// Display name configured for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.names.get(key).map(String::as_str)
    }

    /// The identity a peer is tracked under: its display name when known,
    /// otherwise the masked key.
    pub fn resolve(&self, key: &str, mask: &MaskPolicy) -> String {
        match self.get(key) {
            Some(name) => name.to_string(),
            None => mask.mask(key),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<(String, String)> for PeerNameTable {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const WG_CONF: &str = "\
[Interface]
Address = 10.66.66.1/24
ListenPort = 51820
PrivateKey = c2VydmVyLXByaXZhdGUta2V5
PublicKey = c2VydmVyLXB1YmxpYy1rZXk=

### Client laptop
[Peer]
PublicKey = bGFwdG9wLWtleQ==
PresharedKey = cHNr
AllowedIPs = 10.66.66.2/32

### Client phone
[Peer]
PublicKey = cGhvbmUva2V5
AllowedIPs = 10.66.66.3/32
";

    #[test]
    fn test_parse_maps_keys_to_client_names() {
        let table = PeerNameTable::parse(WG_CONF.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("bGFwdG9wLWtleQ=="), Some("laptop"));
        assert_eq!(table.get("cGhvbmUva2V5"), Some("phone"));
    }

    #[test]
    fn test_parse_skips_key_without_header() {
        let table = PeerNameTable::parse(WG_CONF.as_bytes()).unwrap();
        assert_eq!(table.get("c2VydmVyLXB1YmxpYy1rZXk="), None);
    }

    #[test]
    fn test_parse_header_is_consumed_by_one_key() {
        let conf = "### Client a\nPublicKey = k1\nPublicKey = k2\n";
        let table = PeerNameTable::parse(conf.as_bytes()).unwrap();
        assert_eq!(table.get("k1"), Some("a"));
        assert_eq!(table.get("k2"), None);
    }

    #[test]
    fn test_parse_later_header_wins() {
        let conf = "### Client old\n### Client new\nPublicKey = k\n";
        let table = PeerNameTable::parse(conf.as_bytes()).unwrap();
        assert_eq!(table.get("k"), Some("new"));
    }

    #[test]
    fn test_parse_empty_input() {
        let table = PeerNameTable::parse("".as_bytes()).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_resolve_known_and_unknown() {
        let table: PeerNameTable = [("key/one".to_string(), "desktop".to_string())]
            .into_iter()
            .collect();
        let mask = MaskPolicy::default();
        assert_eq!(table.resolve("key/one", &mask), "desktop");
        assert_eq!(table.resolve("abc/defgh", &mask), "abc?d***");
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wg0.conf");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{}", WG_CONF).unwrap();

        let table = PeerNameTable::load(&path).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.conf");
        let err = PeerNameTable::load(&path).unwrap_err();
        assert!(matches!(err, TrafficError::FileRead { .. }));
    }
}
