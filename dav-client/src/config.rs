use std::io::Read;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ClientConfig {
    // Every relative target is resolved against this collection
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    // Streamed transfers
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    // Defaults applied to new locks
    pub lock_timeout: Option<u32>,
    pub lock_owner: Option<String>,
}
impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            user_agent: default_user_agent(),
            chunk_size: default_chunk_size(),
            lock_timeout: None,
            lock_owner: None,
        }
    }
}

pub fn read_config(config_file: PathBuf) -> Result<ClientConfig> {
    let mut file = std::fs::OpenOptions::new()
        .read(true)
        .open(config_file.as_path())?;

    let mut config = String::new();
    file.read_to_string(&mut config)?;

    let parsed: ClientConfig = toml::from_str(&config)?;
    if parsed.chunk_size == 0 {
        anyhow::bail!("chunk_size must be greater than zero");
    }
    if parsed.lock_timeout == Some(0) {
        anyhow::bail!("lock_timeout must be greater than zero, omit it to let the server decide");
    }
    Ok(parsed)
}

fn default_user_agent() -> String {
    format!("dav-client/{}", env!("CARGO_PKG_VERSION"))
}

pub(crate) fn default_chunk_size() -> usize {
    64 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}.toml", name, std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn minimal_config() {
        let path = write_tmp("dav-minimal", r#"base_url = "https://dav.example.com/files/""#);
        let config = read_config(path.clone()).unwrap();
        std::fs::remove_file(path).unwrap();

        assert_eq!(config.base_url, "https://dav.example.com/files/");
        assert_eq!(config.chunk_size, 64 * 1024);
        assert!(config.user_agent.starts_with("dav-client/"));
        assert_eq!(config.lock_timeout, None);
    }

    #[test]
    fn full_config() {
        let path = write_tmp(
            "dav-full",
            r#"
base_url = "http://localhost:8080/"
user_agent = "sync-agent/2"
chunk_size = 4096
lock_timeout = 600
lock_owner = "mailto:jane@example.com"
"#,
        );
        let config = read_config(path.clone()).unwrap();
        std::fs::remove_file(path).unwrap();

        assert_eq!(config.user_agent, "sync-agent/2");
        assert_eq!(config.chunk_size, 4096);
        assert_eq!(config.lock_timeout, Some(600));
        assert_eq!(config.lock_owner.as_deref(), Some("mailto:jane@example.com"));
    }

    #[test]
    fn zero_chunk_is_refused() {
        let path = write_tmp(
            "dav-zero",
            "base_url = \"http://localhost/\"\nchunk_size = 0\n",
        );
        let res = read_config(path.clone());
        std::fs::remove_file(path).unwrap();
        assert!(res.is_err());
    }
}
