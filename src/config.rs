use gotham_derive::StateData;

use std::path::Path;

/// System wide configuration file, preferred over the local one when present.
const SYSTEM_PATH: &str = "/etc/scribe/scribe.toml";
const LOCAL_PATH: &str = "scribe.toml";

/// Application wide settings defined in configuration file.
#[derive(Deserialize, StateData, Clone, Debug)]
pub struct Settings {
    /// Postgres database url
    pub database_url: String,
    /// IP address to bind to
    pub host_address: String,
    /// Public base url of the site, without trailing slash
    #[serde(default = "default_site_url")]
    pub site_url: String,
    /// Directory static assets are served from
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    /// Directory post images are served from
    #[serde(default = "default_media_dir")]
    pub media_dir: String,
    /// Cookie settings
    #[serde(default)]
    pub cookie: Cookie,
}

impl Settings {
    pub fn from_slice(data: &[u8]) -> Result<Self, toml::de::Error> {
        toml::from_slice(data)
    }

    /// Reads the settings from the system config file, or from the working directory.
    pub fn load() -> Result<Self, failure::Error> {
        let path = if Path::new(SYSTEM_PATH).is_file() {
            Path::new(SYSTEM_PATH)
        } else {
            Path::new(LOCAL_PATH)
        };
        let data = std::fs::read(path)?;
        let mut settings = Self::from_slice(&data)?;
        let trimmed = settings.site_url.trim_end_matches('/').len();
        settings.site_url.truncate(trimmed);
        Ok(settings)
    }
}

fn default_site_url() -> String {
    String::from("http://localhost:8000")
}

fn default_static_dir() -> String {
    if Path::new("/usr/share/scribe/static").is_dir() {
        String::from("/usr/share/scribe/static")
    } else {
        String::from("static")
    }
}

fn default_media_dir() -> String {
    String::from("media")
}

/// Cookie related settings
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Cookie {
    /// Require HTTPS for cookies
    #[serde(default)]
    pub secure: bool,
    /// Restrict cookies to given domain if set
    pub domain: Option<String>,
}
