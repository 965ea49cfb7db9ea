use std::{collections::HashMap, fmt, path::PathBuf};

use anyhow::Context;
use serde::Deserialize;
use tracing::{info, warn};

/// Mobile number / password pair the portal login expects for one PIN.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct Credential {
    #[serde(rename = "mobilenumber")]
    pub mobile_number: String,
    pub password: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("mobile_number", &self.mobile_number)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub login_url: String,
    pub login_origin: String,
    pub data_base_url: String,
    pub data_origin: String,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub credentials: HashMap<String, Credential>,
    pub portal: PortalConfig,
}

impl RelayConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let credentials = load_credentials()?;
        info!(pins = credentials.len(), "credential table loaded");

        let portal = PortalConfig {
            login_url: std::env::var("PORTAL_LOGIN_URL").unwrap_or_else(|_| {
                "http://apps.teleuniv.in/api/auth/netralogin.php?college=KMIT".into()
            }),
            login_origin: std::env::var("PORTAL_ORIGIN")
                .unwrap_or_else(|_| "http://kmit-netra.teleuniv.in".into()),
            data_base_url: std::env::var("DATA_API_BASE_URL")
                .unwrap_or_else(|_| "https://spectraserver-indol.vercel.app/api".into()),
            data_origin: std::env::var("DATA_API_ORIGIN")
                .unwrap_or_else(|_| "https://spectra-beta.vercel.app".into()),
            timeout_secs: std::env::var("UPSTREAM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok()),
        };

        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("RELAY_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(3000),
            credentials,
            portal,
        })
    }
}

fn load_credentials() -> anyhow::Result<HashMap<String, Credential>> {
    if let Ok(path) = std::env::var("RELAY_CREDENTIALS_FILE") {
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("read credentials file {}", path))?;
        return parse_credentials(&raw).with_context(|| format!("parse credentials file {}", path));
    }
    if let Ok(raw) = std::env::var("RELAY_CREDENTIALS") {
        return parse_credentials(&raw).context("parse RELAY_CREDENTIALS");
    }
    warn!("no RELAY_CREDENTIALS_FILE or RELAY_CREDENTIALS set; every PIN will be rejected");
    Ok(HashMap::new())
}

/// Parses a `{"<pin>": {"mobilenumber": "...", "password": "..."}}` table.
pub fn parse_credentials(raw: &str) -> anyhow::Result<HashMap<String, Credential>> {
    let table: HashMap<String, Credential> = serde_json::from_str(raw)?;
    Ok(table)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintBackend {
    /// SumatraPDF, with printers listed through PowerShell (Windows).
    Sumatra,
    /// CUPS `lp` / `lpstat`.
    Lp,
}

impl PrintBackend {
    fn from_env() -> Self {
        match std::env::var("PRINT_BACKEND").as_deref() {
            Ok("sumatra") => PrintBackend::Sumatra,
            Ok("lp") => PrintBackend::Lp,
            Ok(other) => {
                warn!(backend = %other, "unknown PRINT_BACKEND, using platform default");
                Self::platform_default()
            }
            Err(_) => Self::platform_default(),
        }
    }

    fn platform_default() -> Self {
        if cfg!(windows) {
            PrintBackend::Sumatra
        } else {
            PrintBackend::Lp
        }
    }
}

#[derive(Debug, Clone)]
pub struct PrintConfig {
    pub host: String,
    pub port: u16,
    pub template_dir: PathBuf,
    pub output_dir: PathBuf,
    pub font_dir: Option<PathBuf>,
    pub backend: PrintBackend,
    pub gold_printer: String,
    pub silver_printer: String,
    pub sumatra_path: String,
    pub dedup_window_secs: u64,
    pub dedup_capacity: usize,
}

impl PrintConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("PRINT_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(5010),
            template_dir: std::env::var("TEMPLATE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("templates")),
            output_dir: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir().join("shopdesk")),
            font_dir: std::env::var("FONT_DIR").ok().map(PathBuf::from),
            backend: PrintBackend::from_env(),
            gold_printer: std::env::var("GOLD_PRINTER")
                .unwrap_or_else(|_| "EPSON L3250 Series".into()),
            silver_printer: std::env::var("SILVER_PRINTER")
                .unwrap_or_else(|_| "Samsung M2020 Series".into()),
            sumatra_path: std::env::var("SUMATRA_PATH")
                .unwrap_or_else(|_| r"C:\Program Files\SumatraPDF\SumatraPDF.exe".into()),
            dedup_window_secs: std::env::var("DEDUP_WINDOW_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30),
            dedup_capacity: std::env::var("DEDUP_CAPACITY")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(100),
        })
    }
}
