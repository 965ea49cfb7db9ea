use std::{sync::Arc, time::Duration};

use crate::config::{PrintConfig, RelayConfig};
use crate::print::{
    dedup::DuplicateGuard,
    render::Renderer,
    spooler::{CommandSpooler, Spooler},
};
use crate::relay::services::{HttpPortal, Portal};

#[derive(Clone)]
pub struct RelayState {
    pub config: Arc<RelayConfig>,
    pub portal: Arc<dyn Portal>,
}

impl RelayState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(RelayConfig::from_env()?);
        let portal = Arc::new(HttpPortal::new(config.portal.clone())?) as Arc<dyn Portal>;
        Ok(Self::from_parts(config, portal))
    }

    pub fn from_parts(config: Arc<RelayConfig>, portal: Arc<dyn Portal>) -> Self {
        Self { config, portal }
    }

    #[cfg(test)]
    pub fn fake(portal: Arc<dyn Portal>) -> Self {
        use crate::config::{parse_credentials, PortalConfig};

        let credentials = parse_credentials(
            r#"{ "123456": { "mobilenumber": "9000000000", "password": "test-password" } }"#,
        )
        .expect("fake credentials parse");

        let config = Arc::new(RelayConfig {
            host: "127.0.0.1".into(),
            port: 0,
            credentials,
            portal: PortalConfig {
                login_url: "http://portal.test/login".into(),
                login_origin: "http://portal.test".into(),
                data_base_url: "http://data.test/api".into(),
                data_origin: "http://app.test".into(),
                timeout_secs: None,
            },
        });
        Self::from_parts(config, portal)
    }
}

#[derive(Clone)]
pub struct PrintState {
    pub config: Arc<PrintConfig>,
    pub guard: Arc<DuplicateGuard>,
    pub renderer: Arc<Renderer>,
    pub spooler: Arc<dyn Spooler>,
}

impl PrintState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(PrintConfig::from_env()?);
        let renderer = Arc::new(Renderer::new(config.font_dir.as_deref()));
        let spooler = Arc::new(CommandSpooler::new(&config)) as Arc<dyn Spooler>;
        tracing::info!(
            backend = ?config.backend,
            templates = %config.template_dir.display(),
            output = %config.output_dir.display(),
            "print service configured"
        );
        Ok(Self::from_parts(config, renderer, spooler))
    }

    pub fn from_parts(config: Arc<PrintConfig>, renderer: Arc<Renderer>, spooler: Arc<dyn Spooler>) -> Self {
        let guard = Arc::new(DuplicateGuard::new(
            Duration::from_secs(config.dedup_window_secs),
            config.dedup_capacity,
        ));
        Self {
            config,
            guard,
            renderer,
            spooler,
        }
    }

    #[cfg(test)]
    pub fn fake(spooler: Arc<dyn Spooler>, dirs: &crate::print::testing::TemplateDir) -> Self {
        use crate::config::PrintBackend;

        let config = Arc::new(PrintConfig {
            host: "127.0.0.1".into(),
            port: 0,
            template_dir: dirs.templates(),
            output_dir: dirs.output(),
            font_dir: None,
            backend: PrintBackend::Lp,
            gold_printer: "EPSON L3250 Series".into(),
            silver_printer: "Samsung M2020 Series".into(),
            sumatra_path: "SumatraPDF.exe".into(),
            dedup_window_secs: 30,
            dedup_capacity: 100,
        });
        let renderer = Arc::new(Renderer::from_database(resvg::usvg::fontdb::Database::new()));
        Self::from_parts(config, renderer, spooler)
    }
}
