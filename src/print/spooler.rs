use std::path::Path;

use anyhow::Context;
use axum::async_trait;
use tokio::process::Command;

use crate::{
    config::{PrintBackend, PrintConfig},
    print::dto::Metal,
};

/// Printer and paper settings for one metal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintProfile {
    pub printer: String,
    pub paper: &'static str,
    pub resolution: Option<&'static str>,
    pub quality: Option<&'static str>,
}

impl PrintProfile {
    pub fn for_metal(config: &PrintConfig, metal: Metal) -> Self {
        match metal {
            Metal::Gold => Self {
                printer: config.gold_printer.clone(),
                paper: "A5",
                resolution: Some("600x600"),
                quality: Some("high"),
            },
            Metal::Silver => Self {
                printer: config.silver_printer.clone(),
                paper: "A5",
                resolution: None,
                quality: None,
            },
        }
    }

    /// Value of SumatraPDF's `-print-settings`.
    pub fn sumatra_settings(&self) -> String {
        let mut parts = vec![
            format!("paper={}", self.paper),
            "fit".to_string(),
            "autorotate".to_string(),
            "center".to_string(),
            "margin=0".to_string(),
        ];
        if let Some(res) = self.resolution {
            parts.push(format!("resolution={}", res));
        }
        if let Some(q) = self.quality {
            parts.push(format!("quality={}", q));
        }
        parts.join(",")
    }

    /// `-o` options for CUPS `lp`.
    pub fn lp_options(&self) -> Vec<String> {
        let mut opts = vec![format!("media={}", self.paper), "fit-to-page".to_string()];
        if let Some(res) = self.resolution {
            opts.push(format!("Resolution={}dpi", res.split('x').next().unwrap_or(res)));
        }
        if self.quality == Some("high") {
            opts.push("print-quality=5".to_string());
        }
        opts
    }
}

#[async_trait]
pub trait Spooler: Send + Sync {
    async fn list_printers(&self) -> anyhow::Result<Vec<String>>;
    async fn submit(&self, pdf: &Path, profile: &PrintProfile) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    async fn run(&self) -> anyhow::Result<String> {
        let out = Command::new(&self.program)
            .args(&self.args)
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("spawn {}", self.program))?;

        let stderr = String::from_utf8_lossy(&out.stderr);
        if !stderr.trim().is_empty() {
            tracing::warn!(program = %self.program, stderr = %stderr.trim(), "print command stderr");
        }
        anyhow::ensure!(
            out.status.success(),
            "{} exited with {}: {}",
            self.program,
            out.status,
            stderr.trim()
        );
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }
}

/// Talks to the operating system's print spooler through its command line
/// tools.
pub struct CommandSpooler {
    backend: PrintBackend,
    sumatra_path: String,
}

impl CommandSpooler {
    pub fn new(config: &PrintConfig) -> Self {
        Self {
            backend: config.backend,
            sumatra_path: config.sumatra_path.clone(),
        }
    }

    pub fn list_invocation(&self) -> Invocation {
        match self.backend {
            PrintBackend::Sumatra => Invocation::new("powershell")
                .arg("-NoProfile")
                .arg("-Command")
                .arg("Get-Printer | Select-Object -ExpandProperty Name"),
            PrintBackend::Lp => Invocation::new("lpstat").arg("-e"),
        }
    }

    pub fn submit_invocation(&self, pdf: &Path, profile: &PrintProfile) -> Invocation {
        let pdf = pdf.display().to_string();
        match self.backend {
            PrintBackend::Sumatra => Invocation::new(&self.sumatra_path)
                .arg("-silent")
                .arg("-print-to")
                .arg(&profile.printer)
                .arg("-print-settings")
                .arg(profile.sumatra_settings())
                .arg(pdf),
            PrintBackend::Lp => {
                let mut inv = Invocation::new("lp").arg("-d").arg(&profile.printer);
                for opt in profile.lp_options() {
                    inv = inv.arg("-o").arg(opt);
                }
                inv.arg(pdf)
            }
        }
    }
}

#[async_trait]
impl Spooler for CommandSpooler {
    async fn list_printers(&self) -> anyhow::Result<Vec<String>> {
        let stdout = self.list_invocation().run().await.context("list printers")?;
        Ok(parse_printer_list(&stdout))
    }

    async fn submit(&self, pdf: &Path, profile: &PrintProfile) -> anyhow::Result<()> {
        let inv = self.submit_invocation(pdf, profile);
        tracing::info!(program = %inv.program, printer = %profile.printer, pdf = %pdf.display(), "submitting print job");
        inv.run()
            .await
            .with_context(|| format!("print to {}", profile.printer))?;
        Ok(())
    }
}

pub fn parse_printer_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
