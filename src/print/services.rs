use std::path::PathBuf;

use anyhow::Context;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::AppError,
    print::{
        dedup::fingerprint,
        dto::{InvoicePayload, PrintResponse},
        pdf,
        spooler::PrintProfile,
        template::Template,
    },
    state::PrintState,
};

/// Validates, de-duplicates, renders, packages and prints one invoice.
/// The spooler call is awaited, so a failed job is reported to the client.
/// The PDF only lives in the output directory for the duration of the call.
pub async fn print_invoice(state: &PrintState, invoice: InvoicePayload) -> Result<PrintResponse, AppError> {
    if !invoice.has_required_fields() {
        return Err(AppError::MissingFields);
    }

    let key = fingerprint(&invoice.time, &invoice.total);
    if let Err(cooldown) = state.guard.check(&key) {
        warn!(remaining_secs = cooldown.remaining_secs, "duplicate print request");
        return Err(AppError::Duplicate {
            window_secs: state.guard.window().as_secs(),
            remaining_secs: cooldown.remaining_secs,
        });
    }

    let metal = invoice.metal;
    let template = Template::select(&invoice);
    let template_path = template.path_in(&state.config.template_dir);
    let template_png = tokio::fs::read(&template_path)
        .await
        .with_context(|| format!("read template {}", template_path.display()))?;
    info!(metal = metal.as_str(), template = template.file_name(), "rendering invoice");

    let renderer = state.renderer.clone();
    let pdf_bytes = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, AppError> {
        let rendered = renderer.render(&template_png, &invoice)?;
        Ok(pdf::package(&rendered.png, metal)?)
    })
    .await
    .context("render task")??;

    let pdf_path = write_pdf(state, &pdf_bytes).await?;

    let profile = PrintProfile::for_metal(&state.config, metal);
    let submitted = state.spooler.submit(&pdf_path, &profile).await;
    // the spooler has queued or rejected the job by now
    if let Err(e) = tokio::fs::remove_file(&pdf_path).await {
        warn!(error = %e, pdf = %pdf_path.display(), "could not remove printed pdf");
    }
    submitted?;
    info!(printer = %profile.printer, "invoice printed");

    Ok(PrintResponse {
        success: true,
        message: format!("Invoice printed successfully to {}", profile.printer),
    })
}

async fn write_pdf(state: &PrintState, bytes: &[u8]) -> anyhow::Result<PathBuf> {
    let dir = &state.config.output_dir;
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("create output dir {}", dir.display()))?;
    let path = dir.join(format!("invoice-{}.pdf", Uuid::new_v4()));
    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

pub async fn list_printers(state: &PrintState) -> Result<Vec<String>, AppError> {
    let printers = state.spooler.list_printers().await?;
    info!(count = printers.len(), "listed printers");
    Ok(printers)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::print::{dto::Metal, spooler::fake::FakeSpooler, testing::TemplateDir};

    fn silver() -> InvoicePayload {
        serde_json::from_value(json!({
            "metal": "silver",
            "time": "2024/03/05 11:20",
            "item": ["Anklet"],
            "grossweight": [42.5],
            "item_price": [4500],
            "total": [4500],
            "sale price": 4500,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn prints_to_the_metal_printer() {
        let dirs = TemplateDir::new();
        let spooler = Arc::new(FakeSpooler::default());
        let state = PrintState::fake(spooler.clone(), &dirs);

        let res = print_invoice(&state, silver()).await.unwrap();
        assert!(res.success);
        assert_eq!(res.message, "Invoice printed successfully to Samsung M2020 Series");

        let jobs = spooler.jobs();
        assert_eq!(jobs.len(), 1);
        let (pdf_path, profile, pdf) = &jobs[0];
        assert_eq!(profile, &PrintProfile::for_metal(&state.config, Metal::Silver));
        assert!(pdf_path.starts_with(dirs.output()));
        assert!(pdf.starts_with(b"%PDF"));
    }

    fn files_in(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn printed_pdfs_are_removed() {
        let dirs = TemplateDir::new();
        let spooler = Arc::new(FakeSpooler::default());
        let state = PrintState::fake(spooler.clone(), &dirs);

        for n in 0..5 {
            let mut invoice = silver();
            invoice.total = json!([4500 + n]);
            print_invoice(&state, invoice).await.unwrap();
        }
        assert_eq!(spooler.jobs().len(), 5);
        assert_eq!(files_in(&dirs.output()), 0);
    }

    #[tokio::test]
    async fn failed_job_still_removes_pdf() {
        let dirs = TemplateDir::new();
        let state = PrintState::fake(Arc::new(FakeSpooler::failing("printer offline")), &dirs);

        let err = print_invoice(&state, silver()).await.unwrap_err();
        assert!(err.to_string().contains("printer offline"));
        assert_eq!(files_in(&dirs.output()), 0);
    }

    #[tokio::test]
    async fn missing_template_is_internal_error() {
        let dirs = TemplateDir::empty();
        let spooler = Arc::new(FakeSpooler::default());
        let state = PrintState::fake(spooler.clone(), &dirs);

        let err = print_invoice(&state, silver()).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert!(err.to_string().contains("nbj.png"));
        assert!(spooler.jobs().is_empty());
    }

    #[tokio::test]
    async fn invalid_time_is_bad_request() {
        let dirs = TemplateDir::new();
        let state = PrintState::fake(Arc::new(FakeSpooler::default()), &dirs);
        let mut invoice = silver();
        invoice.time = "05/03/2024".into();

        let err = print_invoice(&state, invoice).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn printer_listing_passes_through() {
        let dirs = TemplateDir::new();
        let spooler = Arc::new(FakeSpooler {
            printers: vec!["EPSON L3250 Series".into()],
            ..Default::default()
        });
        let state = PrintState::fake(spooler, &dirs);
        assert_eq!(list_printers(&state).await.unwrap(), vec!["EPSON L3250 Series"]);
    }
}
