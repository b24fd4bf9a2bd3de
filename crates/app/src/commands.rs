use std::path::Path;

use anyhow::{Context, Result};
use cheque_ocr::{list_images, ChequePipeline, OcrBackend};
use cheque_storage::{render_csv, ChequeLedger, ChequeStore, SubmitOutcome};

/// Counts reported at the end of a batch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub appended: usize,
    pub duplicates: usize,
    pub failed: usize,
}

/// Process every supported image in `folder` and append new cheques to the
/// ledger. The pipeline bounds how many images are OCR'd at once; appends
/// happen here, one at a time, in file-name order. A failing image is
/// reported and skipped without stopping the batch.
pub async fn batch<R, S>(
    pipeline: &ChequePipeline<R>,
    ledger: &mut ChequeLedger<S>,
    folder: &Path,
) -> Result<BatchSummary>
where
    R: OcrBackend + 'static,
    S: ChequeStore,
{
    let images = list_images(folder)
        .with_context(|| format!("Failed to read folder {}", folder.display()))?;

    let mut handles = Vec::with_capacity(images.len());
    for path in images {
        let pipeline = pipeline.clone();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let task = tokio::spawn(async move { pipeline.process_file(&path).await });
        handles.push((name, task));
    }

    let mut summary = BatchSummary::default();
    for (name, handle) in handles {
        let result = handle.await.context("Batch worker panicked")?;
        println!("Processing: {name}");
        summary.processed += 1;
        let extraction = match result {
            Ok(extraction) => extraction,
            Err(e) => {
                tracing::warn!("Failed to process {name}: {e}");
                eprintln!("Skipped {name}: {e}");
                summary.failed += 1;
                continue;
            }
        };
        match ledger.submit(&extraction.record)? {
            SubmitOutcome::Appended => summary.appended += 1,
            SubmitOutcome::Duplicate => {
                eprintln!("Duplicate cheque skipped: {name}");
                summary.duplicates += 1;
            }
        }
    }

    Ok(summary)
}

/// Extract one image and print its record as JSON. Nothing is stored.
pub async fn extract<R: OcrBackend + 'static>(
    pipeline: &ChequePipeline<R>,
    image: &Path,
) -> Result<String> {
    let extraction = pipeline
        .process_file(image)
        .await
        .with_context(|| format!("Failed to process {}", image.display()))?;
    Ok(serde_json::to_string_pretty(&extraction.record)?)
}

/// The stored table rendered as CSV.
pub fn list<S: ChequeStore>(ledger: &ChequeLedger<S>) -> Result<String> {
    let rows = ledger.records().context("Failed to load cheque table")?;
    let bytes = render_csv(&rows)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
