use crate::archive::entry_names;
use crate::error::{Result, SplitError};
use crate::naming::{archive_name, base_name, output_name};
use crate::pdf::PdfDocument;
use crate::plan::{resolve, PartitionRequest, ResolvedRange};
use tracing::{debug, info};

const PDF_HEADER: &[u8] = b"%PDF-";

// Readers accept the header anywhere in the first 1024 bytes.
const HEADER_SEARCH_LIMIT: usize = 1024;

/// One output part: its archive entry name and serialized PDF bytes.
#[derive(Debug, Clone)]
pub struct SplitResult {
    pub filename: String,
    pub content: Vec<u8>,
    pub page_count: u32,
}

#[derive(Debug)]
pub struct SplitOutcome {
    pub base_name: String,
    pub archive_name: String,
    pub results: Vec<SplitResult>,
}

/// A resolved range together with the name its output will get.
#[derive(Debug, Clone)]
pub struct PlannedPart {
    pub filename: String,
    pub range: ResolvedRange,
}

#[derive(Debug)]
pub struct SplitPlan {
    pub base_name: String,
    pub page_count: u32,
    pub parts: Vec<PlannedPart>,
}

/// Reject input that is empty or does not carry a PDF header.
pub fn check_input(bytes: &[u8]) -> Result<()> {
    if bytes.is_empty() {
        return Err(SplitError::InvalidInput("file is empty".to_string()));
    }
    let head = &bytes[..bytes.len().min(HEADER_SEARCH_LIMIT)];
    if !head.windows(PDF_HEADER.len()).any(|window| window == PDF_HEADER) {
        return Err(SplitError::InvalidInput("file is not a PDF".to_string()));
    }
    Ok(())
}

/// Resolve `request` against the document without extracting anything.
pub fn plan_pdf(
    bytes: &[u8],
    original_filename: Option<&str>,
    request: &PartitionRequest,
) -> Result<SplitPlan> {
    check_input(bytes)?;
    let doc = PdfDocument::load(bytes)?;
    let page_count = doc.page_count();
    let base = base_name(original_filename);

    let ranges = resolve_non_empty(page_count, request)?;
    let names: Vec<String> = ranges.iter().map(|range| output_name(&base, range)).collect();
    let parts = entry_names(names.iter().map(String::as_str))
        .into_iter()
        .zip(ranges)
        .map(|(filename, range)| PlannedPart { filename, range })
        .collect();

    Ok(SplitPlan {
        base_name: base,
        page_count,
        parts,
    })
}

/// Split `bytes` into one PDF per resolved range, in plan order.
///
/// Either every range is extracted or the whole request fails.
pub fn split_pdf(
    bytes: &[u8],
    original_filename: Option<&str>,
    request: &PartitionRequest,
) -> Result<SplitOutcome> {
    check_input(bytes)?;
    let doc = PdfDocument::load(bytes)?;
    let page_count = doc.page_count();
    let base = base_name(original_filename);

    let ranges = resolve_non_empty(page_count, request)?;
    info!(
        base_name = %base,
        page_count,
        parts = ranges.len(),
        "splitting document"
    );

    let mut results = Vec::with_capacity(ranges.len());
    for range in &ranges {
        let mut part = doc.extract_range(range)?;
        let part_pages = part.get_pages().len() as u32;
        let content = PdfDocument::to_bytes(&mut part)?;
        let filename = output_name(&base, range);

        debug!(%filename, pages = part_pages, bytes = content.len(), "extracted part");
        results.push(SplitResult {
            filename,
            content,
            page_count: part_pages,
        });
    }

    let names = entry_names(results.iter().map(|r| r.filename.as_str()));
    for (result, name) in results.iter_mut().zip(names) {
        result.filename = name;
    }

    Ok(SplitOutcome {
        archive_name: archive_name(&base),
        base_name: base,
        results,
    })
}

fn resolve_non_empty(page_count: u32, request: &PartitionRequest) -> Result<Vec<ResolvedRange>> {
    let ranges = resolve(page_count, request)?;
    if ranges.is_empty() {
        return Err(SplitError::InvalidPlan(
            "document has no pages to split".to_string(),
        ));
    }
    Ok(ranges)
}
