use crate::error::{Result, SplitError};
use rmcp::schemars;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Page count per chunk used when no size is given.
pub const DEFAULT_PAGES_PER_SPLIT: u32 = 50;

/// How a document should be cut into parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionRequest {
    /// Consecutive chunks of `page_size` pages; the last one may be shorter.
    FixedSize { page_size: u32 },
    /// Each consecutive pair of cut points is one inclusive range.
    Boundaries { cut_points: Vec<u32> },
    /// Caller-labelled ranges, in caller order.
    NamedRanges { items: Vec<NamedRange> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NamedRange {
    #[schemars(description = "Title used in the output file name")]
    pub title: String,
    #[schemars(description = "First page of the part (1-based, inclusive)")]
    pub start_page: u32,
    #[schemars(description = "Last page of the part (1-based, inclusive)")]
    pub end_page: u32,
}

/// A 1-based inclusive page span, optionally labelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRange {
    pub start_page: u32,
    pub end_page: u32,
    pub label: Option<String>,
}

impl ResolvedRange {
    pub fn new(start_page: u32, end_page: u32) -> Self {
        ResolvedRange {
            start_page,
            end_page,
            label: None,
        }
    }

    pub fn labelled(start_page: u32, end_page: u32, label: impl Into<String>) -> Self {
        ResolvedRange {
            start_page,
            end_page,
            label: Some(label.into()),
        }
    }

    /// Number of pages spanned, ignoring any clamping against a document.
    pub fn page_span(&self) -> u32 {
        self.end_page.saturating_sub(self.start_page) + 1
    }
}

/// Turn a request into an ordered list of ranges for a document of `page_count` pages.
pub fn resolve(page_count: u32, request: &PartitionRequest) -> Result<Vec<ResolvedRange>> {
    let ranges = match request {
        PartitionRequest::FixedSize { page_size } => resolve_fixed_size(page_count, *page_size)?,
        PartitionRequest::Boundaries { cut_points } => resolve_boundaries(cut_points)?,
        PartitionRequest::NamedRanges { items } => resolve_named_ranges(items)?,
    };

    debug!(page_count, ranges = ranges.len(), "resolved split plan");
    Ok(ranges)
}

fn resolve_fixed_size(page_count: u32, page_size: u32) -> Result<Vec<ResolvedRange>> {
    if page_size == 0 {
        return Err(SplitError::InvalidPlan(
            "pages per split must be at least 1".to_string(),
        ));
    }

    let mut ranges = Vec::new();
    let mut start = 1u32;
    while start <= page_count {
        let end = start.saturating_add(page_size - 1).min(page_count);
        ranges.push(ResolvedRange::new(start, end));
        start = match end.checked_add(1) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(ranges)
}

fn resolve_boundaries(cut_points: &[u32]) -> Result<Vec<ResolvedRange>> {
    if cut_points.len() < 2 {
        return Err(SplitError::InvalidPlan(format!(
            "at least 2 cut points are required, got {}",
            cut_points.len()
        )));
    }

    // Shared or overlapping boundary pages are allowed; descending pairs are not.
    cut_points
        .windows(2)
        .map(|pair| {
            let (start, end) = (pair[0], pair[1]);
            if start > end {
                return Err(SplitError::InvalidPlan(format!(
                    "cut points must not decrease ({} is followed by {})",
                    start, end
                )));
            }
            Ok(ResolvedRange::new(start, end))
        })
        .collect()
}

fn resolve_named_ranges(items: &[NamedRange]) -> Result<Vec<ResolvedRange>> {
    if items.is_empty() {
        return Err(SplitError::InvalidPlan("no page ranges given".to_string()));
    }

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            if item.start_page == 0 || item.start_page > item.end_page {
                return Err(SplitError::InvalidPlan(format!(
                    "range #{} ({:?}) has invalid pages {}-{}",
                    idx + 1,
                    item.title,
                    item.start_page,
                    item.end_page
                )));
            }
            Ok(ResolvedRange::labelled(
                item.start_page,
                item.end_page,
                item.title.clone(),
            ))
        })
        .collect()
}

/// Parse a JSON array of `{title, startPage, endPage}` objects.
pub fn parse_named_ranges(json: &str) -> Result<Vec<NamedRange>> {
    serde_json::from_str(json)
        .map_err(|e| SplitError::InvalidPlan(format!("malformed ranges JSON: {}", e)))
}
