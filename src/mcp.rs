use anyhow::Result;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_router,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::commands::split::{file_name, read_pdf, split_to_archive};
use crate::error::SplitError;
use crate::plan::{NamedRange, PartitionRequest, DEFAULT_PAGES_PER_SPLIT};
use crate::split::plan_pdf;

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfSplitRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
    #[schemars(description = "Pages per output file (default: 50)")]
    #[serde(default = "default_pages_per_split")]
    pub pages_per_split: u32,
    #[schemars(description = "Archive path or directory (default: <name>-split.zip next to the PDF)")]
    pub output: Option<String>,
}

fn default_pages_per_split() -> u32 {
    DEFAULT_PAGES_PER_SPLIT
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfSplitAtRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
    #[schemars(description = "Page cut points; each consecutive pair becomes one inclusive range (e.g. [1, 10, 20])")]
    pub cut_points: Vec<u32>,
    #[schemars(description = "Archive path or directory (default: <name>-split.zip next to the PDF)")]
    pub output: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfSplitRangesRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
    #[schemars(description = "Titled page ranges; each becomes '<name>(<title>).pdf'")]
    pub parts: Vec<NamedRange>,
    #[schemars(description = "Archive path or directory (default: <name>-split.zip next to the PDF)")]
    pub output: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfPlanRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
    #[schemars(description = "Fixed number of pages per part")]
    pub pages_per_split: Option<u32>,
    #[schemars(description = "Page cut points")]
    pub cut_points: Option<Vec<u32>>,
    #[schemars(description = "Titled page ranges")]
    pub parts: Option<Vec<NamedRange>>,
}

impl PdfPlanRequest {
    fn partition_request(self) -> Result<PartitionRequest, String> {
        match (self.pages_per_split, self.cut_points, self.parts) {
            (Some(page_size), None, None) => Ok(PartitionRequest::FixedSize { page_size }),
            (None, Some(cut_points), None) => Ok(PartitionRequest::Boundaries { cut_points }),
            (None, None, Some(items)) => Ok(PartitionRequest::NamedRanges { items }),
            _ => Err(
                "Exactly one of pages_per_split, cut_points or parts must be given".to_string(),
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PdfSplitServer {
    #[allow(dead_code)]
    tool_router: ToolRouter<Self>,
}

impl PdfSplitServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }

    fn split(&self, path: &str, request: PartitionRequest, output: Option<&str>) -> String {
        let input = Path::new(path);
        let output = match output {
            Some(out) => Some(PathBuf::from(out)),
            None => input
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .map(Path::to_path_buf),
        };

        match split_to_archive(input, &request, output.as_deref()) {
            Ok((archive_path, outcome)) => {
                info!(path, archive = %archive_path.display(), "split complete");
                let result = SplitArchiveResult {
                    archive_path: archive_path.display().to_string(),
                    base_name: outcome.base_name,
                    files: outcome
                        .results
                        .into_iter()
                        .map(|r| SplitFileResult {
                            filename: r.filename,
                            page_count: r.page_count,
                            size: r.content.len() as u64,
                        })
                        .collect(),
                };
                serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => {
                let rejected = e
                    .downcast_ref::<SplitError>()
                    .is_some_and(SplitError::is_client_error);
                if rejected {
                    warn!(path, error = %e, "split request rejected");
                } else {
                    error!(path, error = %e, "split failed");
                }
                format!("Error: {}", e)
            }
        }
    }
}

impl Default for PdfSplitServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl PdfSplitServer {
    #[tool(description = "Split a PDF into consecutive chunks of a fixed number of pages and save them as a ZIP archive")]
    fn pdf_split(&self, Parameters(req): Parameters<PdfSplitRequest>) -> String {
        let request = PartitionRequest::FixedSize {
            page_size: req.pages_per_split,
        };
        self.split(&req.path, request, req.output.as_deref())
    }

    #[tool(description = "Split a PDF between consecutive cut points (e.g. [1, 10, 20] gives pages 1-10 and 10-20) and save the parts as a ZIP archive")]
    fn pdf_split_at(&self, Parameters(req): Parameters<PdfSplitAtRequest>) -> String {
        let request = PartitionRequest::Boundaries {
            cut_points: req.cut_points,
        };
        self.split(&req.path, request, req.output.as_deref())
    }

    #[tool(description = "Split a PDF into titled page ranges and save them as a ZIP archive")]
    fn pdf_split_ranges(&self, Parameters(req): Parameters<PdfSplitRangesRequest>) -> String {
        let request = PartitionRequest::NamedRanges { items: req.parts };
        self.split(&req.path, request, req.output.as_deref())
    }

    #[tool(description = "Preview the parts and file names a split would produce, without writing anything")]
    fn pdf_plan(&self, Parameters(req): Parameters<PdfPlanRequest>) -> String {
        let path = req.path.clone();
        let request = match req.partition_request() {
            Ok(r) => r,
            Err(e) => return format!("Error: {}", e),
        };

        let bytes = match read_pdf(Path::new(&path)) {
            Ok(b) => b,
            Err(e) => return format!("Error: {}", e),
        };

        match plan_pdf(&bytes, file_name(Path::new(&path)), &request) {
            Ok(plan) => {
                let result = PlanResult {
                    path,
                    page_count: plan.page_count,
                    base_name: plan.base_name,
                    parts: plan
                        .parts
                        .into_iter()
                        .map(|p| PlannedPartResult {
                            filename: p.filename,
                            start_page: p.range.start_page,
                            end_page: p.range.end_page,
                        })
                        .collect(),
                };
                serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => format!("Error: {}", e),
        }
    }
}

// Result types for MCP tools

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SplitFileResult {
    pub filename: String,
    pub page_count: u32,
    pub size: u64,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SplitArchiveResult {
    pub archive_path: String,
    pub base_name: String,
    pub files: Vec<SplitFileResult>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PlannedPartResult {
    pub filename: String,
    pub start_page: u32,
    pub end_page: u32,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PlanResult {
    pub path: String,
    pub page_count: u32,
    pub base_name: String,
    pub parts: Vec<PlannedPartResult>,
}

impl ServerHandler for PdfSplitServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "PDF splitting tools. Use pdf_plan to preview how a PDF would be split, then \
                 pdf_split for fixed-size chunks, pdf_split_at for cut points, or \
                 pdf_split_ranges for titled page ranges. Each split writes a ZIP archive \
                 named <name>-split.zip."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server() -> Result<()> {
    let server = PdfSplitServer::new();
    info!("starting MCP server on stdio");

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}
