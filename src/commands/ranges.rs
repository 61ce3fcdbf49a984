use crate::commands::split::{file_name, read_pdf};
use crate::plan::{PartitionRequest, ResolvedRange};
use crate::split::{plan_pdf, SplitPlan};
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>>(path: P, request: &PartitionRequest) -> Result<()> {
    let path = path.as_ref();
    let bytes = read_pdf(path)?;
    let plan = plan_pdf(&bytes, file_name(path), request)?;

    for line in describe_plan(path, &plan) {
        println!("{}", line);
    }

    Ok(())
}

/// Report lines for a plan: a header, then one line per part.
pub fn describe_plan(path: &Path, plan: &SplitPlan) -> Vec<String> {
    let mut lines = vec![
        format!("File: {}", path.display()),
        format!("Pages: {}", plan.page_count),
    ];

    for part in &plan.parts {
        let range = &part.range;
        if range.start_page == 0 || range.start_page > plan.page_count {
            lines.push(format!(
                "{:>5}-{:<5} {} (start page out of range)",
                range.start_page, range.end_page, part.filename
            ));
            continue;
        }

        let end = range.end_page.min(plan.page_count);
        let pages = ResolvedRange::new(range.start_page, end).page_span();
        let note = if end < range.end_page {
            format!(", clamped to {}", end)
        } else {
            String::new()
        };
        lines.push(format!(
            "{:>5}-{:<5} {} ({} page(s){})",
            range.start_page, range.end_page, part.filename, pages, note
        ));
    }

    lines
}
