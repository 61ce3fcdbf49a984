use crate::plan::ResolvedRange;

const FALLBACK_BASE_NAME: &str = "document";

/// Derive the common prefix for every output name from the uploaded file name.
///
/// Directory components (either separator) and one trailing `.pdf` in any
/// case are stripped. A missing or blank name becomes `"document"`.
pub fn base_name(original: Option<&str>) -> String {
    let name = match original {
        Some(name) if !name.trim().is_empty() => name,
        _ => return FALLBACK_BASE_NAME.to_string(),
    };

    let name = match name.rfind(['/', '\\']) {
        Some(pos) => &name[pos + 1..],
        None => name,
    };

    let stem = match name.len().checked_sub(4) {
        Some(cut) if name.is_char_boundary(cut) && name[cut..].eq_ignore_ascii_case(".pdf") => {
            &name[..cut]
        }
        _ => name,
    };

    if stem.trim().is_empty() {
        FALLBACK_BASE_NAME.to_string()
    } else {
        stem.to_string()
    }
}

/// `{base}({label}).pdf` for labelled ranges, `{base}({start}-{end}).pdf` otherwise.
pub fn output_name(base: &str, range: &ResolvedRange) -> String {
    match range.label.as_deref() {
        Some(label) if !label.trim().is_empty() => format!("{}({}).pdf", base, label),
        _ => format!("{}({}-{}).pdf", base, range.start_page, range.end_page),
    }
}

pub fn archive_name(base: &str) -> String {
    format!("{}-split.zip", base)
}
