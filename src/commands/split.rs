use crate::archive::write_archive;
use crate::plan::{parse_named_ranges, NamedRange, PartitionRequest};
use crate::split::{split_pdf, SplitOutcome};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub fn run<P: AsRef<Path>>(
    input: P,
    request: &PartitionRequest,
    output: Option<&Path>,
) -> Result<()> {
    let input = input.as_ref();
    let (archive_path, outcome) = split_to_archive(input, request, output)?;

    for result in &outcome.results {
        println!("{} ({} page(s))", result.filename, result.page_count);
    }
    println!(
        "Split {} into {} file(s) in {}",
        input.display(),
        outcome.results.len(),
        archive_path.display()
    );

    Ok(())
}

/// Split the PDF at `input` and write the parts as a ZIP archive.
pub fn split_to_archive(
    input: &Path,
    request: &PartitionRequest,
    output: Option<&Path>,
) -> Result<(PathBuf, SplitOutcome)> {
    let bytes = read_pdf(input)?;

    let outcome = split_pdf(&bytes, file_name(input), request)?;
    let archive_path = archive_path(output, &outcome.archive_name);

    write_archive(&archive_path, &outcome.results)
        .with_context(|| format!("Failed to write archive: {}", archive_path.display()))?;

    Ok((archive_path, outcome))
}

pub fn read_pdf(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read PDF: {}", path.display()))
}

pub fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|s| s.to_str())
}

/// Parse `--parts`: inline JSON, or `@FILE` to read the JSON from a file.
pub fn read_parts(arg: &str) -> Result<Vec<NamedRange>> {
    let json = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read parts file: {}", path))?,
        None => arg.to_string(),
    };
    Ok(parse_named_ranges(&json)?)
}

/// Where to write the archive: an explicit file, `<dir>/<default>`, or `<default>`.
pub fn archive_path(output: Option<&Path>, default_name: &str) -> PathBuf {
    match output {
        Some(path) if path.is_dir() => path.join(default_name),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(default_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures::sample_pdf;
    use std::io::Cursor;
    use zip::ZipArchive;

    #[test]
    fn test_archive_path() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            archive_path(Some(dir.path()), "a-split.zip"),
            dir.path().join("a-split.zip")
        );

        let file = dir.path().join("custom.zip");
        assert_eq!(archive_path(Some(&file), "a-split.zip"), file);
        assert_eq!(archive_path(None, "a-split.zip"), PathBuf::from("a-split.zip"));
    }

    #[test]
    fn test_read_parts_inline_and_file() {
        let inline = read_parts(r#"[{"title":"A","startPage":1,"endPage":2}]"#).unwrap();
        assert_eq!(inline[0].title, "A");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parts.json");
        std::fs::write(&path, r#"[{"title":"B","startPage":3,"endPage":4}]"#).unwrap();
        let from_file = read_parts(&format!("@{}", path.display())).unwrap();
        assert_eq!(from_file[0].start_page, 3);
    }

    #[test]
    fn test_run_writes_archive_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("Manual.pdf");
        std::fs::write(&input, sample_pdf(7)).unwrap();

        run(
            &input,
            &PartitionRequest::FixedSize { page_size: 3 },
            Some(dir.path()),
        )
        .unwrap();

        let bytes = std::fs::read(dir.path().join("Manual-split.zip")).unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<_> = archive.file_names().collect();
        assert_eq!(names.len(), 3);
        assert!(names.contains(&"Manual(1-3).pdf"));
        assert!(names.contains(&"Manual(7-7).pdf"));
    }

    #[test]
    fn test_run_reports_invalid_plan() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.pdf");
        std::fs::write(&input, sample_pdf(2)).unwrap();

        let err = run(
            &input,
            &PartitionRequest::Boundaries {
                cut_points: vec![1],
            },
            Some(dir.path()),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Invalid split plan"));
        assert!(!dir.path().join("a-split.zip").exists());
    }
}
