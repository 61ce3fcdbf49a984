use crate::error::Result;
use crate::split::SplitResult;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::Path;
use tracing::warn;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

/// Entry names for `filenames`, in order, with repeats made unique.
///
/// The second `a.pdf` becomes `a (2).pdf`, the third `a (3).pdf`, skipping
/// any suffix that is already taken.
pub fn dedupe_names<'a, I>(filenames: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut taken: HashSet<String> = HashSet::new();
    let mut names = Vec::new();

    for name in filenames {
        let unique = if taken.contains(name) {
            let (stem, ext) = match name.rfind('.') {
                Some(dot) if dot > 0 => name.split_at(dot),
                _ => (name, ""),
            };
            let renamed = (2..)
                .map(|n| format!("{} ({}){}", stem, n, ext))
                .find(|candidate| !taken.contains(candidate))
                .unwrap_or_else(|| name.to_string());
            warn!(original = name, renamed = %renamed, "duplicate entry name renamed");
            renamed
        } else {
            name.to_string()
        };

        taken.insert(unique.clone());
        names.push(unique);
    }

    names
}

/// Make a file name safe to use as a single ZIP entry.
///
/// Path separators and `..` become `_`, so every entry extracts into the
/// archive root. Already-safe names are returned unchanged.
pub fn escape_entry_name(name: &str) -> String {
    let escaped = name.replace(['/', '\\'], "_").replace("..", "_");
    if escaped != name {
        warn!(original = name, escaped = %escaped, "unsafe entry name escaped");
    }
    escaped
}

/// Final archive entry names for `filenames`: escaped, then made unique.
pub fn entry_names<'a, I>(filenames: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let escaped: Vec<String> = filenames.into_iter().map(escape_entry_name).collect();
    dedupe_names(escaped.iter().map(String::as_str))
}

/// Pack the parts into a ZIP archive, one entry per part in order.
pub fn package(results: &[SplitResult]) -> Result<Vec<u8>> {
    let names = entry_names(results.iter().map(|r| r.filename.as_str()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, result) in names.iter().zip(results) {
        zip.start_file(name.as_str(), options)?;
        zip.write_all(&result.content)?;
    }

    Ok(zip.finish()?.into_inner())
}

/// Package the parts and write the archive to `path`.
pub fn write_archive<P: AsRef<Path>>(path: P, results: &[SplitResult]) -> Result<()> {
    let bytes = package(results)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn part(filename: &str, content: &[u8]) -> SplitResult {
        SplitResult {
            filename: filename.to_string(),
            content: content.to_vec(),
            page_count: 1,
        }
    }

    fn entries(bytes: Vec<u8>) -> Vec<(String, Vec<u8>)> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut file = archive.by_index(i).unwrap();
                let mut content = Vec::new();
                file.read_to_end(&mut content).unwrap();
                (file.name().to_string(), content)
            })
            .collect()
    }

    #[test]
    fn test_dedupe_keeps_unique_names() {
        let names = dedupe_names(["a(1-5).pdf", "a(6-9).pdf"]);
        assert_eq!(names, vec!["a(1-5).pdf", "a(6-9).pdf"]);
    }

    #[test]
    fn test_dedupe_suffixes_repeats() {
        let names = dedupe_names(["r(Intro).pdf", "r(Intro).pdf", "r(Body).pdf", "r(Intro).pdf"]);
        assert_eq!(
            names,
            vec!["r(Intro).pdf", "r(Intro) (2).pdf", "r(Body).pdf", "r(Intro) (3).pdf"]
        );
    }

    #[test]
    fn test_dedupe_skips_taken_suffix() {
        let names = dedupe_names(["a.pdf", "a (2).pdf", "a.pdf"]);
        assert_eq!(names, vec!["a.pdf", "a (2).pdf", "a (3).pdf"]);
    }

    #[test]
    fn test_dedupe_without_extension() {
        let names = dedupe_names(["notes", "notes"]);
        assert_eq!(names, vec!["notes", "notes (2)"]);
    }

    #[test]
    fn test_package_preserves_order_and_content() {
        let results = vec![part("b.pdf", b"second"), part("a.pdf", b"first")];
        let archive = entries(package(&results).unwrap());
        assert_eq!(
            archive,
            vec![
                ("b.pdf".to_string(), b"second".to_vec()),
                ("a.pdf".to_string(), b"first".to_vec()),
            ]
        );
    }

    #[test]
    fn test_package_never_drops_duplicates() {
        let results = vec![part("x(T).pdf", b"one"), part("x(T).pdf", b"two")];
        let archive = entries(package(&results).unwrap());
        assert_eq!(archive.len(), 2);
        assert_eq!(archive[1].0, "x(T) (2).pdf");
        assert_eq!(archive[1].1, b"two".to_vec());
    }

    #[test]
    fn test_escape_entry_name() {
        assert_eq!(escape_entry_name("r(Intro).pdf"), "r(Intro).pdf");
        assert_eq!(escape_entry_name("r(/../../../etc/x).pdf"), "r(_______etc_x).pdf");
        assert_eq!(escape_entry_name(r"r(a\b).pdf"), "r(a_b).pdf");
        assert_eq!(escape_entry_name("r(v1.2).pdf"), "r(v1.2).pdf");
    }

    #[test]
    fn test_entry_names_are_stable() {
        let names = entry_names(["r(a/b).pdf", "r(a_b).pdf", "r(T).pdf", "r(T).pdf"]);
        assert_eq!(
            names,
            vec!["r(a_b).pdf", "r(a_b) (2).pdf", "r(T).pdf", "r(T) (2).pdf"]
        );
        assert_eq!(entry_names(names.iter().map(String::as_str)), names);
    }

    #[test]
    fn test_package_entries_stay_inside_archive() {
        let results = vec![part("r(/../../../etc/x).pdf", b"x")];
        let bytes = package(&results).unwrap();

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let entry = archive.by_index(0).unwrap();
        assert_eq!(entry.name(), "r(_______etc_x).pdf");
        assert!(entry.enclosed_name().is_some());
    }

    #[test]
    fn test_write_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc-split.zip");
        write_archive(&path, &[part("doc(1-1).pdf", b"%PDF-")]).unwrap();

        let archive = entries(std::fs::read(&path).unwrap());
        assert_eq!(archive[0].0, "doc(1-1).pdf");
    }
}
