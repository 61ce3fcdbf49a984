use crate::error::{Result, SplitError};
use crate::plan::ResolvedRange;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Page attributes that may be set on an ancestor `Pages` node instead.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

// Guards against cyclic `Parent` chains in broken files.
const MAX_TREE_DEPTH: usize = 64;

/// A loaded source PDF. Extraction only ever reads from it.
pub struct PdfDocument {
    doc: Document,
}

impl PdfDocument {
    pub fn load(bytes: &[u8]) -> Result<Self> {
        let doc =
            Document::load_mem(bytes).map_err(|e| SplitError::MalformedDocument(e.to_string()))?;
        Ok(PdfDocument { doc })
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Get 1-indexed page object IDs
    pub fn page_ids(&self) -> Vec<(u32, ObjectId)> {
        let mut pages: Vec<_> = self.doc.get_pages().into_iter().collect();
        pages.sort_by_key(|(num, _)| *num);
        pages
    }

    /// Copy the pages of `range` into a new standalone document.
    ///
    /// The start page must exist; an end page past the last page is clamped.
    pub fn extract_range(&self, range: &ResolvedRange) -> Result<Document> {
        let all_pages = self.page_ids();
        let total = all_pages.len() as u32;

        if range.start_page == 0 || range.start_page > total {
            return Err(SplitError::PageOutOfBounds {
                page: range.start_page,
                page_count: total,
            });
        }
        if range.start_page > range.end_page {
            return Err(SplitError::InvalidPlan(format!(
                "start page {} is after end page {}",
                range.start_page, range.end_page
            )));
        }

        let end = range.end_page.min(total);
        if end < range.end_page {
            debug!(
                requested = range.end_page,
                clamped = end,
                "end page clamped to document length"
            );
        }

        let kept: Vec<ObjectId> = all_pages
            .iter()
            .filter(|(num, _)| *num >= range.start_page && *num <= end)
            .map(|(_, id)| *id)
            .collect();
        let skipped: HashSet<ObjectId> = all_pages
            .iter()
            .filter(|(num, _)| *num < range.start_page || *num > end)
            .map(|(_, id)| *id)
            .collect();

        self.build_from_pages(&kept, &skipped)
    }

    /// Build a document holding `kept` pages and only the objects they reach.
    ///
    /// Traversal never enters the source page tree or the `skipped` pages, so
    /// the cost depends on the part, not on the size of the source.
    fn build_from_pages(&self, kept: &[ObjectId], skipped: &HashSet<ObjectId>) -> Result<Document> {
        let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();
        let mut pending: Vec<ObjectId> = Vec::new();

        for page_id in kept {
            let mut page = self
                .doc
                .get_dictionary(*page_id)
                .map_err(|e| SplitError::MalformedDocument(e.to_string()))?
                .clone();
            for key in INHERITABLE_KEYS {
                if !page.has(key) {
                    if let Some(value) = self.inherited_attribute(*page_id, key) {
                        page.set(key, value.clone());
                    }
                }
            }
            page.remove(b"Parent");

            let page = Object::Dictionary(page);
            collect_references(&page, &mut pending);
            objects.insert(*page_id, page);
        }

        let info_id = self.doc.trailer.get(b"Info").and_then(Object::as_reference).ok();
        pending.extend(info_id);

        while let Some(id) = pending.pop() {
            if objects.contains_key(&id) || skipped.contains(&id) {
                continue;
            }
            // Dangling references stay dangling; readers treat them as null.
            let Ok(object) = self.doc.get_object(id) else {
                continue;
            };
            if is_page_tree_node(object) {
                continue;
            }
            collect_references(object, &mut pending);
            objects.insert(id, object.clone());
        }

        let mut new_doc = Document::with_version(self.doc.version.clone());
        new_doc.max_id = objects.keys().map(|(num, _)| *num).max().unwrap_or(0);
        new_doc.objects = objects;

        let pages_id = new_doc.new_object_id();
        for page_id in kept {
            if let Ok(page) = new_doc.get_dictionary_mut(*page_id) {
                page.set("Parent", Object::Reference(pages_id));
            }
        }

        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(kept.len() as i64)),
            (
                "Kids",
                Object::Array(kept.iter().map(|id| Object::Reference(*id)).collect()),
            ),
        ]);
        new_doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]);
        let catalog_id = new_doc.add_object(catalog);
        new_doc.trailer.set("Root", Object::Reference(catalog_id));

        if let Some(info_id) = info_id.filter(|id| new_doc.objects.contains_key(id)) {
            new_doc.trailer.set("Info", Object::Reference(info_id));
        }

        Ok(new_doc)
    }

    /// Look up an attribute a page inherits from its ancestors in the page tree.
    fn inherited_attribute(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut node = self.doc.get_dictionary(page_id).ok()?;
        for _ in 0..MAX_TREE_DEPTH {
            let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
            node = self.doc.get_dictionary(parent).ok()?;
            if let Ok(value) = node.get(key) {
                return Some(value);
            }
        }
        None
    }

    /// Serialize a document to PDF bytes.
    pub fn to_bytes(doc: &mut Document) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| SplitError::Serialize(e.to_string()))?;
        Ok(buffer)
    }
}

fn collect_references(object: &Object, out: &mut Vec<ObjectId>) {
    match object {
        Object::Reference(id) => out.push(*id),
        Object::Array(items) => items.iter().for_each(|item| collect_references(item, out)),
        Object::Dictionary(dict) => dict.iter().for_each(|(_, value)| collect_references(value, out)),
        Object::Stream(stream) => stream
            .dict
            .iter()
            .for_each(|(_, value)| collect_references(value, out)),
        _ => {}
    }
}

fn is_page_tree_node(object: &Object) -> bool {
    let dict = match object {
        Object::Dictionary(dict) => dict,
        _ => return false,
    };
    matches!(dict.get(b"Type"), Ok(Object::Name(name)) if name.as_slice() == b"Pages")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures::{page_texts, sample_pdf};

    fn reload(doc: &mut Document) -> Document {
        let bytes = PdfDocument::to_bytes(doc).unwrap();
        Document::load_mem(&bytes).unwrap()
    }

    #[test]
    fn test_load_counts_pages() {
        let doc = PdfDocument::load(&sample_pdf(7)).unwrap();
        assert_eq!(doc.page_count(), 7);
        let numbers: Vec<u32> = doc.page_ids().into_iter().map(|(n, _)| n).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let err = PdfDocument::load(b"hello, this is not a pdf").err().unwrap();
        assert!(matches!(err, SplitError::MalformedDocument(_)));
    }

    #[test]
    fn test_extract_middle_range_keeps_order() {
        let doc = PdfDocument::load(&sample_pdf(10)).unwrap();
        let mut part = doc.extract_range(&ResolvedRange::new(4, 6)).unwrap();
        let part = reload(&mut part);

        assert_eq!(part.get_pages().len(), 3);
        assert_eq!(page_texts(&part), vec!["Page 4", "Page 5", "Page 6"]);
    }

    #[test]
    fn test_extract_leaves_source_untouched() {
        let doc = PdfDocument::load(&sample_pdf(5)).unwrap();
        let first = doc.extract_range(&ResolvedRange::new(1, 2)).unwrap();
        let second = doc.extract_range(&ResolvedRange::new(2, 5)).unwrap();

        assert_eq!(doc.page_count(), 5);
        assert_eq!(first.get_pages().len(), 2);
        assert_eq!(second.get_pages().len(), 4);
    }

    #[test]
    fn test_extract_clamps_end_page() {
        let doc = PdfDocument::load(&sample_pdf(8)).unwrap();
        let mut part = doc.extract_range(&ResolvedRange::new(6, 100)).unwrap();
        let part = reload(&mut part);
        assert_eq!(page_texts(&part), vec!["Page 6", "Page 7", "Page 8"]);
    }

    #[test]
    fn test_extract_whole_document() {
        let doc = PdfDocument::load(&sample_pdf(3)).unwrap();
        let mut part = doc.extract_range(&ResolvedRange::new(1, 3)).unwrap();
        let part = reload(&mut part);
        assert_eq!(part.get_pages().len(), 3);
    }

    #[test]
    fn test_extract_start_out_of_bounds() {
        let doc = PdfDocument::load(&sample_pdf(5)).unwrap();

        let err = doc.extract_range(&ResolvedRange::new(6, 9)).unwrap_err();
        assert!(matches!(
            err,
            SplitError::PageOutOfBounds {
                page: 6,
                page_count: 5
            }
        ));

        let err = doc.extract_range(&ResolvedRange::new(0, 2)).unwrap_err();
        assert!(matches!(err, SplitError::PageOutOfBounds { page: 0, .. }));
    }

    #[test]
    fn test_extract_inverted_range() {
        let doc = PdfDocument::load(&sample_pdf(5)).unwrap();
        let err = doc.extract_range(&ResolvedRange::new(4, 2)).unwrap_err();
        assert!(matches!(err, SplitError::InvalidPlan(_)));
    }

    #[test]
    fn test_extract_copies_only_reachable_objects() {
        let doc = PdfDocument::load(&sample_pdf(10)).unwrap();
        let part = doc.extract_range(&ResolvedRange::new(7, 7)).unwrap();

        // page, its content stream, the new page tree root and catalog
        assert_eq!(part.objects.len(), 4);
        assert_eq!(page_texts(&part), vec!["Page 7"]);
    }

    #[test]
    fn test_extract_keeps_inherited_attributes() {
        let mut source = Document::load_mem(&sample_pdf(3)).unwrap();
        let pages_id = source
            .catalog()
            .unwrap()
            .get(b"Pages")
            .and_then(Object::as_reference)
            .unwrap();
        let page_ids: Vec<ObjectId> = source.get_pages().values().copied().collect();
        for page_id in &page_ids {
            source.get_dictionary_mut(*page_id).unwrap().remove(b"MediaBox");
        }
        let media_box = Object::Array(
            [0, 0, 300, 400].into_iter().map(Object::Integer).collect(),
        );
        source
            .get_dictionary_mut(pages_id)
            .unwrap()
            .set("MediaBox", media_box);
        let bytes = PdfDocument::to_bytes(&mut source).unwrap();

        let doc = PdfDocument::load(&bytes).unwrap();
        let mut part = doc.extract_range(&ResolvedRange::new(2, 2)).unwrap();
        let part = reload(&mut part);
        let page_id = *part.get_pages().values().next().unwrap();
        let page = part.get_dictionary(page_id).unwrap();
        let inherited: Vec<i64> = page
            .get(b"MediaBox")
            .and_then(Object::as_array)
            .unwrap()
            .iter()
            .map(|value| value.as_i64().unwrap())
            .collect();
        assert_eq!(inherited, vec![0, 0, 300, 400]);
    }
}
