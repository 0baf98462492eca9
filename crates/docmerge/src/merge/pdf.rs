//! PDF page concatenation.
//!
//! The output document starts empty: a fresh catalog and a flat page tree.
//! Each source is renumbered past the objects already in the output, its
//! pages are re-parented onto the output page tree, and its own catalog and
//! page-tree nodes are dropped. Page content, resources and annotations are
//! carried over as-is.

use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};
use tracing::debug;

use crate::error::{DocMergeError, Result};
use crate::io::LoadedPdf;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_ATTRIBUTES: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains in malformed files.
const MAX_TREE_DEPTH: usize = 64;

const DEFAULT_VERSION: &str = "1.4";

/// A merged PDF held in memory.
#[derive(Debug)]
pub struct PdfArtifact {
    /// The merged document.
    pub document: Document,

    /// Total number of pages.
    pub page_count: usize,
}

/// Merges loaded PDFs by appending their pages in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfMerger;

impl PdfMerger {
    /// Create a new PDF merger.
    pub fn new() -> Self {
        Self
    }

    /// Concatenate the pages of `sources`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`DocMergeError::MergeFailed`] if a source's page tree cannot
    /// be walked.
    pub fn merge(&self, sources: Vec<LoadedPdf>) -> Result<PdfArtifact> {
        let version = highest_version(sources.iter().map(|s| s.document.version.as_str()));
        let mut merged = Document::with_version(version);

        let pages_id = merged.new_object_id();
        let catalog_id = merged.new_object_id();
        merged.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => Vec::<Object>::new(),
                "Count" => 0,
            }),
        );
        merged.objects.insert(
            catalog_id,
            Object::Dictionary(dictionary! {
                "Type" => "Catalog",
                "Pages" => pages_id,
            }),
        );
        merged.trailer.set("Root", catalog_id);

        let mut page_count = 0;
        for source in sources {
            let LoadedPdf { document, path, .. } = source;
            let page_ids = append_document(&mut merged, pages_id, document)
                .map_err(|reason| DocMergeError::merge_failed(&path, reason))?;

            debug!(path = %path.display(), pages = page_ids.len(), "appended source pages");
            page_count += page_ids.len();
        }

        merged.renumber_objects();

        Ok(PdfArtifact {
            document: merged,
            page_count,
        })
    }
}

/// Move every page of `doc` under the page tree node `pages_id` of `merged`.
fn append_document(
    merged: &mut Document,
    pages_id: ObjectId,
    mut doc: Document,
) -> std::result::Result<Vec<ObjectId>, String> {
    doc.renumber_objects_with(merged.max_id + 1);

    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();

    for &page_id in &page_ids {
        let inherited = inherited_attributes(&doc, page_id);
        let page = doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| format!("Page {page_id:?} is not a dictionary: {e}"))?;

        for (key, value) in inherited {
            page.set(key, value);
        }
        page.set("Parent", pages_id);
    }

    doc.objects.retain(|_, object| !is_tree_node(object));

    let doc_max = doc.objects.keys().map(|(id, _)| *id).max().unwrap_or(0);
    merged.max_id = merged.max_id.max(doc_max).max(doc.max_id);
    merged.objects.extend(doc.objects);

    add_pages_to_tree(merged, pages_id, &page_ids)?;
    Ok(page_ids)
}

/// Inheritable attributes the page lacks but an ancestor defines.
fn inherited_attributes(doc: &Document, page_id: ObjectId) -> Vec<(Vec<u8>, Object)> {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return Vec::new();
    };

    INHERITABLE_ATTRIBUTES
        .iter()
        .filter(|key| !page.has(key))
        .filter_map(|key| ancestor_value(doc, page, key).map(|v| (key.to_vec(), v)))
        .collect()
}

fn ancestor_value(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = parent_of(page);

    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(parent?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = parent_of(node);
    }

    None
}

fn parent_of(node: &Dictionary) -> Option<ObjectId> {
    node.get(b"Parent").and_then(Object::as_reference).ok()
}

fn is_tree_node(object: &Object) -> bool {
    let Object::Dictionary(dict) = object else {
        return false;
    };
    matches!(
        dict.get(b"Type").and_then(Object::as_name),
        Ok(b"Catalog") | Ok(b"Pages")
    )
}

fn add_pages_to_tree(
    merged: &mut Document,
    pages_id: ObjectId,
    page_ids: &[ObjectId],
) -> std::result::Result<(), String> {
    let pages = merged
        .get_object_mut(pages_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| format!("Output page tree is not a dictionary: {e}"))?;

    match pages.get_mut(b"Kids") {
        Ok(Object::Array(kids)) => {
            kids.extend(page_ids.iter().map(|&id| Object::Reference(id)));
        }
        _ => return Err("Output page tree is missing its Kids array".to_string()),
    }

    let count = pages.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
    pages.set("Count", count + page_ids.len() as i64);

    Ok(())
}

/// Highest `major.minor` version among `versions`.
fn highest_version<'a>(versions: impl IntoIterator<Item = &'a str>) -> &'a str {
    versions
        .into_iter()
        .filter_map(|v| parse_version(v).map(|parsed| (parsed, v)))
        .max_by_key(|(parsed, _)| *parsed)
        .map(|(_, v)| v)
        .unwrap_or(DEFAULT_VERSION)
}

fn parse_version(version: &str) -> Option<(u32, u32)> {
    let (major, minor) = version.trim().split_once('.')?;
    Some((major.parse().ok()?, minor.parse().ok()?))
}
