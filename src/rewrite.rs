//! Markdown image-reference rewriting.
//!
//! A reference is `![alt](path)`: `alt` is any run of characters other than
//! `]` (possibly empty), `path` a non-empty run of characters other than `)`.
//! Matches are found leftmost-first and never overlap. Each match is looked up
//! by the file name of its path; hits are re-pointed into [`IMAGES_DIR`],
//! misses are copied through byte for byte.

use std::collections::HashMap;

use crate::naming::CanonicalName;

/// Directory, relative to the document, that holds its images.
pub const IMAGES_DIR: &str = "images";

/// Original file name -> canonical name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameMapping {
    inner: HashMap<String, CanonicalName>,
}

impl NameMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, original: impl Into<String>, name: CanonicalName) {
        self.inner.insert(original.into(), name);
    }

    pub fn get(&self, original: &str) -> Option<&CanonicalName> {
        self.inner.get(original)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl FromIterator<(String, CanonicalName)> for NameMapping {
    fn from_iter<I: IntoIterator<Item = (String, CanonicalName)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

/// One `![alt](path)` occurrence; `start..end` spans the whole match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageRef<'a> {
    pub start: usize,
    pub end: usize,
    pub alt: &'a str,
    pub path: &'a str,
}

/// Try to match a reference beginning exactly at byte `at`.
fn match_at(doc: &str, at: usize) -> Option<ImageRef<'_>> {
    let rest = doc.get(at..)?.strip_prefix("![")?;
    let alt_start = at + 2;

    let alt_len = rest.find(']')?;
    let after_alt = rest[alt_len + 1..].strip_prefix('(')?;
    let path_start = alt_start + alt_len + 2;

    let path_len = after_alt.find(')')?;
    if path_len == 0 {
        return None;
    }

    Some(ImageRef {
        start: at,
        end: path_start + path_len + 1,
        alt: &doc[alt_start..alt_start + alt_len],
        path: &doc[path_start..path_start + path_len],
    })
}

/// All references in left-to-right order.
pub fn find_image_refs(doc: &str) -> Vec<ImageRef<'_>> {
    let mut refs = Vec::new();
    let mut pos = 0;
    while let Some(off) = doc[pos..].find("![") {
        let at = pos + off;
        match match_at(doc, at) {
            Some(r) => {
                pos = r.end;
                refs.push(r);
            }
            // `!` is ASCII, so the next byte is a char boundary.
            None => pos = at + 1,
        }
    }
    refs
}

/// Last `/`-separated segment of `path`, ignoring trailing separators.
pub fn file_name_of(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return if path.is_empty() { "." } else { "/" };
    }
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Re-point every mapped reference in `doc` at `images/<canonical name>`.
pub fn rewrite_references(doc: &str, mapping: &NameMapping) -> String {
    let mut out = String::with_capacity(doc.len());
    let mut last = 0;
    let mut replaced = 0usize;

    for r in find_image_refs(doc) {
        let Some(name) = mapping.get(file_name_of(r.path)) else {
            continue;
        };
        let new_path = format!("{IMAGES_DIR}/{name}");
        tracing::debug!(from = r.path, to = %new_path, "updating image reference");

        out.push_str(&doc[last..r.start]);
        out.push_str("![");
        out.push_str(r.alt);
        out.push_str("](");
        out.push_str(&new_path);
        out.push(')');
        last = r.end;
        replaced += 1;
    }
    out.push_str(&doc[last..]);

    tracing::debug!(replaced, "image references rewritten");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::canonical_name;

    fn mapping(pairs: &[(&str, &[u8])]) -> NameMapping {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), canonical_name(v)))
            .collect()
    }

    #[test]
    fn finds_references_left_to_right() {
        let doc = "a ![one](x/1.png) b ![](2.jpg)\n![three](3.gif)";
        let refs = find_image_refs(doc);
        let got: Vec<_> = refs.iter().map(|r| (r.alt, r.path)).collect();
        assert_eq!(
            got,
            vec![("one", "x/1.png"), ("", "2.jpg"), ("three", "3.gif")]
        );
        assert_eq!(&doc[refs[0].start..refs[0].end], "![one](x/1.png)");
    }

    #[test]
    fn rejects_incomplete_shapes() {
        assert!(find_image_refs("![alt]()").is_empty());
        assert!(find_image_refs("![alt] (a.png)").is_empty());
        assert!(find_image_refs("![alt](a.png").is_empty());
        assert!(find_image_refs("[alt](a.png)").is_empty());
        assert!(find_image_refs("!![alt").is_empty());
    }

    #[test]
    fn failed_start_is_retried_one_byte_later() {
        let refs = find_image_refs("![a![b](c.png)");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].alt, "a![b");
        assert_eq!(refs[0].path, "c.png");

        let refs = find_image_refs("!![x](y.png)");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].start, 1);
    }

    #[test]
    fn alt_may_span_lines_and_hold_unicode() {
        let refs = find_image_refs("![猫\n图](images/猫.jpg)");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].alt, "猫\n图");
        assert_eq!(file_name_of(refs[0].path), "猫.jpg");
    }

    #[test]
    fn file_name_takes_the_last_segment() {
        assert_eq!(file_name_of("images/cat.jpg"), "cat.jpg");
        assert_eq!(file_name_of("./a/b/c.png"), "c.png");
        assert_eq!(file_name_of("cat.jpg"), "cat.jpg");
        assert_eq!(file_name_of("dir/"), "dir");
        assert_eq!(file_name_of("///"), "/");
    }

    #[test]
    fn empty_mapping_leaves_document_unchanged() {
        let doc = "# t\n![a](images/a.png) and ![](b.jpg) ![x](https://e.com/c.gif)\n";
        assert_eq!(rewrite_references(doc, &NameMapping::new()), doc);
    }

    #[test]
    fn rewrites_matched_paths_and_preserves_alt() {
        let m = mapping(&[("cat.jpg", b"")]);
        let doc = "see ![cat](images/cat.jpg) and ![](cat.jpg) but ![dog](images/dog.jpg)";
        assert_eq!(
            rewrite_references(doc, &m),
            "see ![cat](images/d41d8cd98f00b204e9800998ecf8427e.avif) and \
             ![](images/d41d8cd98f00b204e9800998ecf8427e.avif) but ![dog](images/dog.jpg)"
        );
    }

    #[test]
    fn repeated_references_are_rewritten_identically() {
        let m = mapping(&[("a.png", b"abc")]);
        let out = rewrite_references("![1](a.png)![2](a.png)", &m);
        assert_eq!(
            out,
            "![1](images/900150983cd24fb0d6963f7d28e17f72.avif)\
             ![2](images/900150983cd24fb0d6963f7d28e17f72.avif)"
        );
    }

    #[test]
    fn unmapped_non_image_references_survive() {
        let m = mapping(&[("a.png", b"abc")]);
        let doc = "![doc](files/report.pdf)";
        assert_eq!(rewrite_references(doc, &m), doc);
    }
}
