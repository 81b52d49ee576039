//! Folder view over flat object keys
//!
//! Object storage has no directories; `/` inside a key is only a naming
//! convention. The builder here groups a listing into the files that sit
//! directly under a prefix (group `"."`) and the first-level subfolders
//! below it (one group per first path segment).

use indexmap::IndexMap;
use serde::Serialize;

use crate::storage::ObjectSummary;

/// Label of the group holding entries with no further `/` after the prefix
pub const ROOT_GROUP: &str = ".";

/// Grouped view of a listing: group label to entries in listing order.
///
/// Groups are kept in order of first insertion.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Grouping {
    groups: IndexMap<String, Vec<ObjectSummary>>,
}

impl Grouping {
    /// Entries directly under the prefix
    pub fn files(&self) -> &[ObjectSummary] {
        self.get(ROOT_GROUP).unwrap_or(&[])
    }

    /// Entries of one group
    pub fn get(&self, label: &str) -> Option<&[ObjectSummary]> {
        self.groups.get(label).map(Vec::as_slice)
    }

    /// Subfolder groups, in first-seen order, excluding `"."`
    pub fn folders(&self) -> impl Iterator<Item = (&str, &[ObjectSummary])> {
        self.iter().filter(|(label, _)| *label != ROOT_GROUP)
    }

    /// All groups, in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ObjectSummary])> {
        self.groups
            .iter()
            .map(|(label, entries)| (label.as_str(), entries.as_slice()))
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of entries across all groups
    pub fn entry_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    fn push(&mut self, label: &str, entry: ObjectSummary) {
        self.groups.entry(label.to_string()).or_default().push(entry);
    }
}

/// Build the two-level folder view of `entries` listed under `prefix`.
///
/// Each key loses a leading `prefix + "/"` (when the prefix is non-empty and
/// the key starts with it). The remainder is split on `/` token by token, with
/// no normalization of empty segments: a single segment lands in `"."`, more
/// than one lands in the group named by the first segment. Entries keep their
/// metadata and carry the stripped key.
pub fn build_hierarchy<I>(prefix: Option<&str>, entries: I) -> Grouping
where
    I: IntoIterator<Item = ObjectSummary>,
{
    let strip = prefix
        .filter(|p| !p.is_empty())
        .map(|p| format!("{}/", p));

    let mut grouping = Grouping::default();

    for mut entry in entries {
        if let Some(residual) = strip
            .as_deref()
            .and_then(|s| entry.key.strip_prefix(s))
        {
            entry.key = residual.to_string();
        }

        let mut segments = entry.key.split('/');
        let first = segments.next().unwrap_or_default().to_string();

        if segments.next().is_some() {
            grouping.push(&first, entry);
        } else {
            grouping.push(ROOT_GROUP, entry);
        }
    }

    grouping
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, size: u64) -> ObjectSummary {
        ObjectSummary {
            key: key.to_string(),
            size,
            last_modified: Some("2024-03-01T10:00:00.000Z".to_string()),
            e_tag: Some(format!("\"etag-{}\"", size)),
            storage_class: Some("STANDARD".to_string()),
        }
    }

    fn keys(entries: &[ObjectSummary]) -> Vec<&str> {
        entries.iter().map(|e| e.key.as_str()).collect()
    }

    #[test]
    fn test_empty_listing() {
        let grouping = build_hierarchy(None, Vec::new());
        assert!(grouping.is_empty());
        assert_eq!(grouping.entry_count(), 0);
    }

    #[test]
    fn test_file_under_prefix() {
        let grouping = build_hierarchy(Some("docs"), vec![entry("docs/readme.txt", 1)]);
        assert_eq!(grouping.len(), 1);
        let files = grouping.files();
        assert_eq!(keys(files), vec!["readme.txt"]);
        assert_eq!(files[0].size, 1);
        assert_eq!(files[0].e_tag.as_deref(), Some("\"etag-1\""));
    }

    #[test]
    fn test_subfolder_keeps_segment() {
        let grouping = build_hierarchy(Some("docs"), vec![entry("docs/img/logo.png", 7)]);
        assert_eq!(grouping.len(), 1);
        assert_eq!(keys(grouping.get("img").unwrap()), vec!["img/logo.png"]);
        assert!(grouping.get(ROOT_GROUP).is_none());
    }

    #[test]
    fn test_no_prefix_groups_in_order() {
        let grouping = build_hierarchy(
            None,
            vec![entry("a.txt", 1), entry("b/c.txt", 2), entry("b/d.txt", 3)],
        );
        assert_eq!(keys(grouping.files()), vec!["a.txt"]);
        assert_eq!(keys(grouping.get("b").unwrap()), vec!["b/c.txt", "b/d.txt"]);

        let labels: Vec<&str> = grouping.iter().map(|(label, _)| label).collect();
        assert_eq!(labels, vec![".", "b"]);
        let folders: Vec<&str> = grouping.folders().map(|(label, _)| label).collect();
        assert_eq!(folders, vec!["b"]);
    }

    #[test]
    fn test_key_equal_to_prefix_with_slash() {
        let grouping = build_hierarchy(Some("docs"), vec![entry("docs/", 0)]);
        assert_eq!(keys(grouping.files()), vec![""]);
    }

    #[test]
    fn test_key_equal_to_bare_prefix_is_untouched() {
        let grouping = build_hierarchy(Some("docs"), vec![entry("docs", 0)]);
        assert_eq!(keys(grouping.files()), vec!["docs"]);
    }

    #[test]
    fn test_sibling_prefix_not_stripped() {
        // Listing by "docs" also returns "docs2/..." keys
        let grouping = build_hierarchy(Some("docs"), vec![entry("docs2/a.txt", 0)]);
        assert_eq!(keys(grouping.get("docs2").unwrap()), vec!["docs2/a.txt"]);
    }

    #[test]
    fn test_empty_prefix_means_no_stripping() {
        let with_empty = build_hierarchy(Some(""), vec![entry("x/y", 0), entry("z", 0)]);
        let with_none = build_hierarchy(None, vec![entry("x/y", 0), entry("z", 0)]);
        assert_eq!(with_empty, with_none);
    }

    #[test]
    fn test_malformed_keys_split_literally() {
        let grouping = build_hierarchy(
            None,
            vec![entry("/leading", 0), entry("a//b", 0), entry("trailing/", 0)],
        );
        assert_eq!(keys(grouping.get("").unwrap()), vec!["/leading"]);
        assert_eq!(keys(grouping.get("a").unwrap()), vec!["a//b"]);
        assert_eq!(keys(grouping.get("trailing").unwrap()), vec!["trailing/"]);
        assert!(grouping.get(ROOT_GROUP).is_none());
    }

    #[test]
    fn test_every_entry_in_exactly_one_group() {
        let input: Vec<ObjectSummary> = [
            "photos/2023/a.jpg",
            "photos/b.jpg",
            "photos/2024/c.jpg",
            "notes.txt",
            "photos//d.jpg",
            "photos/",
            "music/x.mp3",
        ]
        .iter()
        .enumerate()
        .map(|(i, k)| entry(k, i as u64))
        .collect();

        let grouping = build_hierarchy(Some("photos"), input.clone());
        assert_eq!(grouping.entry_count(), input.len());

        let mut sizes: Vec<u64> = grouping
            .iter()
            .flat_map(|(_, entries)| entries.iter().map(|e| e.size))
            .collect();
        sizes.sort_unstable();
        assert_eq!(sizes, (0..input.len() as u64).collect::<Vec<_>>());
    }

    #[test]
    fn test_deterministic() {
        let input = vec![entry("b/1", 1), entry("a", 2), entry("c/2", 3), entry("b/3", 4)];
        let first = build_hierarchy(Some("root"), input.clone());
        let second = build_hierarchy(Some("root"), input);
        assert_eq!(first, second);
    }

    #[test]
    fn test_serializes_in_insertion_order() {
        let grouping = build_hierarchy(None, vec![entry("z/1", 1), entry("a", 2)]);
        let json = serde_json::to_value(&grouping).unwrap();
        let labels: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(labels.len(), 2);
        assert_eq!(json["z"][0]["key"], "z/1");
        assert_eq!(json["."][0]["key"], "a");
    }
}
