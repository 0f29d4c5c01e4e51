//! Stable sort, filter and pagination for dependency/project listings
//!
//! The backend delivers listings as JSON; views own the sort/search/page
//! state and pass it in per call. The engine itself is stateless and returns
//! a fresh list every invocation, composing in the fixed order
//! filter → sort → paginate.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Fields searched by [`filter_records`], as dot-separated paths
const SEARCHABLE_PATHS: &[&str] = &["versionKey.name", "versionKey.version", "relation"];

/// Sort direction for a column
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggle(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Comparable key extracted from a record field.
///
/// Backend records mix types across columns (strings, counts, advisory
/// arrays), so keys carry a total order: Null < Bool < Number < Text.
/// Arrays and objects compare by their JSON text.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl SortValue {
    fn type_rank(&self) -> u8 {
        match self {
            SortValue::Null => 0,
            SortValue::Bool(_) => 1,
            SortValue::Number(_) => 2,
            SortValue::Text(_) => 3,
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Bool(a), SortValue::Bool(b)) => a.cmp(b),
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

/// A record the table engine can order and search.
///
/// Implementors resolve dot-separated paths into comparable keys; a missing
/// intermediate field resolves to `None` rather than failing, and `None`
/// sorts before every defined value.
pub trait PathResolvable {
    /// Resolve a dot-separated path (e.g. `versionKey.name`) to a sort key.
    fn resolve_path(&self, path: &str) -> Option<SortValue>;

    /// Case-insensitive substring match against the searchable fields.
    fn matches_search(&self, needle_lower: &str) -> bool {
        SEARCHABLE_PATHS.iter().any(|path| {
            matches!(
                self.resolve_path(path),
                Some(SortValue::Text(text)) if text.to_lowercase().contains(needle_lower)
            )
        })
    }
}

impl PathResolvable for serde_json::Value {
    fn resolve_path(&self, path: &str) -> Option<SortValue> {
        let mut current = self;
        for segment in path.split('.') {
            current = current.get(segment)?;
        }

        Some(match current {
            serde_json::Value::Null => SortValue::Null,
            serde_json::Value::Bool(b) => SortValue::Bool(*b),
            serde_json::Value::Number(n) => SortValue::Number(n.as_f64()?),
            serde_json::Value::String(s) => SortValue::Text(s.clone()),
            // Arrays/objects (e.g. advisoryDetail) order by their JSON text
            other => SortValue::Text(other.to_string()),
        })
    }
}

/// Sort/search/page state, owned by the view and passed in per invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableState {
    pub search: String,
    pub order_by: Option<String>,
    pub direction: SortDirection,
    pub page: usize,
    pub page_size: usize,
}

impl Default for TableState {
    fn default() -> Self {
        Self {
            search: String::new(),
            order_by: None,
            direction: SortDirection::Asc,
            page: 1,
            page_size: crate::config::TableConfig::default().page_size,
        }
    }
}

/// Stable sort by the key at `path`.
///
/// Decorate-sort-undecorate with the original index as tiebreaker, so records
/// with equal keys keep their relative input order. `Desc` flips the
/// comparator sign rather than reversing the output, which preserves that
/// stability under ties.
pub fn sort_records<T: PathResolvable>(
    records: Vec<T>,
    path: &str,
    direction: SortDirection,
) -> Vec<T> {
    let mut decorated: Vec<(T, usize)> = records.into_iter().zip(0..).collect();

    decorated.sort_by(|(a, a_index), (b, b_index)| {
        let a_key = a.resolve_path(path);
        let b_key = b.resolve_path(path);

        let ordering = match (&a_key, &b_key) {
            (Some(a_key), Some(b_key)) => a_key.compare(b_key),
            // Unresolved paths sort before all defined values
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };

        let ordering = match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };

        ordering.then(a_index.cmp(b_index))
    });

    decorated.into_iter().map(|(record, _)| record).collect()
}

/// Keep records whose name, version or relation contains `term`
/// (case-insensitive). An empty term is the identity.
pub fn filter_records<T: PathResolvable>(records: Vec<T>, term: &str) -> Vec<T> {
    if term.is_empty() {
        return records;
    }
    let needle = term.to_lowercase();
    records
        .into_iter()
        .filter(|record| record.matches_search(&needle))
        .collect()
}

/// Take the 1-based `page` of `page_size` records.
///
/// Out-of-range pages (including page 0) yield an empty list, not an error.
pub fn paginate<T>(records: Vec<T>, page_size: usize, page: usize) -> Vec<T> {
    if page == 0 || page_size == 0 {
        return Vec::new();
    }
    // A page number large enough to overflow the offset is out of range too
    let Some(offset) = (page - 1).checked_mul(page_size) else {
        return Vec::new();
    };
    records.into_iter().skip(offset).take(page_size).collect()
}

/// Number of pages needed for `total` records at `page_size` per page
pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// Apply the full pipeline for one render: filter → sort → paginate.
pub fn apply<T: PathResolvable>(records: Vec<T>, state: &TableState) -> Vec<T> {
    let filtered = filter_records(records, &state.search);
    let sorted = match &state.order_by {
        Some(path) => sort_records(filtered, path, state.direction),
        None => filtered,
    };
    paginate(sorted, state.page_size, state.page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn dependency(name: &str, version: &str, relation: &str) -> Value {
        json!({
            "versionKey": { "system": "NPM", "name": name, "version": version },
            "relation": relation,
            "licenses": ["MIT"],
        })
    }

    fn names(records: &[Value]) -> Vec<&str> {
        records
            .iter()
            .map(|r| r["versionKey"]["name"].as_str().unwrap())
            .collect()
    }

    #[test]
    fn test_sort_by_nested_path() {
        let records = vec![
            dependency("react", "18.2.0", "SELF"),
            dependency("axios", "1.6.0", "DIRECT"),
            dependency("loose-envify", "1.4.0", "INDIRECT"),
        ];

        let sorted = sort_records(records, "versionKey.name", SortDirection::Asc);
        assert_eq!(names(&sorted), vec!["axios", "loose-envify", "react"]);
    }

    #[test]
    fn test_sort_is_stable_under_ties() {
        let records = vec![
            dependency("b", "1.0.0", "DIRECT"),
            dependency("a", "1.0.0", "DIRECT"),
            dependency("c", "1.0.0", "DIRECT"),
        ];

        // All versions equal: input order must survive, both directions
        let asc = sort_records(records.clone(), "versionKey.version", SortDirection::Asc);
        assert_eq!(names(&asc), vec!["b", "a", "c"]);

        let desc = sort_records(records, "versionKey.version", SortDirection::Desc);
        assert_eq!(names(&desc), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_desc_reverses_comparator_not_list() {
        let records = vec![
            dependency("a", "2.0.0", "DIRECT"),
            dependency("b", "1.0.0", "DIRECT"),
            dependency("c", "2.0.0", "DIRECT"),
        ];

        let desc = sort_records(records, "versionKey.version", SortDirection::Desc);
        // 2.0.0 ties keep input order a, c; 1.0.0 sorts last
        assert_eq!(names(&desc), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_missing_path_sorts_first_without_panicking() {
        let mut incomplete = json!({ "relation": "DIRECT" });
        incomplete["versionKey"] = Value::Null;

        let records = vec![dependency("axios", "1.6.0", "DIRECT"), incomplete.clone()];
        let sorted = sort_records(records, "versionKey.name", SortDirection::Asc);
        assert_eq!(sorted[0], incomplete);
    }

    #[test]
    fn test_filter_matches_name_version_relation() {
        let records = vec![
            dependency("react", "18.2.0", "SELF"),
            dependency("axios", "1.6.0", "DIRECT"),
            dependency("scheduler", "0.23.0", "INDIRECT"),
        ];

        assert_eq!(names(&filter_records(records.clone(), "REACT")), vec!["react"]);
        assert_eq!(names(&filter_records(records.clone(), "18.2")), vec!["react"]);
        // "direct" also matches INDIRECT as a substring
        assert_eq!(
            names(&filter_records(records, "direct")),
            vec!["axios", "scheduler"]
        );
    }

    #[test]
    fn test_filter_empty_term_is_identity() {
        let records = vec![
            dependency("react", "18.2.0", "SELF"),
            dependency("axios", "1.6.0", "DIRECT"),
        ];
        assert_eq!(filter_records(records.clone(), ""), records);
    }

    #[test]
    fn test_paginate_is_pure_slice() {
        let records: Vec<Value> = (0..7)
            .map(|i| dependency(&format!("dep{i}"), "1.0.0", "DIRECT"))
            .collect();

        assert_eq!(paginate(records.clone(), 3, 1).len(), 3);
        assert_eq!(names(&paginate(records.clone(), 3, 3)), vec!["dep6"]);
        assert!(paginate(records.clone(), 3, 4).is_empty());
        assert!(paginate(records.clone(), 3, 0).is_empty());
        assert!(paginate(records, 0, 1).is_empty());
    }

    #[test]
    fn test_paginate_huge_page_number_is_empty_not_overflow() {
        let records = vec![dependency("react", "18.2.0", "SELF")];
        assert!(paginate(records.clone(), 5, usize::MAX).is_empty());
        assert!(paginate(records, usize::MAX, 3).is_empty());
    }

    #[test]
    fn test_page_concatenation_reconstructs_sorted_list() {
        let records: Vec<Value> = (0..23)
            .map(|i| dependency(&format!("dep{i:02}"), "1.0.0", "DIRECT"))
            .collect();

        for page_size in 1..=7 {
            let sorted = sort_records(records.clone(), "versionKey.name", SortDirection::Asc);
            let mut reassembled = Vec::new();
            for page in 1..=page_count(sorted.len(), page_size) {
                reassembled.extend(paginate(sorted.clone(), page_size, page));
            }
            assert_eq!(reassembled, sorted, "page_size {page_size}");
        }
    }

    #[test]
    fn test_apply_composes_filter_sort_paginate() {
        let records = vec![
            dependency("react", "18.2.0", "SELF"),
            dependency("react-dom", "18.2.0", "DIRECT"),
            dependency("axios", "1.6.0", "DIRECT"),
            dependency("react-router", "6.14.0", "DIRECT"),
        ];

        let state = TableState {
            search: "react".to_string(),
            order_by: Some("versionKey.name".to_string()),
            direction: SortDirection::Asc,
            page: 1,
            page_size: 2,
        };

        let page = apply(records, &state);
        assert_eq!(names(&page), vec!["react", "react-dom"]);
    }

    #[test]
    fn test_page_count_follows_filtered_listing() {
        let records: Vec<Value> = (0..12)
            .map(|i| dependency(&format!("react-{i}"), "1.0.0", "DIRECT"))
            .chain((0..3).map(|i| dependency(&format!("axios-{i}"), "1.0.0", "DIRECT")))
            .collect();

        // Pagination controls size to the filtered listing, not the raw count
        let filtered = filter_records(records, "axios");
        assert_eq!(page_count(filtered.len(), 5), 1);
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 5), 0);
        assert_eq!(page_count(5, 5), 1);
        assert_eq!(page_count(6, 5), 2);
        assert_eq!(page_count(10, 0), 0);
    }

    #[test]
    fn test_direction_toggle() {
        assert_eq!(SortDirection::Asc.toggle(), SortDirection::Desc);
        assert_eq!(SortDirection::Desc.toggle(), SortDirection::Asc);
    }
}
