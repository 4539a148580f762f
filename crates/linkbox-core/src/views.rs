//! Derived views over the mirror
//!
//! Pure functions of the link list; recomputed in full whenever the mirror
//! changes. Collections are personal bookmark lists, so no indexes.

use std::collections::BTreeSet;

use crate::models::{Link, DEFAULT_CATEGORY};

/// Number of links in the "recent" view
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Links marked as favorite, in their original order
pub fn favorites(links: &[Link]) -> Vec<Link> {
    links.iter().filter(|link| link.is_favorite).cloned().collect()
}

/// The first `n` links of a newest-first list
pub fn recent(links: &[Link], n: usize) -> &[Link] {
    &links[..n.min(links.len())]
}

/// Links whose title contains `term`, ignoring case
///
/// An empty term returns every link. Only titles are matched; URLs and tags
/// are not.
pub fn search_by_title<'a>(links: &'a [Link], term: &str) -> Vec<&'a Link> {
    if term.is_empty() {
        return links.iter().collect();
    }

    let needle = term.to_lowercase();
    links
        .iter()
        .filter(|link| link.title_contains(&needle))
        .collect()
}

/// Number of distinct categories; a blank category counts as the default
pub fn category_count(links: &[Link]) -> usize {
    links
        .iter()
        .map(|link| match link.category.trim() {
            "" => DEFAULT_CATEGORY,
            category => category,
        })
        .collect::<BTreeSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn link(id: &str, title: &str, tags: &[&str], is_favorite: bool) -> Link {
        Link {
            id: id.to_string(),
            url: format!("https://{}.example.com", id),
            title: title.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            category: "default".to_string(),
            is_favorite,
            user_id: "u1".to_string(),
            created_at: DateTime::<Utc>::from_timestamp_millis(0).unwrap(),
        }
    }

    fn sample() -> Vec<Link> {
        vec![
            link("soop", "SOOP Live", &["stream"], true),
            link("rust", "The Rust Book", &["lang"], false),
            link("tokio", "Tokio tutorial", &["rust", "async"], true),
        ]
    }

    fn ids(links: &[&Link]) -> Vec<String> {
        links.iter().map(|l| l.id.clone()).collect()
    }

    #[test]
    fn test_empty_term_returns_everything_in_order() {
        let links = sample();
        assert_eq!(ids(&search_by_title(&links, "")), vec!["soop", "rust", "tokio"]);
    }

    #[test]
    fn test_search_ignores_case() {
        let links = sample();
        assert_eq!(ids(&search_by_title(&links, "rUsT")), vec!["rust"]);
        assert_eq!(ids(&search_by_title(&links, "s")), vec!["soop", "rust"]);
    }

    #[test]
    fn test_search_matches_titles_only() {
        let links = sample();
        // "async" is only a tag, "example" only in URLs
        assert!(search_by_title(&links, "async").is_empty());
        assert!(search_by_title(&links, "example").is_empty());
    }

    #[test]
    fn test_search_without_match_is_empty() {
        let links = sample();
        assert!(search_by_title(&links, "python").is_empty());
        assert!(search_by_title(&[], "python").is_empty());
    }

    #[test]
    fn test_search_non_ascii_titles() {
        let links = vec![link("k", "숲 라이브", &[], false), link("e", "Éclair", &[], false)];
        assert_eq!(ids(&search_by_title(&links, "숲")), vec!["k"]);
        assert_eq!(ids(&search_by_title(&links, "éclair")), vec!["e"]);
    }

    #[test]
    fn test_favorites_keep_order() {
        let fav: Vec<String> = favorites(&sample()).into_iter().map(|l| l.id).collect();
        assert_eq!(fav, vec!["soop", "tokio"]);
    }

    #[test]
    fn test_category_count() {
        assert_eq!(category_count(&[]), 0);
        assert_eq!(category_count(&sample()), 1);

        let mut links = sample();
        links[0].category = "video".to_string();
        links[1].category = "  ".to_string();
        // The blank category folds into "default"
        assert_eq!(category_count(&links), 2);
    }

    #[test]
    fn test_recent() {
        let links = sample();
        assert_eq!(recent(&links, 2).len(), 2);
        assert_eq!(recent(&links, 2)[0].id, "soop");
        assert_eq!(recent(&links, DEFAULT_RECENT_LIMIT).len(), 3);
        assert!(recent(&links, 0).is_empty());
    }
}
