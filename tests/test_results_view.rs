use book_search::api_client::{ImageLinks, Volume, VolumeInfo};
use book_search::ui::results_view::{
    count_text, format_authors, load_more_text, primary_category,
};

fn volume(title: &str, authors: &[&str], categories: &[&str]) -> Volume {
    Volume {
        id: title.to_lowercase(),
        info: VolumeInfo {
            title: title.to_string(),
            authors: authors.iter().map(|s| s.to_string()).collect(),
            categories: categories.iter().map(|s| s.to_string()).collect(),
            published_date: None,
            image_links: None,
        },
    }
}

#[test]
fn test_card_author_rule_matches_provider_records() {
    let solo = volume("Dune", &["Frank Herbert"], &["Fiction"]);
    assert_eq!(format_authors(&solo.info.authors), "Frank Herbert");

    let trio = volume("Anthology", &["A", "B", "C"], &[]);
    assert_eq!(format_authors(&trio.info.authors), "A, B and 1 more");

    let anonymous = volume("Beowulf", &[], &["Poetry"]);
    assert_eq!(format_authors(&anonymous.info.authors), "Unknown author");
}

#[test]
fn test_category_line() {
    let tagged = volume("SPQR", &["Mary Beard"], &["History", "Rome"]);
    assert_eq!(primary_category(&tagged), "History");

    let untagged = volume("Mystery", &[], &[]);
    assert_eq!(primary_category(&untagged), "Uncategorized");
}

#[test]
fn test_thumbnail_marker_detection() {
    let mut vol = volume("Dune", &[], &[]);
    assert!(!vol.has_thumbnail());

    vol.info.image_links = Some(ImageLinks {
        thumbnail: Some("http://example.com/dune.png".to_string()),
        small_thumbnail: None,
    });
    assert!(vol.has_thumbnail());

    vol.info.image_links = Some(ImageLinks::default());
    assert!(!vol.has_thumbnail());
}

#[test]
fn test_count_line_through_a_search_lifecycle() {
    // Fresh query in flight, nothing yet.
    assert_eq!(count_text(0, true), "Searching…");
    // First page arrived.
    assert_eq!(count_text(30, false), "30 books found");
    // Load-more in flight keeps the running count.
    assert_eq!(count_text(30, true), "30 books found");
    // Second (short) page arrived.
    assert_eq!(count_text(42, false), "42 books found");
}

#[test]
fn test_load_more_affordance_gating() {
    // Offered when more pages may exist.
    assert!(load_more_text(false, false).is_some());
    // Disabled (but visible) while loading.
    assert_eq!(load_more_text(true, false), Some("Loading…"));
    // Gone entirely once exhausted, loading or not.
    assert_eq!(load_more_text(false, true), None);
    assert_eq!(load_more_text(true, true), None);
}
