//! Sitemap feed parsing

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashSet;

/// Extract every `<loc>` entry from a sitemap document.
///
/// Matches on local element names, so namespaced feeds parse the same as
/// plain ones. Entries are whitespace-trimmed, empties are dropped, and
/// duplicates collapse into the set.
pub fn parse(xml: &str) -> HashSet<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut urls = HashSet::new();
    let mut in_loc = false;
    let mut current = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"loc" {
                    in_loc = true;
                    current.clear();
                }
            }
            Ok(Event::Text(e)) => {
                if in_loc {
                    if let Ok(text) = e.unescape() {
                        current.push_str(&text);
                    }
                }
            }
            Ok(Event::End(e)) => {
                if in_loc && e.local_name().as_ref() == b"loc" {
                    let url = current.trim();
                    if !url.is_empty() {
                        urls.insert(url.to_string());
                    }
                    in_loc = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
    }

    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_every_loc() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
                <url><loc>https://docs.example.com/intro</loc></url>
                <url><loc>https://docs.example.com/setup</loc></url>
            </urlset>"#;

        let urls = parse(xml);
        assert_eq!(urls.len(), 2);
        assert!(urls.contains("https://docs.example.com/intro"));
        assert!(urls.contains("https://docs.example.com/setup"));
    }

    #[test]
    fn test_duplicate_locs_collapse() {
        let xml = r#"<urlset>
                <url><loc>https://docs.example.com/intro</loc></url>
                <url><loc>https://docs.example.com/intro</loc></url>
            </urlset>"#;

        let urls = parse(xml);
        assert_eq!(urls.len(), 1);
        assert!(urls.contains("https://docs.example.com/intro"));
    }

    #[test]
    fn test_whitespace_is_trimmed_and_empties_dropped() {
        let xml = r#"<urlset>
                <url><loc>
                    https://docs.example.com/intro
                </loc></url>
                <url><loc>   </loc></url>
            </urlset>"#;

        let urls = parse(xml);
        assert_eq!(urls.len(), 1);
        assert!(urls.contains("https://docs.example.com/intro"));
    }

    #[test]
    fn test_escaped_entities_are_unescaped() {
        let xml = "<urlset><url><loc>https://docs.example.com/search?a=1&amp;b=2</loc></url></urlset>";

        let urls = parse(xml);
        assert!(urls.contains("https://docs.example.com/search?a=1&b=2"));
    }

    #[test]
    fn test_non_loc_elements_are_ignored() {
        let xml = r#"<urlset>
                <url>
                    <loc>https://docs.example.com/intro</loc>
                    <lastmod>2024-03-01</lastmod>
                    <priority>0.8</priority>
                </url>
            </urlset>"#;

        let urls = parse(xml);
        assert_eq!(urls.len(), 1);
    }

    #[test]
    fn test_empty_document_yields_empty_set() {
        assert!(parse("").is_empty());
        assert!(parse("<urlset></urlset>").is_empty());
    }
}
