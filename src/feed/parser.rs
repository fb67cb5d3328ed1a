use anyhow::Result;
use feed_rs::parser;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A candidate entry parsed from the source feed.
///
/// Immutable once fetched; the serialized JSON form is both the cache payload
/// and the published message body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub guid: String,
    pub title: String,
    pub link: Option<String>,
    pub published: Option<i64>,
    pub content: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// Parse feed bytes (RSS or Atom) into items, in document order.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<FeedItem>> {
    let feed = parser::parse(bytes)?;

    let items: Vec<FeedItem> = feed
        .entries
        .into_iter()
        .map(|entry| {
            let link = entry.links.first().map(|l| l.href.clone());
            let published = entry.published.or(entry.updated).map(|dt| dt.timestamp());
            let content = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body));
            let title = entry
                .title
                .map(|t| t.content)
                .unwrap_or_else(|| "Untitled".to_string());
            let categories = entry.categories.into_iter().map(|c| c.term).collect();

            let existing_id = if entry.id.is_empty() {
                None
            } else {
                Some(entry.id.as_str())
            };
            let guid = generate_guid(existing_id, link.as_deref(), &title, published);

            FeedItem {
                guid,
                title,
                link,
                published,
                content,
                categories,
            }
        })
        .collect();

    Ok(items)
}

/// Use the entry's own id when present; otherwise hash link|title|published
/// so the identifier (and hence the fingerprint) is stable across polls.
fn generate_guid(
    existing: Option<&str>,
    link: Option<&str>,
    title: &str,
    published: Option<i64>,
) -> String {
    if let Some(guid) = existing {
        let trimmed = guid.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let input = format!(
        "{}|{}|{}",
        link.unwrap_or(""),
        title,
        published.map(|p| p.to_string()).unwrap_or_default()
    );
    let hash = Sha256::digest(input.as_bytes());
    format!("{:x}", hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS_TWO_ITEMS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>Example</title>
    <item>
        <guid>tag:example.com,2024:1</guid>
        <title>First post</title>
        <link>https://example.com/1</link>
        <description>Body one</description>
        <category>news</category>
    </item>
    <item>
        <guid>tag:example.com,2024:2</guid>
        <title>Second post</title>
        <link>https://example.com/2</link>
    </item>
</channel></rss>"#;

    #[test]
    fn test_parse_rss_items_in_document_order() {
        let items = parse_feed(RSS_TWO_ITEMS.as_bytes()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].guid, "tag:example.com,2024:1");
        assert_eq!(items[0].title, "First post");
        assert_eq!(items[0].link.as_deref(), Some("https://example.com/1"));
        assert_eq!(items[0].content.as_deref(), Some("Body one"));
        assert_eq!(items[0].categories, vec!["news".to_string()]);
        assert_eq!(items[1].guid, "tag:example.com,2024:2");
    }

    #[test]
    fn test_parse_atom_entry() {
        let atom = r#"<?xml version="1.0"?>
<feed xmlns="http://www.w3.org/2005/Atom">
    <title>Example</title>
    <entry>
        <id>urn:uuid:abc</id>
        <title>Atom post</title>
        <link href="https://example.com/atom/1"/>
        <updated>2024-01-01T00:00:00Z</updated>
        <summary>Atom body</summary>
    </entry>
</feed>"#;
        let items = parse_feed(atom.as_bytes()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].guid, "urn:uuid:abc");
        assert_eq!(items[0].published, Some(1704067200));
    }

    #[test]
    fn test_parse_empty_feed() {
        let empty = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Empty</title></channel></rss>"#;
        let items = parse_feed(empty.as_bytes()).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_parse_invalid_xml_is_error() {
        assert!(parse_feed(b"<not a feed").is_err());
    }

    #[test]
    fn test_missing_guid_gets_stable_fallback() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <item><title>No guid here</title><link>https://example.com/x</link></item>
</channel></rss>"#;
        let a = parse_feed(rss.as_bytes()).unwrap();
        let b = parse_feed(rss.as_bytes()).unwrap();
        assert!(!a[0].guid.is_empty());
        assert_eq!(a[0].guid, b[0].guid);
    }

    #[test]
    fn test_whitespace_guid_treated_as_missing() {
        let guid = generate_guid(Some("   "), Some("https://example.com/y"), "Title", None);
        assert_ne!(guid.trim(), "");
        assert_ne!(guid, "   ");
    }

    #[test]
    fn test_item_json_round_trip() {
        let item = FeedItem {
            guid: "g".into(),
            title: "t".into(),
            link: Some("https://example.com".into()),
            published: Some(1700000000),
            content: None,
            categories: vec!["a".into()],
        };
        let json = serde_json::to_string(&item).unwrap();
        let back: FeedItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }
}
