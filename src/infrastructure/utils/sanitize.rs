use std::collections::HashSet;

use ammonia::Builder;

/// Entities the HTML serializer writes for text content. `&amp;` must stay
/// last so an escaped entity is decoded exactly once.
const SERIALIZED_ENTITIES: [(&str, &str); 4] = [
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&nbsp;", "\u{a0}"),
    ("&amp;", "&"),
];

/// Strips every HTML tag from a submitted image URL and trims it.
///
/// Text outside tags comes back byte for byte: `&` is escaped before parsing
/// so the parser decodes nothing, and the serializer's entities are decoded
/// afterwards.
pub fn sanitize_image_url(raw: &str) -> String {
    let cleaned = Builder::empty()
        .clean_content_tags(HashSet::from(["script", "style"]))
        .clean(&raw.trim().replace('&', "&amp;"))
        .to_string();

    decode_serialized_entities(&cleaned).trim().to_string()
}

fn decode_serialized_entities(html: &str) -> String {
    SERIALIZED_ENTITIES
        .iter()
        .fold(html.to_string(), |text, (entity, ch)| text.replace(entity, ch))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_urls_pass_through() {
        assert_eq!(
            sanitize_image_url("  http://example.com/a.png "),
            "http://example.com/a.png"
        );
    }

    #[test]
    fn query_strings_keep_their_ampersands() {
        assert_eq!(
            sanitize_image_url("https://example.com/a.png?w=10&h=20"),
            "https://example.com/a.png?w=10&h=20"
        );
    }

    #[test]
    fn entity_like_text_is_not_decoded() {
        assert_eq!(
            sanitize_image_url("http://example.com/a.png?a=1&amp;amp;b"),
            "http://example.com/a.png?a=1&amp;amp;b"
        );
        assert_eq!(
            sanitize_image_url("http://example.com/a.png?q=&lt;&nbsp;"),
            "http://example.com/a.png?q=&lt;&nbsp;"
        );
    }

    #[test]
    fn non_breaking_space_is_kept_as_a_character() {
        assert_eq!(
            sanitize_image_url("http://example.com/\u{a0}x.png"),
            "http://example.com/\u{a0}x.png"
        );
    }

    #[test]
    fn markup_is_removed() {
        assert_eq!(
            sanitize_image_url("<b>http://example.com/a.png</b>"),
            "http://example.com/a.png"
        );
        assert_eq!(
            sanitize_image_url("http://example.com/a.png<script>alert(1)</script>"),
            "http://example.com/a.png"
        );
    }

    #[test]
    fn stray_angle_brackets_survive_as_text() {
        assert_eq!(
            sanitize_image_url("http://example.com/a.png?x=1>0"),
            "http://example.com/a.png?x=1>0"
        );
    }
}
