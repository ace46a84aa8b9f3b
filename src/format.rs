use chrono::{DateTime, Local, TimeZone, Utc};

pub fn parse_tags(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_owned)
        .collect()
}

pub fn tags_to_string(tags: &[String]) -> String {
    tags.join(", ")
}

/// Escapes text for interpolation into markup, both as element content and
/// inside quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// The first `max_chars` characters of `text` and whether anything was cut.
pub fn excerpt(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => (&text[..end], true),
        None => (text, false),
    }
}

pub fn format_date(date: &DateTime<Utc>) -> String {
    format_date_in(date, &Local)
}

pub fn format_date_in<Tz: TimeZone>(date: &DateTime<Utc>, zone: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.with_timezone(zone)
        .format("%b %-d, %Y, %-I:%M %p")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn tags_are_trimmed_and_blank_entries_dropped() {
        assert_eq!(parse_tags(" love, loss ,, night "), vec!["love", "loss", "night"]);
        assert!(parse_tags("").is_empty());
        assert_eq!(tags_to_string(&parse_tags("a,b")), "a, b");
    }

    #[test]
    fn escapes_markup_and_quotes() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
        assert_eq!(escape_html(""), "");
    }

    #[test]
    fn excerpt_respects_character_boundaries() {
        assert_eq!(excerpt("héllo wörld", 5), ("héllo", true));
        assert_eq!(excerpt("short", 120), ("short", false));
    }

    #[test]
    fn dates_render_in_the_given_zone() {
        let date = "2024-03-09T15:04:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(format_date_in(&date, &Utc), "Mar 9, 2024, 3:04 PM");

        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        assert_eq!(format_date_in(&date, &tokyo), "Mar 10, 2024, 12:04 AM");
    }
}
