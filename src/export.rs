//! The shareable image of a post: colour schemes and a text layout that the
//! browser paints onto a canvas.

use crate::model::Post;

pub const BRAND: &str = "Unblot";
pub const TAGLINE: &str = "For the words that won't disappear.";
pub const FOOTER: &str = "unblot.vercel.app";

/// Logical width of the image; the canvas is drawn at [`SCALE`] times this.
pub const WIDTH: f64 = 600.0;
pub const SCALE: f64 = 2.0;

const PADDING_X: f64 = 40.0;
const PADDING_Y: f64 = 32.0;
const CARD_PADDING_X: f64 = 32.0;
const CARD_PADDING_Y: f64 = 24.0;

pub const BRAND_FONT: &str = "bold 32px 'EB Garamond', serif";
pub const TAGLINE_FONT: &str = "italic 17.6px 'EB Garamond', serif";
pub const TITLE_FONT: &str = "bold 24px 'EB Garamond', serif";
pub const CONTENT_FONT: &str = "18.4px 'Quicksand', Arial, sans-serif";
pub const FOOTER_FONT: &str = "14.4px 'Quicksand', Arial, sans-serif";

const BRAND_LINE: f64 = 40.0;
const TAGLINE_LINE: f64 = 26.0;
const TITLE_LINE: f64 = 32.0;
const CONTENT_LINE: f64 = 31.28;
const FOOTER_LINE: f64 = 20.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SchemeKey {
    Lavender,
    Blush,
    Mint,
    Sky,
    Peach,
    Classic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorScheme {
    pub name: &'static str,
    /// Stops at 0%, 50% and 100% of a 135 degree gradient.
    pub gradient: [&'static str; 3],
    pub text_color: &'static str,
    pub brand_color: &'static str,
    pub content_bg: &'static str,
    pub content_text_color: &'static str,
}

impl SchemeKey {
    pub const ALL: [SchemeKey; 6] = [
        SchemeKey::Lavender,
        SchemeKey::Blush,
        SchemeKey::Mint,
        SchemeKey::Sky,
        SchemeKey::Peach,
        SchemeKey::Classic,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            SchemeKey::Lavender => "lavender",
            SchemeKey::Blush => "blush",
            SchemeKey::Mint => "mint",
            SchemeKey::Sky => "sky",
            SchemeKey::Peach => "peach",
            SchemeKey::Classic => "classic",
        }
    }

    /// Unknown keys fall back to the classic scheme.
    pub fn from_key(key: &str) -> SchemeKey {
        SchemeKey::ALL
            .into_iter()
            .find(|scheme| scheme.key() == key)
            .unwrap_or(SchemeKey::Classic)
    }

    pub fn colors(&self) -> ColorScheme {
        match self {
            SchemeKey::Lavender => ColorScheme {
                name: "Soft Lavender",
                gradient: ["#e8e4ff", "#f3f0ff", "#ffffff"],
                text_color: "#4a5568",
                brand_color: "#7c3aed",
                content_bg: "rgba(255, 255, 255, 0.85)",
                content_text_color: "#2d3748",
            },
            SchemeKey::Blush => ColorScheme {
                name: "Rose Blush",
                gradient: ["#fed7d7", "#fed7e2", "#fef5e7"],
                text_color: "#744210",
                brand_color: "#d53f8c",
                content_bg: "rgba(255, 255, 255, 0.9)",
                content_text_color: "#2d3748",
            },
            SchemeKey::Mint => ColorScheme {
                name: "Fresh Mint",
                gradient: ["#d4edda", "#e6fffa", "#f0fff4"],
                text_color: "#276749",
                brand_color: "#38a169",
                content_bg: "rgba(255, 255, 255, 0.85)",
                content_text_color: "#2d3748",
            },
            SchemeKey::Sky => ColorScheme {
                name: "Gentle Sky",
                gradient: ["#e0f2fe", "#e6f3ff", "#f0f9ff"],
                text_color: "#2b6cb0",
                brand_color: "#3182ce",
                content_bg: "rgba(255, 255, 255, 0.9)",
                content_text_color: "#2d3748",
            },
            SchemeKey::Peach => ColorScheme {
                name: "Soft Peach",
                gradient: ["#fed7cc", "#feebc8", "#fff5f5"],
                text_color: "#c05621",
                brand_color: "#dd6b20",
                content_bg: "rgba(255, 255, 255, 0.9)",
                content_text_color: "#2d3748",
            },
            SchemeKey::Classic => ColorScheme {
                name: "Classic Light",
                gradient: ["#e0e7ff", "#f7fafc", "#ffffff"],
                text_color: "#4a5568",
                brand_color: "#4f46e5",
                content_bg: "rgba(255, 255, 255, 0.85)",
                content_text_color: "#2d3748",
            },
        }
    }
}

/// Everything needed to paint one post, independent of the page it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportSnapshot {
    pub file_name: String,
    pub scheme: SchemeKey,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

impl ExportSnapshot {
    pub fn of_post(post: &Post, scheme: SchemeKey) -> Self {
        ExportSnapshot {
            file_name: format!("poem-{}.png", post.id),
            scheme,
            title: post.title.clone(),
            content: post.content.clone(),
            tags: post.tags.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// One line of text. `y` is the baseline.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub font: &'static str,
    pub color: &'static str,
    pub align: Align,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExportLayout {
    pub width: f64,
    pub height: f64,
    pub colors: ColorScheme,
    /// The rounded content card behind title and body.
    pub card: Rect,
    pub runs: Vec<TextRun>,
}

impl ExportLayout {
    /// Lays the snapshot out at logical size. `measure(font, text)` returns
    /// the rendered width of `text`.
    pub fn compute<M>(snapshot: &ExportSnapshot, measure: M) -> Self
    where
        M: Fn(&str, &str) -> f64,
    {
        let colors = snapshot.scheme.colors();
        let mut runs = Vec::new();
        let mut y = PADDING_Y;

        let line = |runs: &mut Vec<TextRun>,
                    y: &mut f64,
                    text: String,
                    x: f64,
                    font: &'static str,
                    color: &'static str,
                    height: f64| {
            *y += height;
            runs.push(TextRun {
                text,
                x,
                y: *y - height * 0.25,
                font,
                color,
                align: Align::Left,
            });
        };

        line(&mut runs, &mut y, BRAND.to_owned(), PADDING_X, BRAND_FONT, colors.brand_color, BRAND_LINE);
        line(&mut runs, &mut y, TAGLINE.to_owned(), PADDING_X, TAGLINE_FONT, colors.brand_color, TAGLINE_LINE);
        y += 24.0;

        let card_top = y;
        let inner_x = PADDING_X + CARD_PADDING_X;
        let inner_width = WIDTH - 2.0 * (PADDING_X + CARD_PADDING_X);
        y += CARD_PADDING_Y;

        for text in wrap_lines(&snapshot.title, inner_width, |t| measure(TITLE_FONT, t)) {
            line(&mut runs, &mut y, text, inner_x, TITLE_FONT, colors.brand_color, TITLE_LINE);
        }
        y += 8.0;
        for text in wrap_lines(&snapshot.content, inner_width, |t| measure(CONTENT_FONT, t)) {
            line(&mut runs, &mut y, text, inner_x, CONTENT_FONT, colors.content_text_color, CONTENT_LINE);
        }
        y += CARD_PADDING_Y;

        let card = Rect {
            x: PADDING_X,
            y: card_top,
            width: WIDTH - 2.0 * PADDING_X,
            height: y - card_top,
        };

        y += 16.0 + FOOTER_LINE;
        runs.push(TextRun {
            text: FOOTER.to_owned(),
            x: WIDTH - PADDING_X,
            y: y - FOOTER_LINE * 0.25,
            font: FOOTER_FONT,
            color: colors.text_color,
            align: Align::Right,
        });

        ExportLayout {
            width: WIDTH,
            height: y + PADDING_Y,
            colors,
            card,
            runs,
        }
    }
}

/// Word-wraps `text` to `max_width`, keeping its own line breaks and blank
/// lines. Words wider than a line are broken between characters.
pub fn wrap_lines<M>(text: &str, max_width: f64, measure: M) -> Vec<String>
where
    M: Fn(&str) -> f64,
{
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_owned()
            } else {
                format!("{current} {word}")
            };
            if measure(&candidate) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if measure(word) <= max_width {
                current = word.to_owned();
                continue;
            }

            for c in word.chars() {
                current.push(c);
                if measure(&current) > max_width && current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(c);
                }
            }
        }
        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monospace(text: &str) -> f64 {
        text.chars().count() as f64 * 10.0
    }

    #[test]
    fn wraps_on_words_and_keeps_stanzas() {
        let lines = wrap_lines("the quick brown fox\n\njumps", 110.0, monospace);
        assert_eq!(lines, vec!["the quick", "brown fox", "", "jumps"]);
    }

    #[test]
    fn breaks_words_longer_than_a_line() {
        let lines = wrap_lines("abcdefghij", 40.0, monospace);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn unknown_scheme_keys_fall_back_to_classic() {
        assert_eq!(SchemeKey::from_key("mint"), SchemeKey::Mint);
        assert_eq!(SchemeKey::from_key("neon"), SchemeKey::Classic);
        assert_eq!(SchemeKey::Classic.colors().brand_color, "#4f46e5");
    }

    #[test]
    fn layout_grows_with_content_and_keeps_inside_the_card() {
        let short = ExportSnapshot {
            file_name: "poem-1.png".into(),
            scheme: SchemeKey::Sky,
            title: "Tide".into(),
            content: "salt".into(),
            tags: Vec::new(),
        };
        let long = ExportSnapshot {
            content: "word ".repeat(200),
            ..short.clone()
        };

        let small = ExportLayout::compute(&short, |_, text| monospace(text));
        let large = ExportLayout::compute(&long, |_, text| monospace(text));

        assert!(large.height > small.height);
        assert_eq!(small.runs[0].text, BRAND);
        assert_eq!(small.runs.last().unwrap().text, FOOTER);
        assert_eq!(small.colors.brand_color, "#3182ce");

        let card = large.card;
        for run in large.runs.iter().filter(|run| run.font == CONTENT_FONT) {
            assert!(run.y > card.y && run.y < card.y + card.height);
            assert!(monospace(&run.text) <= card.width - 2.0 * CARD_PADDING_X);
        }
    }
}
