//! OpenGraph social cards, rendered as SVG from `templates/og/card.svg`.

use askama::Template;

pub const CARD_WIDTH: u32 = 1200;
pub const CARD_HEIGHT: u32 = 630;

/// Characters per title line.
pub const TITLE_LINE_CHARS: usize = 28;
/// Title lines before the rest is ellipsised.
pub const TITLE_MAX_LINES: usize = 3;

const TITLE_TOP: u32 = 240;
const TITLE_LINE_HEIGHT: u32 = 84;

/// What a card is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardKind {
    Product,
    Collection,
    Article,
}

impl CardKind {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "product" => Some(Self::Product),
            "collection" => Some(Self::Collection),
            "article" => Some(Self::Article),
            _ => None,
        }
    }

    const fn eyebrow(self) -> &'static str {
        match self {
            Self::Product => "SHOP",
            Self::Collection => "COLLECTION",
            Self::Article => "FIELD NOTES",
        }
    }
}

/// Content of a social card.
#[derive(Debug, Clone)]
pub struct OgCard {
    pub kind: CardKind,
    pub title: String,
    pub subtitle: String,
    pub site_name: String,
}

/// Greedy word wrap at [`TITLE_LINE_CHARS`], capped at [`TITLE_MAX_LINES`].
///
/// Words longer than a line are split. Overflow is marked with `…` on the
/// last kept line.
#[must_use]
pub fn wrap_title(title: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in title.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > TITLE_LINE_CHARS {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(TITLE_LINE_CHARS);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let len = current.chars().count();
        if len > 0 && len + 1 + word.len() > TITLE_LINE_CHARS {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    if lines.len() > TITLE_MAX_LINES {
        lines.truncate(TITLE_MAX_LINES);
        if let Some(last) = lines.last_mut() {
            let mut chars: Vec<char> = last.chars().collect();
            chars.truncate(TITLE_LINE_CHARS - 1);
            while chars.last().is_some_and(|c| c.is_whitespace()) {
                chars.pop();
            }
            *last = chars.into_iter().chain(['…']).collect();
        }
    }

    lines
}

struct TitleLine {
    y: u32,
    text: String,
}

#[derive(Template)]
#[template(path = "og/card.svg")]
struct CardTemplate<'a> {
    width: u32,
    height: u32,
    eyebrow: &'static str,
    lines: Vec<TitleLine>,
    subtitle: &'a str,
    subtitle_y: u32,
    site_name: &'a str,
}

impl OgCard {
    /// Render the card as a standalone SVG document.
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to render.
    pub fn render_svg(&self) -> askama::Result<String> {
        let mut y = TITLE_TOP;
        let lines = wrap_title(&self.title)
            .into_iter()
            .map(|text| {
                let line = TitleLine { y, text };
                y += TITLE_LINE_HEIGHT;
                line
            })
            .collect();

        CardTemplate {
            width: CARD_WIDTH,
            height: CARD_HEIGHT,
            eyebrow: self.kind.eyebrow(),
            lines,
            subtitle: &self.subtitle,
            subtitle_y: y + 20,
            site_name: &self.site_name,
        }
        .render()
    }
}
