use crate::source::{Article, MarkupKind};

/// Marker the publishing target recognizes as the excerpt/body split.
/// Inserted as raw text before any markup conversion runs.
pub const EXCERPT_SEPARATOR: &str = "<!-- more -->";

/// Seam for the external lightweight-markup-to-HTML converter. The
/// converter itself is not part of this crate; absence is a supported
/// state, not an error.
pub trait MarkupConverter {
    fn to_html(&self, source: &str) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Html,
    Markdown,
}

impl BodyFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Markdown => "markdown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedBody {
    pub text: String,
    pub format: BodyFormat,
}

pub fn combined_body(excerpt: &str, body: &str) -> String {
    if excerpt.is_empty() {
        body.to_string()
    } else {
        format!("{excerpt}{EXCERPT_SEPARATOR}{body}")
    }
}

/// Decide the submitted body format and text for one article.
///
/// Textile converts to HTML when a converter is available and falls
/// back to the raw combined body when not. Markdown and its
/// smart-punctuation variant pass through untouched since the target
/// accepts markdown natively. Everything else is submitted as HTML
/// as-is.
pub fn transform(article: &Article, converter: Option<&dyn MarkupConverter>) -> TransformedBody {
    let combined = combined_body(&article.excerpt, &article.body);
    match article.filter {
        MarkupKind::Textile => match converter {
            Some(converter) => TransformedBody {
                text: converter.to_html(&combined),
                format: BodyFormat::Html,
            },
            None => TransformedBody {
                text: combined,
                format: BodyFormat::Html,
            },
        },
        MarkupKind::Markdown | MarkupKind::SmartyPants => TransformedBody {
            text: combined,
            format: BodyFormat::Markdown,
        },
        MarkupKind::Other => TransformedBody {
            text: combined,
            format: BodyFormat::Html,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TagWrapConverter;

    impl MarkupConverter for TagWrapConverter {
        fn to_html(&self, source: &str) -> String {
            format!("<p>{source}</p>")
        }
    }

    fn article(excerpt: &str, body: &str, filter: MarkupKind) -> Article {
        Article {
            id: 1,
            title: "Title".to_string(),
            body: body.to_string(),
            excerpt: excerpt.to_string(),
            published_at: None,
            permalink: "title".to_string(),
            filter,
        }
    }

    #[test]
    fn combined_body_joins_excerpt_and_body_with_separator() {
        assert_eq!(combined_body("E", "B"), "E<!-- more -->B");
    }

    #[test]
    fn combined_body_without_excerpt_is_body_alone() {
        assert_eq!(combined_body("", "B"), "B");
    }

    #[test]
    fn textile_with_converter_produces_converted_html() {
        let subject = article("", "h1. Hello", MarkupKind::Textile);
        let body = transform(&subject, Some(&TagWrapConverter));
        assert_eq!(body.format, BodyFormat::Html);
        assert_eq!(body.text, "<p>h1. Hello</p>");
    }

    #[test]
    fn textile_without_converter_falls_back_to_raw_text() {
        let subject = article("E", "h1. Hello", MarkupKind::Textile);
        let body = transform(&subject, None);
        assert_eq!(body.format, BodyFormat::Html);
        assert_eq!(body.text, "E<!-- more -->h1. Hello");
    }

    #[test]
    fn markdown_passes_through_as_markdown() {
        let subject = article("", "# Hello", MarkupKind::Markdown);
        let body = transform(&subject, Some(&TagWrapConverter));
        assert_eq!(body.format, BodyFormat::Markdown);
        assert_eq!(body.text, "# Hello");
    }

    #[test]
    fn smartypants_passes_through_as_markdown() {
        let subject = article("", "\"quoted\"", MarkupKind::SmartyPants);
        let body = transform(&subject, None);
        assert_eq!(body.format, BodyFormat::Markdown);
        assert_eq!(body.text, "\"quoted\"");
    }

    #[test]
    fn other_markup_is_submitted_as_html_unchanged() {
        let subject = article("E", "<b>raw</b>", MarkupKind::Other);
        let body = transform(&subject, Some(&TagWrapConverter));
        assert_eq!(body.format, BodyFormat::Html);
        assert_eq!(body.text, "E<!-- more --><b>raw</b>");
    }

    #[test]
    fn separator_is_inserted_before_conversion() {
        let subject = article("E", "B", MarkupKind::Textile);
        let body = transform(&subject, Some(&TagWrapConverter));
        assert_eq!(body.text, "<p>E<!-- more -->B</p>");
    }
}
