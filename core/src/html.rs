//! Best-effort markup stripping. html5ever recovers from any malformed input,
//! so extraction itself never fails.

use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Node, Selector};

lazy_static! {
    static ref TITLE: Selector = Selector::parse("title").expect("valid selector");
    static ref BODY: Selector = Selector::parse("body").expect("valid selector");
}

const SKIPPED: &[&str] = &["script", "style", "noscript", "template"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    pub title: String,
    pub body: String,
}

pub fn extract(raw: &str) -> Extracted {
    let doc = Html::parse_document(raw);
    let title = doc
        .select(&TITLE)
        .next()
        .map(|t| collapse(t.text()))
        .unwrap_or_default();

    let mut words = Vec::new();
    if let Some(body) = doc.select(&BODY).next() {
        collect_words(body, &mut words);
    }
    Extracted { title, body: words.join(" ") }
}

fn collect_words<'a>(element: ElementRef<'a>, out: &mut Vec<&'a str>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.extend(text.split_whitespace()),
            Node::Element(el) if SKIPPED.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    collect_words(el, out);
                }
            }
            _ => {}
        }
    }
}

fn collapse<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts.flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_title_and_body_text() {
        let page = "<html><head><title> Football   Club </title><style>p{}</style></head>\
                    <body><h1>Manchester</h1><p>United <b>play</b>\n football</p>\
                    <script>var x = 1;</script></body></html>";
        let out = extract(page);
        assert_eq!(out.title, "Football Club");
        assert_eq!(out.body, "Manchester United play football");
    }

    #[test]
    fn tolerates_broken_markup() {
        let out = extract("<html><body><p>unclosed <div>tags <<< here");
        assert!(out.title.is_empty());
        assert!(out.body.contains("unclosed"));
        assert!(out.body.contains("tags"));
    }

    #[test]
    fn plain_text_lands_in_body() {
        let out = extract("just some words");
        assert_eq!(out.body, "just some words");
    }
}
