//! Best effort text extraction from loosely structured pages.

use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Node, Selector};

lazy_static! {
    static ref HEADINGS: Selector = Selector::parse("h2, h3, h4").unwrap();
}

const HEADING_NAMES: [&str; 3] = ["h2", "h3", "h4"];
const NON_TEXT_NAMES: [&str; 2] = ["script", "style"];

fn is_heading(element: &ElementRef) -> bool {
    HEADING_NAMES.contains(&element.value().name())
}

fn is_non_text(element: &ElementRef) -> bool {
    NON_TEXT_NAMES.contains(&element.value().name())
}

fn collect_text<'a>(element: ElementRef<'a>, parts: &mut Vec<&'a str>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    parts.push(text);
                }
            }
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    if !is_non_text(&child) {
                        collect_text(child, parts);
                    }
                }
            }
            _ => (),
        }
    }
}

/// Text of `element` with every text node trimmed, blank ones dropped and the rest joined
/// by `separator`. Script and style contents are not text.
pub fn element_text(element: ElementRef, separator: &str) -> String {
    let mut parts = vec![];
    collect_text(element, &mut parts);
    parts.join(separator)
}

pub fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Finds the first `h2`/`h3`/`h4` heading containing one of `keywords` (case insensitive)
/// and returns the text of the elements following it, up to the next heading.
///
/// Returns `None` when no heading matches or the section holds no text.
pub fn extract_section_text(document: &Html, keywords: &[&str]) -> Option<String> {
    let keywords = keywords
        .iter()
        .map(|k| k.to_lowercase())
        .collect::<Vec<_>>();

    let heading = document.select(&HEADINGS).find(|heading| {
        let title = element_text(*heading, "").to_lowercase();
        keywords.iter().any(|k| title.contains(k.as_str()))
    })?;

    let texts = heading
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .take_while(|sibling| !is_heading(sibling))
        .filter(|sibling| !is_non_text(sibling))
        .map(|sibling| element_text(sibling, " "))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>();

    non_empty(texts.join(" "))
}
