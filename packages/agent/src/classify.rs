//! Editability classification
//!
//! Preformatted content is never editable in any way: rewriting it through
//! `contenteditable` or inline styles can silently reflow code blocks. Of
//! the rest, only a fixed allow-list of inline text tags gets text editing;
//! everything else, including unknown and custom elements, is style-only.

use crate::dom::Dom;

/// Tags whose content is code-like or whitespace-sensitive by nature
pub const PREFORMATTED_TAGS: &[&str] = &["pre", "code", "textarea", "kbd", "samp"];

/// `white-space` values that preserve source whitespace
pub const PRESERVED_WHITE_SPACE: &[&str] = &["pre", "pre-wrap", "pre-line", "break-spaces"];

pub const TEXT_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "span", "a", "button", "label", "li", "td", "th",
    "dt", "dd", "strong", "em", "b", "i", "u", "s", "small", "mark", "blockquote", "q", "cite",
    "figcaption", "caption", "legend", "summary", "abbr", "sub", "sup", "del", "ins", "time",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Editability {
    pub is_text_editable: bool,
    pub can_edit_styles: bool,
}

impl Editability {
    pub const NONE: Editability = Editability {
        is_text_editable: false,
        can_edit_styles: false,
    };

    pub fn is_editable(self) -> bool {
        self.is_text_editable || self.can_edit_styles
    }
}

pub fn is_preformatted_tag(tag_name: &str) -> bool {
    let tag = tag_name.to_ascii_lowercase();
    PREFORMATTED_TAGS.contains(&tag.as_str())
}

pub fn preserves_white_space(white_space: &str) -> bool {
    PRESERVED_WHITE_SPACE.contains(&white_space.trim())
}

pub fn classify(tag_name: &str, white_space: &str, is_preformatted_tag: bool) -> Editability {
    if is_preformatted_tag || preserves_white_space(white_space) {
        return Editability::NONE;
    }
    let tag = tag_name.to_ascii_lowercase();
    Editability {
        is_text_editable: TEXT_TAGS.contains(&tag.as_str()),
        can_edit_styles: true,
    }
}

/// Whether the element's own content, not just an ancestor's, is preformatted.
pub fn is_preformatted<D: Dom>(dom: &D, element: &D::Node) -> bool {
    if is_preformatted_tag(&dom.tag_name(element)) {
        return true;
    }
    dom.computed_style(element, "whiteSpace")
        .is_some_and(|value| preserves_white_space(&value))
}

pub fn element_editability<D: Dom>(dom: &D, element: &D::Node) -> Editability {
    let tag = dom.tag_name(element);
    let white_space = dom
        .computed_style(element, "whiteSpace")
        .unwrap_or_else(|| "normal".to_string());
    classify(&tag, &white_space, is_preformatted_tag(&tag))
}

/// At least one direct child text node has non-whitespace content.
pub fn has_direct_text<D: Dom>(dom: &D, element: &D::Node) -> bool {
    dom.child_texts(element)
        .iter()
        .any(|text| !text.trim().is_empty())
}

pub fn extract_text<D: Dom>(dom: &D, element: &D::Node, is_preformatted: bool) -> String {
    if is_preformatted {
        dom.text_content(element)
    } else {
        dom.rendered_text(element).trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDom;

    #[test]
    fn test_text_tags_are_text_editable() {
        for tag in TEXT_TAGS {
            let editability = classify(tag, "normal", false);
            assert!(editability.is_text_editable, "{} should be text editable", tag);
            assert!(editability.can_edit_styles);
        }
    }

    #[test]
    fn test_containers_and_custom_elements_are_style_only() {
        for tag in ["div", "section", "my-widget", "img", "ul"] {
            assert_eq!(
                classify(tag, "normal", false),
                Editability {
                    is_text_editable: false,
                    can_edit_styles: true,
                }
            );
        }
    }

    #[test]
    fn test_preformatted_is_never_editable() {
        assert_eq!(classify("pre", "pre", true), Editability::NONE);
        assert_eq!(classify("code", "normal", true), Editability::NONE);
        for white_space in PRESERVED_WHITE_SPACE {
            assert_eq!(classify("p", white_space, false), Editability::NONE);
            assert_eq!(classify("div", white_space, false), Editability::NONE);
        }
        assert!(!Editability::NONE.is_editable());
    }

    #[test]
    fn test_tag_case_is_ignored() {
        assert!(classify("SPAN", "normal", false).is_text_editable);
        assert!(is_preformatted_tag("PRE"));
    }

    #[test]
    fn test_preformatted_element_keeps_raw_text() {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let pre = dom.append_element(body, "pre");
        dom.append_text(pre, "raw   text");

        assert!(is_preformatted(&dom, &pre));
        assert_eq!(extract_text(&dom, &pre, true), "raw   text");
        assert_eq!(element_editability(&dom, &pre), Editability::NONE);
    }

    #[test]
    fn test_white_space_inherited_from_ancestor() {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let pre = dom.append_element(body, "pre");
        let span = dom.append_element(pre, "span");
        dom.append_text(span, "  x  ");

        assert_eq!(element_editability(&dom, &span), Editability::NONE);
        assert_eq!(extract_text(&dom, &span, is_preformatted(&dom, &span)), "  x  ");
    }

    #[test]
    fn test_extract_text_trims_rendered_text() {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let p = dom.append_element(body, "p");
        dom.append_text(p, "\n   Hello\n   world  ");

        assert_eq!(extract_text(&dom, &p, false), "Hello world");
    }

    #[test]
    fn test_has_direct_text() {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let leaf = dom.append_element(body, "span");
        dom.append_text(leaf, "Hi");
        let container = dom.append_element(body, "div");
        dom.append_text(container, "\n  ");
        let inner = dom.append_element(container, "p");
        dom.append_text(inner, "nested");

        assert!(has_direct_text(&dom, &leaf));
        assert!(!has_direct_text(&dom, &container));
    }
}
