//! Element descriptors sent to the host

use crate::classify::extract_text;
use crate::dom::Dom;
use crate::metadata::MetadataCache;
use liveedit_protocol::ElementDescriptor;
use std::collections::BTreeMap;

/// Computed styles reported with a detailed descriptor
pub const STYLE_PROPERTIES: &[&str] = &[
    "fontSize",
    "fontWeight",
    "fontStyle",
    "textDecoration",
    "lineHeight",
    "textAlign",
    "color",
    "backgroundColor",
    "margin",
    "padding",
    "borderRadius",
    "boxShadow",
    "opacity",
];

/// Build a fresh descriptor. `include_detail` adds computed styles and geometry.
pub fn build_descriptor<D: Dom>(
    dom: &D,
    cache: &mut MetadataCache,
    element: &D::Node,
    include_detail: bool,
) -> ElementDescriptor {
    let meta = cache.get(dom, element);

    let (styles, geometry) = if include_detail {
        (
            Some(computed_styles(dom, element)),
            Some(dom.bounding_rect(element)),
        )
    } else {
        (None, None)
    };

    ElementDescriptor {
        identity: meta.identity,
        display_name: meta.display_name,
        tag_name: meta.tag_name,
        text_content: extract_text(dom, element, meta.preformatted),
        is_text_editable: meta.editability.is_text_editable,
        can_edit_styles: meta.editability.can_edit_styles,
        styles,
        geometry,
    }
}

fn computed_styles<D: Dom>(dom: &D, element: &D::Node) -> BTreeMap<String, String> {
    STYLE_PROPERTIES
        .iter()
        .map(|property| {
            let value = dom.computed_style(element, property).unwrap_or_default();
            (property.to_string(), value)
        })
        .collect()
}
