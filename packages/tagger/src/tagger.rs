//! # JSX element tagging
//!
//! ## Algorithm
//!
//! 1. Parse with the TSX grammar (JSX, type annotations, decorators, class
//!    fields and dynamic `import()` all parse). Any syntax error aborts the
//!    whole file and the original text is returned.
//! 2. Walk the tree depth-first and visit every opening and self-closing
//!    element.
//! 3. Resolve its name (`Button`, `Motion.div`, `svg:rect`), skip excluded
//!    names and elements that already carry an identity.
//! 4. Record ` data-sg-el=".." data-sg-name=".."` right after the name.
//! 5. Apply every recorded insertion in one pass over the original text.

use crate::edits::EditList;
use crate::error::{TagError, TagResult};
use crate::options::TaggerOptions;
use crate::source_map::{build_source_map, utf16_column};
use liveedit_protocol::{Identity, IDENTITY_ATTR, NAME_ATTR};
use sourcemap::SourceMap;
use tracing::{debug, error, instrument, warn};
use tree_sitter::{Node, Parser, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagStatus {
    /// The file was parsed and all eligible elements were tagged
    Tagged,
    /// Build mode or path filters excluded the file
    NotApplicable,
    /// The file could not be processed; the original text was returned
    PassedThrough,
}

/// Result of tagging one file.
#[derive(Debug)]
pub struct TagReport {
    pub code: String,
    pub status: TagStatus,
    pub inserted: usize,
    pub failed: usize,
    pub source_map: Option<SourceMap>,
}

impl TagReport {
    fn unchanged(source: &str, status: TagStatus) -> Self {
        Self {
            code: source.to_string(),
            status,
            inserted: 0,
            failed: 0,
            source_map: None,
        }
    }

    pub fn changed(&self) -> bool {
        self.inserted > 0
    }
}

/// Reusable tagger holding a configured parser.
pub struct Tagger {
    options: TaggerOptions,
    parser: Parser,
}

impl Tagger {
    pub fn new(options: TaggerOptions) -> TagResult<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TSX.into())
            .map_err(|e| TagError::Language(format!("{:?}", e)))?;
        Ok(Self { options, parser })
    }

    pub fn options(&self) -> &TaggerOptions {
        &self.options
    }

    /// Tag `source` and return the new text. Never fails.
    pub fn tag(&mut self, source: &str, file_path: &str) -> String {
        self.tag_file(source, file_path).code
    }

    #[instrument(skip(self, source), fields(path = %file_path))]
    pub fn tag_file(&mut self, source: &str, file_path: &str) -> TagReport {
        if !self.options.applies_to(file_path) {
            return TagReport::unchanged(source, TagStatus::NotApplicable);
        }

        match self.collect_edits(source, file_path) {
            Ok((edits, failed)) => match self.finish(source, file_path, &edits) {
                Ok((code, source_map)) => {
                    debug!(inserted = edits.len(), failed, "Tagged file");
                    TagReport {
                        code,
                        status: TagStatus::Tagged,
                        inserted: edits.len(),
                        failed,
                        source_map,
                    }
                }
                Err(e) => {
                    error!(error = %e, "Failed to apply element tags");
                    TagReport::unchanged(source, TagStatus::PassedThrough)
                }
            },
            Err(e) => {
                error!(error = %e, "Critical error while tagging");
                TagReport::unchanged(source, TagStatus::PassedThrough)
            }
        }
    }

    fn finish(
        &self,
        source: &str,
        file_path: &str,
        edits: &EditList,
    ) -> TagResult<(String, Option<SourceMap>)> {
        let code = edits.apply(source)?;
        let source_map = self
            .options
            .source_maps
            .then(|| build_source_map(file_path, source, edits));
        Ok((code, source_map))
    }

    /// Parse and record an insertion for every eligible element.
    ///
    /// Returns the edit list and the number of elements that failed.
    fn collect_edits(&mut self, source: &str, file_path: &str) -> TagResult<(EditList, usize)> {
        let tree = self.parse(source)?;
        let mut edits = EditList::new();
        let mut failed = 0;

        let mut cursor = tree.walk();
        'walk: loop {
            let node = cursor.node();
            if is_element_tag(&node) {
                match self.tag_element(&node, source, file_path) {
                    Ok(Some((offset, text))) => edits.insert(offset, text),
                    Ok(None) => {}
                    Err(e) => {
                        failed += 1;
                        warn!(error = %e, "Failed to tag element");
                    }
                }
            }

            if cursor.goto_first_child() {
                continue;
            }
            while !cursor.goto_next_sibling() {
                if !cursor.goto_parent() {
                    break 'walk;
                }
            }
        }

        Ok((edits, failed))
    }

    fn parse(&mut self, source: &str) -> TagResult<Tree> {
        let tree = self.parser.parse(source, None).ok_or(TagError::Parse)?;
        let root = tree.root_node();
        if root.has_error() {
            let position = first_error(&root)
                .map(|n| n.start_position())
                .unwrap_or_else(|| root.start_position());
            return Err(TagError::Syntax {
                line: position.row + 1,
                column: position.column,
            });
        }
        Ok(tree)
    }

    fn tag_element(
        &self,
        node: &Node,
        source: &str,
        file_path: &str,
    ) -> TagResult<Option<(usize, String)>> {
        let Some(name_node) = node.child_by_field_name("name") else {
            return Ok(None);
        };
        let Some(element_name) = element_name(&name_node, source)? else {
            return Ok(None);
        };

        if self.options.is_excluded(&element_name) || has_identity(node, source)? {
            return Ok(None);
        }

        let start = node.start_byte();
        let position = node.start_position();
        let line_start = start
            .checked_sub(position.column)
            .ok_or_else(|| TagError::invalid_location(start))?;
        let column = utf16_column(source, line_start, start)
            .ok_or_else(|| TagError::invalid_location(start))?;
        let line = u32::try_from(position.row + 1).map_err(|_| TagError::invalid_location(start))?;

        let identity = Identity::encode(file_path, line, column);
        let attributes = format!(
            " {}=\"{}\" {}=\"{}\"",
            IDENTITY_ATTR,
            html_escape::encode_double_quoted_attribute(&identity),
            NAME_ATTR,
            html_escape::encode_double_quoted_attribute(&element_name),
        );

        // `<List<Item> ...>`: attributes go after the type arguments.
        let insert_after = type_arguments(node).unwrap_or(name_node);
        Ok(Some((insert_after.end_byte(), attributes)))
    }
}

/// Tag with default options (development mode). Never fails.
pub fn tag(source: &str, file_path: &str) -> String {
    match Tagger::new(TaggerOptions::default()) {
        Ok(mut tagger) => tagger.tag(source, file_path),
        Err(e) => {
            error!(error = %e, "Tagger unavailable");
            source.to_string()
        }
    }
}

fn is_element_tag(node: &Node) -> bool {
    matches!(node.kind(), "jsx_opening_element" | "jsx_self_closing_element")
}

fn node_text<'a>(node: &Node, source: &'a str) -> TagResult<&'a str> {
    node.utf8_text(source.as_bytes())
        .map_err(|_| TagError::InvalidName {
            offset: node.start_byte(),
        })
}

/// Resolve `Name`, `Object.Member` or `ns:name`; any other shape yields `None`.
fn element_name(name_node: &Node, source: &str) -> TagResult<Option<String>> {
    match name_node.kind() {
        "identifier" | "jsx_identifier" => Ok(Some(node_text(name_node, source)?.to_string())),
        "member_expression" | "nested_identifier" | "jsx_namespace_name" => {
            let text = node_text(name_node, source)?;
            Ok(Some(text.chars().filter(|c| !c.is_whitespace()).collect()))
        }
        _ => Ok(None),
    }
}

fn has_identity(node: &Node, source: &str) -> TagResult<bool> {
    let mut cursor = node.walk();
    for attribute in node.named_children(&mut cursor) {
        if attribute.kind() != "jsx_attribute" {
            continue;
        }
        let text = node_text(&attribute, source)?;
        let name = text.split('=').next().unwrap_or_default().trim();
        if name == IDENTITY_ATTR {
            return Ok(true);
        }
    }
    Ok(false)
}

fn type_arguments<'tree>(node: &Node<'tree>) -> Option<Node<'tree>> {
    if let Some(args) = node.child_by_field_name("type_arguments") {
        return Some(args);
    }
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .find(|child| child.kind() == "type_arguments");
    found
}

fn first_error<'tree>(node: &Node<'tree>) -> Option<Node<'tree>> {
    if node.is_error() || node.is_missing() {
        return Some(*node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'tree>> = node.children(&mut cursor).collect();
    children.iter().find_map(first_error)
}
