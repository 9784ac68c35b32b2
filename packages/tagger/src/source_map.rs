//! Source maps for tagged output
//!
//! Columns are counted in UTF-16 code units, which is what JavaScript
//! tooling (and therefore the identity's column) uses.

use crate::edits::EditList;
use sourcemap::{SourceMap, SourceMapBuilder};

/// UTF-16 column of byte `offset`, given the byte offset where its line starts.
pub fn utf16_column(source: &str, line_start: usize, offset: usize) -> Option<u32> {
    let prefix = source.get(line_start..offset)?;
    u32::try_from(prefix.encode_utf16().count()).ok()
}

/// Tracks generated positions while mapping them back to the original file.
struct TaggedMapBuilder {
    builder: SourceMapBuilder,
    gen_line: u32,
    gen_col: u32,
}

impl TaggedMapBuilder {
    fn new(file_path: &str, original: &str) -> Self {
        let mut builder = SourceMapBuilder::new(Some(file_path));
        let source_id = builder.add_source(file_path);
        builder.set_source_contents(source_id, Some(original));

        Self {
            builder,
            gen_line: 0,
            gen_col: 0,
        }
    }

    fn map_to(&mut self, src_line: u32, src_col: u32) {
        self.builder.add_raw(
            self.gen_line,
            self.gen_col,
            src_line,
            src_col,
            Some(0),
            None,
            false,
        );
    }

    // Inserted attributes have no original position.
    fn map_unmapped(&mut self) {
        self.builder
            .add_raw(self.gen_line, self.gen_col, 0, 0, None, None, false);
    }

    fn advance(&mut self, text: &str) {
        for ch in text.chars() {
            self.advance_char(ch);
        }
    }

    fn advance_char(&mut self, ch: char) {
        if ch == '\n' {
            self.gen_line += 1;
            self.gen_col = 0;
        } else {
            self.gen_col += ch.len_utf16() as u32;
        }
    }

    fn build(self) -> SourceMap {
        self.builder.into_sourcemap()
    }
}

/// Map every line start and every insertion boundary of the tagged output
/// back to `original`. Offsets in `edits` must already be validated.
pub fn build_source_map(file_path: &str, original: &str, edits: &EditList) -> SourceMap {
    let mut map = TaggedMapBuilder::new(file_path, original);
    let mut src = (0u32, 0u32);
    let mut cursor = 0usize;

    map.map_to(0, 0);

    for insertion in edits.sorted() {
        copy_original(&mut map, &mut src, &original[cursor..insertion.offset]);
        map.map_unmapped();
        map.advance(&insertion.text);
        map.map_to(src.0, src.1);
        cursor = insertion.offset;
    }
    copy_original(&mut map, &mut src, &original[cursor..]);

    map.build()
}

fn copy_original(map: &mut TaggedMapBuilder, src: &mut (u32, u32), chunk: &str) {
    for ch in chunk.chars() {
        map.advance_char(ch);
        if ch == '\n' {
            *src = (src.0 + 1, 0);
            map.map_to(src.0, src.1);
        } else {
            src.1 += ch.len_utf16() as u32;
        }
    }
}
