//! Tantivy schema for emulated indices.
//!
//! Stored documents are schemaless JSON objects, so every index shares one
//! fixed five-field layout:
//!
//! | Field | Type | Purpose |
//! |-----------|--------------------------------|---------------------------|
//! | `_id` | STRING \| STORED | exact-match document key |
//! | `_seq` | u64 INDEXED \| STORED \| FAST | stable enumeration order |
//! | `_all` | TEXT (`en_stem`) | catch-all free-text field |
//! | `_source` | STORED | canonical JSON body |
//! | `attrs` | JSON (raw tokenizer, fast) | filterable field view |
//!
//! `_all` receives every string and number in the document so free-text
//! queries work without any schema declaration. `attrs` receives the whole
//! field map; filter expressions address its JSON paths. The raw tokenizer
//! keeps facet values as single exact-match tokens.
//!
//! # Tokenizer
//!
//! Full-text uses an English stemming analyzer (`en_stem`):
//! SimpleTokenizer → LowerCaser → Stemmer(English).

use tantivy::schema::{
    Field, IndexRecordOption, JsonObjectOptions, Schema, SchemaBuilder, TextFieldIndexing,
    TextOptions, FAST, INDEXED, STORED, STRING,
};
use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, Stemmer, TextAnalyzer};
use tantivy::Index;

/// Document key field name.
pub const FIELD_ID: &str = "_id";
/// Sequence number field name.
pub const FIELD_SEQ: &str = "_seq";
/// Catch-all text field name.
pub const FIELD_ALL: &str = "_all";
/// Stored JSON body field name.
pub const FIELD_SOURCE: &str = "_source";
/// JSON attributes field name.
pub const FIELD_ATTRS: &str = "attrs";

/// Store schema holding field references and the Tantivy schema.
///
/// Typed access to schema fields avoids string lookups during indexing and
/// querying.
#[derive(Clone)]
pub struct StoreSchema {
    schema: Schema,

    /// Exact-match document key.
    pub id: Field,
    /// Per-index write sequence number.
    pub seq: Field,
    /// Catch-all full-text field.
    pub all: Field,
    /// Stored JSON document body.
    pub source: Field,
    /// JSON attributes for filtering.
    pub attrs: Field,
}

impl StoreSchema {
    /// Build the store schema.
    pub fn build() -> Self {
        let mut builder = SchemaBuilder::new();

        let all_options = TextOptions::default().set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer("en_stem")
                .set_index_option(IndexRecordOption::WithFreqsAndPositions),
        );

        let attrs_options = JsonObjectOptions::default()
            .set_indexing_options(
                TextFieldIndexing::default()
                    .set_tokenizer("raw")
                    .set_index_option(IndexRecordOption::Basic),
            )
            .set_fast(Some("raw"));

        let id = builder.add_text_field(FIELD_ID, STRING | STORED);
        let seq = builder.add_u64_field(FIELD_SEQ, INDEXED | STORED | FAST);
        let all = builder.add_text_field(FIELD_ALL, all_options);
        let source = builder.add_text_field(FIELD_SOURCE, STORED);
        let attrs = builder.add_json_field(FIELD_ATTRS, attrs_options);

        let schema = builder.build();

        Self {
            schema,
            id,
            seq,
            all,
            source,
            attrs,
        }
    }

    /// Get the underlying Tantivy schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Register custom tokenizers with a Tantivy index.
    ///
    /// Must be called after creating/opening an index, before any write or
    /// query against `_all`.
    pub fn register_tokenizers(index: &Index) {
        let en_stem = TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(LowerCaser)
            .filter(Stemmer::new(tantivy::tokenizer::Language::English))
            .build();

        index.tokenizers().register("en_stem", en_stem);
    }
}

impl std::fmt::Debug for StoreSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSchema").field("field_count", &5).finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_field_names() {
        let schema = StoreSchema::build();
        let tantivy_schema = schema.schema();

        assert!(tantivy_schema.get_field(FIELD_ID).is_ok());
        assert!(tantivy_schema.get_field(FIELD_SEQ).is_ok());
        assert!(tantivy_schema.get_field(FIELD_ALL).is_ok());
        assert!(tantivy_schema.get_field(FIELD_SOURCE).is_ok());
        assert!(tantivy_schema.get_field(FIELD_ATTRS).is_ok());
    }

    #[test]
    fn test_field_types() {
        let schema = StoreSchema::build();
        let tantivy_schema = schema.schema();

        let id_entry = tantivy_schema.get_field_entry(schema.id);
        assert!(id_entry.is_indexed());
        assert!(id_entry.is_stored());

        let seq_entry = tantivy_schema.get_field_entry(schema.seq);
        assert!(seq_entry.is_fast());
        assert!(seq_entry.is_stored());

        let source_entry = tantivy_schema.get_field_entry(schema.source);
        assert!(!source_entry.is_indexed());
        assert!(source_entry.is_stored());
    }

    #[test]
    fn test_tokenizer_registration() {
        let schema = StoreSchema::build();
        let index = Index::create_in_ram(schema.schema().clone());

        StoreSchema::register_tokenizers(&index);

        assert!(index.tokenizers().get("en_stem").is_some());
    }
}
