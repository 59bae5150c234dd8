//! Table formatting utilities for structured output.

use crate::retrieve::{RetrievalResult, RetrieverInfo};
use comfy_table::{Attribute, Cell, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

/// Builder for creating formatted tables.
pub struct TableBuilder {
    table: Table,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    /// Create a new table builder.
    pub fn new() -> Self {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.apply_modifier(UTF8_ROUND_CORNERS);
        Self { table }
    }

    /// Set the table headers.
    pub fn set_headers(mut self, headers: Vec<&str>) -> Self {
        let header_cells: Vec<Cell> = headers
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect();
        self.table.set_header(header_cells);
        self
    }

    /// Add a row to the table.
    pub fn add_row(mut self, row: Vec<String>) -> Self {
        self.table.add_row(row);
        self
    }

    /// Build and return the formatted table.
    pub fn build(self) -> String {
        self.table.to_string()
    }
}

/// Create a table describing the loaded artifacts.
pub fn create_info_table(info: &RetrieverInfo, index_path: &str, metadata_path: &str) -> String {
    let search = if info.partitions == 0 {
        "exact (flat)".to_string()
    } else {
        format!("IVF, {} partitions", info.partitions)
    };

    TableBuilder::new()
        .set_headers(vec!["Artifact", "Value"])
        .add_row(vec!["Model".to_string(), info.model.clone()])
        .add_row(vec!["Dimension".to_string(), info.dimension.to_string()])
        .add_row(vec!["Entries".to_string(), info.entries.to_string()])
        .add_row(vec!["Search".to_string(), search])
        .add_row(vec!["Index file".to_string(), index_path.to_string()])
        .add_row(vec!["Metadata file".to_string(), metadata_path.to_string()])
        .build()
}

/// Create a compact results table, one row per retrieved sentence.
pub fn create_results_table(results: &[RetrievalResult]) -> String {
    let mut builder = TableBuilder::new().set_headers(vec!["#", "Sentence", "Story", "Distance"]);
    for (i, result) in results.iter().enumerate() {
        builder = builder.add_row(vec![
            (i + 1).to_string(),
            result.sentence.clone(),
            result.story_title.clone(),
            format!("{:.4}", result.distance),
        ]);
    }
    builder.build()
}
