mod chunk_enricher;
mod code_info;
mod document_walker;
mod hierarchy_tracker;
mod line_classifier;
mod markdown_and_page_chunks;
mod page_extract_and_normalize;
mod pipeline;
mod run;
#[cfg(test)]
mod tests;
mod title_resolver;

pub use run::run;

pub(crate) use code_info::{CodeMapping, legitext_id_for, load_code_mapping};
