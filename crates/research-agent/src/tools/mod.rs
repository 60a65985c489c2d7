//! The research tools that models can use.

mod company_info;
mod generate_document;
mod security_filter;
mod translate_document;
mod web_search;

pub use company_info::CompanyInfoTool;
pub use generate_document::GenerateDocumentTool;
pub use security_filter::SecurityFilterTool;
pub use translate_document::TranslateDocumentTool;
pub use web_search::WebSearchTool;

/// Normalizes a company name for lookups.
fn company_key(name: &str) -> String {
    name.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_lowercase()
}
