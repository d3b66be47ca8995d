pub mod search;

pub use search::{format_results, SearchError, SearchResult, TavilySearch, WebSearch};
