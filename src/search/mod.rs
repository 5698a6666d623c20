//! Search requests, result rows, and the service that answers them.

pub mod engine;
mod lang;
mod request;
mod row;

pub use engine::{SearchError, SearchService};
pub use lang::{Language, Region};
pub use request::{ContentType, SearchRequest, Sort, SortOrder};
pub use row::{IndexRow, SearchResultRow};
