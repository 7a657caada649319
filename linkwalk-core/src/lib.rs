pub mod data;
pub mod error;
pub mod extract;
pub mod map;
pub mod navigator;
pub mod page;
pub mod registry;

pub use error::NavigationError;
pub use navigator::{Navigator, Population, Selection, Snapshot, Step};
pub use page::{Page, PageId, PageState};
pub use registry::Registry;
