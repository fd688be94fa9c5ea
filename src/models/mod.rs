pub mod document;
pub mod request;
pub mod stats;
pub mod todo;

pub use document::*;
pub use request::*;
pub use stats::*;
pub use todo::*;
