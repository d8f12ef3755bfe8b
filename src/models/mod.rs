pub mod records;
pub mod internal;
pub mod api;

pub use records::*;
pub use internal::*;
pub use api::*;
