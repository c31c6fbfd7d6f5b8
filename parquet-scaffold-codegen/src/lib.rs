mod error;
mod merge;
mod reflected;
mod writer;

pub use error::*;
pub use merge::*;
pub use reflected::*;
pub use writer::*;
