mod common;
mod decode;
mod encode;
mod error;
mod lexical;

pub use common::*;
pub use decode::*;
pub use encode::*;
pub use error::*;
pub use lexical::*;
