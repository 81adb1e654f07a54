pub mod address;
pub mod error;
pub mod function;
pub mod limits;
pub mod value;

pub use address::*;
pub use error::*;
pub use function::*;
pub use limits::*;
pub use value::*;
