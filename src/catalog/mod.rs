pub mod conversion;
pub mod descriptor;
pub mod registry;
pub mod types;

pub use conversion::*;
pub use descriptor::*;
pub use registry::*;
pub use types::*;
