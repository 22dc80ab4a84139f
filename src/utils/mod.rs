pub mod error;
pub mod logging;

pub use error::ReaderError;
pub use logging::init_logging;
