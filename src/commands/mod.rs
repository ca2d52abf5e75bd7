pub mod config;
pub mod serve;
pub mod status;
pub mod utils;

pub use serve::serve;
pub use status::status;
