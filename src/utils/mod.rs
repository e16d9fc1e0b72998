pub mod logging;
pub mod patterns;

pub use logging::truncate_text;
