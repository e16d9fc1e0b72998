pub mod toml_loader;

pub use toml_loader::{load_all_exam_sheets, load_exam_sheet};
