pub mod pdf_loader;

pub use pdf_loader::{load_input_files, load_single_file};
