pub mod file_loader;

pub use file_loader::{load_all_pdf_files, load_selected_file};
