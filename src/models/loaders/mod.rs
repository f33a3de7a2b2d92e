pub mod paper_file;

pub use paper_file::{load_all_paper_files, load_paper_file, PaperFile};
