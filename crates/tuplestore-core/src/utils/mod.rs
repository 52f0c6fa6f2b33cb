pub mod fs;

pub use fs::{create_dir_all, find_files, relative_slash_path};
