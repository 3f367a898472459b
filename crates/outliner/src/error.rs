use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Input directory not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("{failed} of {total} documents failed")]
    BatchFailed { failed: usize, total: usize },
}
