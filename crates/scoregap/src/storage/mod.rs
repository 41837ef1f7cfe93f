pub mod filesystem;

pub use filesystem::{append, ensure_parent, file_len, remove_if_exists, truncate_to, write_atomic};
