mod atomic_io;
mod save_file;

pub use save_file::{decode_snapshot, encode_snapshot, PersistenceError, SaveFile, SceneSnapshot};
