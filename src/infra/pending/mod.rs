pub mod in_memory;
pub mod json_file_store;

pub use in_memory::InMemoryPendingStore;
pub use json_file_store::JsonFilePendingStore;
