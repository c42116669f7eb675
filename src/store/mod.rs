mod api;
mod in_memory;

pub use api::LogStore;
pub use in_memory::InMemoryLogStore;
