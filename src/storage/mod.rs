//! Persistence gateway split across logical submodules.

mod backup;
mod records;
mod store;

pub use records::FORMAT_VERSION;
pub use store::FileStore;
