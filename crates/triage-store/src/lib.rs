pub mod error;
pub mod memory;
pub mod models;
pub mod mongo;
pub mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use models::{ThreadRecord, TurnRecord, TurnRole};
pub use mongo::MongoStore;
pub use store::ThreadStore;
