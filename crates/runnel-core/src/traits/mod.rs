pub mod mapper;
pub mod store;

pub use mapper::{FromRecord, ToDeleteQuery, ToRecord};
pub use store::RowStore;
