pub mod changes;
pub mod query;
pub mod record;
pub mod result;

pub use changes::Changes;
pub use query::{DeleteQuery, Predicate, Query, QueryTarget, RawQuery};
pub use record::{Record, Value};
pub use result::{DeleteResult, DeleteResults, PutResult, PutResults};
