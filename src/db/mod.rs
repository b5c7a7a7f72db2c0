pub mod pool;
pub mod queries;
pub mod schema;

pub use pool::create_pool;
pub use queries::*;
pub use schema::init_schema;
