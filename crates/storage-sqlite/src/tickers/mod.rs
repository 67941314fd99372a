mod model;
mod repository;

pub use model::{NewTickerMappingDB, TickerMappingDB};
pub use repository::TickerRepository;
