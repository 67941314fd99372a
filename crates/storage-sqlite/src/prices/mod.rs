mod model;
mod repository;

pub use model::PriceCacheDB;
pub use repository::PriceRepository;
