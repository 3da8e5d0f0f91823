pub mod app_config;
pub mod catalog_client;
pub mod database;
pub mod order_repo;
pub mod payment_client;

pub use app_config::Config;
pub use catalog_client::HttpCatalogClient;
pub use database::DbClient;
pub use order_repo::PgOrderRepository;
pub use payment_client::HttpPaymentSessionClient;
