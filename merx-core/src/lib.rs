pub mod catalog;
pub mod error;
pub mod payment;

pub use catalog::{CatalogProduct, ProductCatalogClient};
pub use error::{OrderError, OrderResult};
pub use payment::{PaymentSessionClient, SessionLineItem};
