pub mod memory;
pub mod models;
pub mod orchestrator;
pub mod pricing;
pub mod repository;
pub mod status;

pub use memory::{InMemoryOrderRepository, MockPaymentSessionClient, StaticCatalogClient};
pub use models::{
    LineWithProduct, NewOrderItem, Order, OrderLine, OrderListQuery, OrderPage,
    OrderStatus, OrderWithLines, OrderWithProducts, PageMeta, Receipt,
};
pub use orchestrator::OrderOrchestrator;
pub use pricing::{build_snapshot, PriceSnapshot};
pub use repository::OrderRepository;
