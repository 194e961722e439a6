// 駆動される側アダプター（リポジトリ実装、購読レジストリ、ロガー）

mod demo_data;
mod in_memory_repository;
mod mysql_booking_repository;
mod mysql_catalog_repository;
mod mysql_seat_repository;
mod mysql_user_repository;
mod subscription_registry;
mod tracing_logger;

pub use demo_data::{demo_concert_date, demo_data, venue_seats, DemoData};
pub use in_memory_repository::{InMemoryCatalog, InMemoryInventory, InMemoryUserRepository};
pub use mysql_booking_repository::MySqlBookingRepository;
pub use mysql_catalog_repository::MySqlCatalogRepository;
pub use mysql_seat_repository::{MySqlSeatClaimTransaction, MySqlSeatRepository};
pub use mysql_user_repository::MySqlUserRepository;
pub use subscription_registry::InMemorySubscriptionRegistry;
pub use tracing_logger::TracingLogger;
