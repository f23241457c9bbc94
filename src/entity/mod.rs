pub mod audit_logs;
pub mod order_items;
pub mod order_stores;
pub mod orders;
pub mod products;
pub mod profiles;
pub mod stores;

pub use audit_logs::Entity as AuditLogs;
pub use order_items::Entity as OrderItems;
pub use order_stores::Entity as OrderStores;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use profiles::Entity as Profiles;
pub use stores::Entity as Stores;
