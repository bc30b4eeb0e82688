pub mod resource;
pub use resource::{Creatable, Editable, HookState, ParentScope, Resource, ResourceHook};
pub mod customers;
pub use customers::{use_customers, CustomersHook};
pub mod products;
pub use products::{use_products, ProductsHook};
pub mod inventory;
pub use inventory::{use_inventory, InventoryHook};
pub mod orders;
pub use orders::{
    use_purchase_order_items, use_purchase_orders, use_sales_order_items, use_sales_orders,
    PurchaseOrdersHook, SalesOrdersHook,
};
