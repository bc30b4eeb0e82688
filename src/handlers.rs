pub mod api;
pub mod auth;
pub mod customers;
pub mod forms;
pub mod layout;
pub mod pages;
pub mod products;
