pub mod admin;
pub mod auth;
pub mod billing;
pub mod fx;
pub mod messaging;
pub mod offers;
pub mod products;
pub mod rbac;
pub mod sourcing;
pub mod tenancy;
