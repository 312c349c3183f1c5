pub mod auth;
pub mod billing;
pub mod fx;
pub mod messaging;
pub mod money;
pub mod offer;
pub mod product;
pub mod rbac;
pub mod sourcing;
pub mod tenancy;
