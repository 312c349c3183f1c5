pub mod ai_service;
pub mod auth;
pub mod billing_service;
pub mod fx_service;
pub mod invoice_service;
pub mod messaging_service;
pub mod offer_service;
pub mod payment_gateway;
pub mod product_service;
pub mod rbac_service;
pub mod sourcing_service;
pub mod tenancy_service;
pub mod webhook;
