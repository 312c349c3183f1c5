pub mod user_repo;
pub use user_repo::UserRepository;
pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;
pub mod rbac_repo;
pub use rbac_repo::RbacRepository;
pub mod product_repo;
pub use product_repo::ProductRepository;
pub mod offer_repo;
pub use offer_repo::OfferRepository;
pub mod sourcing_repo;
pub use sourcing_repo::SourcingRepository;
pub mod messaging_repo;
pub use messaging_repo::MessagingRepository;
pub mod fx_repo;
pub use fx_repo::FxRepository;
pub mod billing_repo;
pub use billing_repo::BillingRepository;
