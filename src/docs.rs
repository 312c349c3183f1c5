// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::auth::get_my_companies,

        // --- Tenancy ---
        handlers::tenancy::create_tenant,
        handlers::tenancy::list_my_tenants,
        handlers::tenancy::add_member,
        handlers::tenancy::get_tenant_subscription,

        // --- RBAC ---
        handlers::rbac::create_role,
        handlers::rbac::list_roles,
        handlers::rbac::list_permissions,

        // --- Products ---
        handlers::products::list_catalogue,
        handlers::products::get_product,
        handlers::products::create_product,
        handlers::products::list_tenant_products,
        handlers::products::archive_product,
        handlers::products::enhance_description,

        // --- Offers ---
        handlers::offers::create_offer,
        handlers::offers::list_offers,
        handlers::offers::get_offer,
        handlers::offers::respond_to_offer,

        // --- Sourcing ---
        handlers::sourcing::create_request,
        handlers::sourcing::list_active,
        handlers::sourcing::list_mine,
        handlers::sourcing::get_request,
        handlers::sourcing::close_request,
        handlers::sourcing::list_quotes,
        handlers::sourcing::submit_quote,

        // --- Messaging ---
        handlers::messaging::open_conversation,
        handlers::messaging::list_conversations,
        handlers::messaging::list_messages,
        handlers::messaging::post_message,
        handlers::messaging::mark_read,

        // --- FX ---
        handlers::fx::list_rates,
        handlers::fx::convert,

        // --- Billing ---
        handlers::billing::list_plans,
        handlers::billing::checkout,
        handlers::billing::get_subscription,
        handlers::billing::list_invoices,
        handlers::billing::download_invoice_pdf,
        handlers::billing::stripe_webhook,
        handlers::billing::razorpay_webhook,

        // --- Admin ---
        handlers::admin::list_products,
        handlers::admin::approve_product,
        handlers::admin::reject_product,
        handlers::admin::list_pending_sourcing,
        handlers::admin::approve_sourcing,
        handlers::admin::reject_sourcing,
        handlers::admin::upsert_rate,
        handlers::admin::create_plan,
        handlers::admin::activate_plan,
        handlers::admin::deactivate_plan,
        handlers::admin::list_users,
        handlers::admin::suspend_user,
        handlers::admin::unsuspend_user,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- TENANCY ---
            models::tenancy::Tenant,
            models::tenancy::TenantMember,
            handlers::tenancy::CreateTenantPayload,
            handlers::tenancy::AddMemberPayload,

            // --- RBAC ---
            models::rbac::Role,
            models::rbac::Permission,
            models::rbac::CreateRolePayload,
            models::rbac::RoleResponse,

            // --- Money / FX ---
            models::money::Price,
            models::fx::ExchangeRate,
            handlers::fx::ConvertPayload,
            handlers::fx::ConvertResponse,

            // --- Products ---
            models::product::ProductStatus,
            models::product::Product,
            models::product::ProductView,
            handlers::products::CreateProductPayload,
            handlers::products::EnhanceDescriptionPayload,
            handlers::products::EnhanceDescriptionResponse,

            // --- Offers ---
            models::offer::OfferStatus,
            models::offer::OfferDecision,
            models::offer::Offer,
            handlers::offers::CreateOfferPayload,
            handlers::offers::RespondOfferPayload,

            // --- Sourcing ---
            models::sourcing::SourcingStatus,
            models::sourcing::SourcingRequest,
            models::sourcing::SourcingQuote,
            models::sourcing::QuoteView,
            handlers::sourcing::CreateSourcingPayload,
            handlers::sourcing::SubmitQuotePayload,

            // --- Messaging ---
            models::messaging::Conversation,
            models::messaging::Message,
            handlers::messaging::OpenConversationPayload,
            handlers::messaging::PostMessagePayload,
            handlers::messaging::MarkReadResponse,

            // --- Billing ---
            models::billing::SubscriptionPlan,
            models::billing::PaymentProvider,
            models::billing::PaymentStatus,
            models::billing::Payment,
            models::billing::Invoice,
            models::billing::CheckoutResponse,
            models::billing::SubscriptionStatus,
            handlers::billing::CheckoutPayload,
            handlers::billing::WebhookAck,

            // --- Admin ---
            handlers::admin::RejectPayload,
            handlers::admin::UpsertRatePayload,
            handlers::admin::CreatePlanPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário e Perfil"),
        (name = "Tenancy", description = "Empresas e Membros"),
        (name = "RBAC", description = "Controle de Acesso (Cargos e Permissões)"),
        (name = "Products", description = "Catálogo e Anúncios das Empresas"),
        (name = "Offers", description = "Ofertas Formais do Vendedor ao Comprador"),
        (name = "Sourcing", description = "Pedidos de Cotação e Cotações"),
        (name = "Messaging", description = "Conversas entre Comprador e Vendedor"),
        (name = "FX", description = "Câmbio via USD"),
        (name = "Billing", description = "Planos, Checkout, Webhooks e Faturas"),
        (name = "Admin", description = "Moderação e Administração")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
