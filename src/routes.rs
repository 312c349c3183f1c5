// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::handlers;
use crate::middleware::auth::{auth_guard, tenant_guard};

/// Monta o router completo. Separado do `main` para os testes de integração.
pub fn build_router(app_state: AppState) -> Router {
    // Rotas públicas: catálogo, câmbio, planos e webhooks dos provedores
    let public_routes = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/permissions", get(handlers::rbac::list_permissions))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/products", get(handlers::products::list_catalogue))
        .route("/api/products/{id}", get(handlers::products::get_product))
        .route("/api/fx/rates", get(handlers::fx::list_rates))
        .route("/api/fx/convert", post(handlers::fx::convert))
        .route("/api/billing/plans", get(handlers::billing::list_plans))
        .route("/api/billing/webhooks/stripe", post(handlers::billing::stripe_webhook))
        .route("/api/billing/webhooks/razorpay", post(handlers::billing::razorpay_webhook));

    // Rotas do usuário logado (sem empresa)
    let user_routes = Router::new()
        .route("/api/users/me", get(handlers::auth::get_me))
        .route("/api/users/me/companies", get(handlers::auth::get_my_companies))
        .route(
            "/api/tenants",
            post(handlers::tenancy::create_tenant).get(handlers::tenancy::list_my_tenants),
        )
        // Ofertas: o comprador vê e responde
        .route("/api/offers", get(handlers::offers::list_offers))
        .route("/api/offers/{id}", get(handlers::offers::get_offer))
        .route("/api/offers/{id}/respond", post(handlers::offers::respond_to_offer))
        // Sourcing do lado do comprador
        .route(
            "/api/sourcing",
            post(handlers::sourcing::create_request).get(handlers::sourcing::list_active),
        )
        .route("/api/sourcing/mine", get(handlers::sourcing::list_mine))
        .route("/api/sourcing/{id}", get(handlers::sourcing::get_request))
        .route("/api/sourcing/{id}/close", post(handlers::sourcing::close_request))
        .route("/api/sourcing/{id}/quotes", get(handlers::sourcing::list_quotes))
        // Mensagens
        .route(
            "/api/conversations",
            post(handlers::messaging::open_conversation).get(handlers::messaging::list_conversations),
        )
        .route(
            "/api/conversations/{id}/messages",
            get(handlers::messaging::list_messages).post(handlers::messaging::post_message),
        )
        .route("/api/conversations/{id}/read", post(handlers::messaging::mark_read))
        // Assinatura
        .route("/api/billing/checkout", post(handlers::billing::checkout))
        .route("/api/billing/subscription", get(handlers::billing::get_subscription))
        .route("/api/billing/invoices", get(handlers::billing::list_invoices))
        .route("/api/billing/invoices/{id}/pdf", get(handlers::billing::download_invoice_pdf))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Moderação: o extrator `AdminUser` barra quem não é admin
    let admin_routes = Router::new()
        .route("/api/admin/products", get(handlers::admin::list_products))
        .route("/api/admin/products/{id}/approve", post(handlers::admin::approve_product))
        .route("/api/admin/products/{id}/reject", post(handlers::admin::reject_product))
        .route("/api/admin/sourcing", get(handlers::admin::list_pending_sourcing))
        .route("/api/admin/sourcing/{id}/approve", post(handlers::admin::approve_sourcing))
        .route("/api/admin/sourcing/{id}/reject", post(handlers::admin::reject_sourcing))
        .route("/api/admin/fx/rates/{currency}", put(handlers::admin::upsert_rate))
        .route("/api/admin/plans", post(handlers::admin::create_plan))
        .route("/api/admin/plans/{id}/activate", post(handlers::admin::activate_plan))
        .route("/api/admin/plans/{id}/deactivate", post(handlers::admin::deactivate_plan))
        .route("/api/admin/users", get(handlers::admin::list_users))
        .route("/api/admin/users/{id}/suspend", post(handlers::admin::suspend_user))
        .route("/api/admin/users/{id}/unsuspend", post(handlers::admin::unsuspend_user))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Rotas da empresa: exigem o header x-tenant-id e vínculo com ela
    let tenant_routes = Router::new()
        .route("/api/tenants/members", post(handlers::tenancy::add_member))
        .route(
            "/api/tenants/roles",
            post(handlers::rbac::create_role).get(handlers::rbac::list_roles),
        )
        .route("/api/tenants/subscription", get(handlers::tenancy::get_tenant_subscription))
        .route(
            "/api/tenants/products",
            post(handlers::products::create_product).get(handlers::products::list_tenant_products),
        )
        .route(
            "/api/tenants/products/enhance-description",
            post(handlers::products::enhance_description),
        )
        .route("/api/tenants/products/{id}/archive", post(handlers::products::archive_product))
        .route("/api/tenants/offers", post(handlers::offers::create_offer))
        .route("/api/tenants/sourcing/{id}/quotes", post(handlers::sourcing::submit_quote))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            tenant_guard,
        ));

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes)
        .merge(tenant_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}
