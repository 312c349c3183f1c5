// src/handlers/billing.rs

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::billing::{CheckoutResponse, Invoice, PaymentProvider, SubscriptionPlan, SubscriptionStatus},
    services::webhook::{RAZORPAY_SIGNATURE_HEADER, STRIPE_SIGNATURE_HEADER},
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPayload {
    pub plan_id: Uuid,
    pub provider: PaymentProvider,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookAck {
    pub received: bool,
}

#[utoipa::path(
    get,
    path = "/api/billing/plans",
    tag = "Billing",
    responses((status = 200, description = "Planos à venda", body = Vec<SubscriptionPlan>))
)]
pub async fn list_plans(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let plans = app_state
        .billing_service
        .list_plans()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(plans))
}

#[utoipa::path(
    post,
    path = "/api/billing/checkout",
    tag = "Billing",
    request_body = CheckoutPayload,
    responses(
        (status = 200, description = "Pagamento criado no provedor", body = CheckoutResponse),
        (status = 404, description = "Plano inexistente ou inativo"),
        (status = 502, description = "Falha no provedor de pagamento"),
        (status = 503, description = "Provedor não configurado")
    ),
    security(("api_jwt" = []))
)]
pub async fn checkout(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<CheckoutPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let checkout = app_state
        .billing_service
        .checkout(&user.0, payload.plan_id, payload.provider)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(checkout))
}

#[utoipa::path(
    get,
    path = "/api/billing/subscription",
    tag = "Billing",
    responses((status = 200, description = "Assinatura do usuário", body = SubscriptionStatus)),
    security(("api_jwt" = []))
)]
pub async fn get_subscription(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let status = app_state
        .billing_service
        .subscription_status(&user.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(status))
}

#[utoipa::path(
    get,
    path = "/api/billing/invoices",
    tag = "Billing",
    responses((status = 200, description = "Faturas do usuário", body = Vec<Invoice>)),
    security(("api_jwt" = []))
)]
pub async fn list_invoices(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let invoices = app_state
        .billing_service
        .list_invoices(user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(invoices))
}

#[utoipa::path(
    get,
    path = "/api/billing/invoices/{id}/pdf",
    tag = "Billing",
    params(("id" = Uuid, Path, description = "ID da fatura")),
    responses(
        (status = 200, description = "Fatura em PDF", content_type = "application/pdf"),
        (status = 404, description = "Fatura não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn download_invoice_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let invoice = app_state.billing_service.find_invoice(&user.0, id).await.map_err(to_api)?;
    let plan = app_state.billing_service.find_plan(invoice.plan_id).await.map_err(to_api)?;

    // Admin pode baixar a fatura de outro usuário: o cliente é o dono da fatura.
    let customer = if invoice.user_id == user.0.id {
        user.0.clone()
    } else {
        app_state
            .user_repo
            .find_by_id(invoice.user_id)
            .await
            .map_err(to_api)?
            .ok_or(AppError::UserNotFound)
            .map_err(to_api)?
    };

    let filename = format!("attachment; filename=\"{}.pdf\"", invoice.number);
    let pdf_bytes = app_state
        .invoice_service
        .render_pdf(invoice, plan, customer)
        .await
        .map_err(to_api)?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, filename),
    ];

    Ok((headers, pdf_bytes).into_response())
}

fn signature_header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AppError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::InvalidWebhookSignature)
}

#[utoipa::path(
    post,
    path = "/api/billing/webhooks/stripe",
    tag = "Billing",
    request_body(content = String, content_type = "application/json", description = "Evento do Stripe, assinado"),
    responses(
        (status = 200, description = "Evento recebido", body = WebhookAck),
        (status = 400, description = "Assinatura inválida")
    )
)]
pub async fn stripe_webhook(
    State(app_state): State<AppState>,
    locale: Locale,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let signature = signature_header(&headers, STRIPE_SIGNATURE_HEADER)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .billing_service
        .handle_stripe_webhook(&body, signature)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(WebhookAck { received: true }))
}

#[utoipa::path(
    post,
    path = "/api/billing/webhooks/razorpay",
    tag = "Billing",
    request_body(content = String, content_type = "application/json", description = "Evento do Razorpay, assinado"),
    responses(
        (status = 200, description = "Evento recebido", body = WebhookAck),
        (status = 400, description = "Assinatura inválida")
    )
)]
pub async fn razorpay_webhook(
    State(app_state): State<AppState>,
    locale: Locale,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let signature = signature_header(&headers, RAZORPAY_SIGNATURE_HEADER)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .billing_service
        .handle_razorpay_webhook(&body, signature)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(WebhookAck { received: true }))
}
