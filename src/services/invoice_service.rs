// src/services/invoice_service.rs

use genpdf::{elements, style, Alignment, Element};
use image::Luma;
use qrcode::QrCode;

use crate::{
    common::error::AppError,
    models::{
        auth::User,
        billing::{Invoice, SubscriptionPlan},
    },
};

const FONT_FAMILY: &str = "Roboto";

#[derive(Clone)]
pub struct InvoiceService {
    font_dir: String,
}

impl InvoiceService {
    pub fn new(font_dir: String) -> Self {
        Self { font_dir }
    }

    /// Renderiza a fatura em PDF fora do runtime assíncrono.
    pub async fn render_pdf(
        &self,
        invoice: Invoice,
        plan: SubscriptionPlan,
        customer: User,
    ) -> Result<Vec<u8>, AppError> {
        let font_dir = self.font_dir.clone();
        tokio::task::spawn_blocking(move || render_invoice(&font_dir, &invoice, &plan, &customer))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de PDF: {}", e))?
    }
}

fn pdf_err(e: impl std::fmt::Display) -> AppError {
    AppError::PdfError(e.to_string())
}

/// Conteúdo do QR: número, valor e pagamento, para conferência.
pub fn verification_payload(invoice: &Invoice) -> String {
    format!(
        "{}|{} {}|{}",
        invoice.number, invoice.amount, invoice.currency, invoice.payment_id
    )
}

fn render_invoice(
    font_dir: &str,
    invoice: &Invoice,
    plan: &SubscriptionPlan,
    customer: &User,
) -> Result<Vec<u8>, AppError> {
    let font_family = genpdf::fonts::from_files(font_dir, FONT_FAMILY, None)
        .map_err(|e| pdf_err(format!("fonte {} não encontrada em {}: {}", FONT_FAMILY, font_dir, e)))?;

    let mut doc = genpdf::Document::new(font_family);
    doc.set_title(format!("Fatura {}", invoice.number));
    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(10);
    doc.set_page_decorator(decorator);

    doc.push(elements::Paragraph::new("FATURA / INVOICE").styled(style::Style::new().bold().with_font_size(18)));
    doc.push(elements::Paragraph::new(invoice.number.clone()).styled(style::Style::new().with_font_size(12)));
    doc.push(elements::Break::new(1.5));

    doc.push(elements::Paragraph::new(format!("Emitida em: {}", invoice.issued_at.format("%d/%m/%Y"))));
    doc.push(elements::Paragraph::new(format!("Cliente: {} <{}>", customer.display_name, customer.email)));
    doc.push(elements::Break::new(2));

    let mut table = elements::TableLayout::new(vec![4, 3, 2]);
    table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

    let style_bold = style::Style::new().bold();
    table
        .row()
        .element(elements::Paragraph::new("Plano").styled(style_bold))
        .element(elements::Paragraph::new("Período").styled(style_bold))
        .element(elements::Paragraph::new("Valor").styled(style_bold))
        .push()
        .map_err(pdf_err)?;

    table
        .row()
        .element(elements::Paragraph::new(plan.name.clone()))
        .element(elements::Paragraph::new(format!(
            "{} a {}",
            invoice.period_start.format("%d/%m/%Y"),
            invoice.period_end.format("%d/%m/%Y")
        )))
        .element(elements::Paragraph::new(format!("{} {:.2}", invoice.currency, invoice.amount)))
        .push()
        .map_err(pdf_err)?;

    doc.push(table);
    doc.push(elements::Break::new(2));

    let mut total = elements::Paragraph::new(format!("TOTAL: {} {:.2}", invoice.currency, invoice.amount));
    total.set_alignment(Alignment::Right);
    doc.push(total.styled(style::Style::new().bold().with_font_size(12)));
    doc.push(elements::Break::new(2));

    let code = QrCode::new(verification_payload(invoice).as_bytes()).map_err(pdf_err)?;
    let image_buffer = code.render::<Luma<u8>>().build();
    let pdf_image = elements::Image::from_dynamic_image(image::DynamicImage::ImageLuma8(image_buffer))
        .map_err(pdf_err)?
        .with_scale(genpdf::Scale::new(0.5, 0.5));
    doc.push(pdf_image);

    let mut buffer = Vec::new();
    doc.render(&mut buffer).map_err(pdf_err)?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn invoice() -> Invoice {
        let now = Utc::now();
        Invoice {
            id: Uuid::new_v4(),
            number: "INV-2026-000007".into(),
            user_id: Uuid::new_v4(),
            payment_id: Uuid::nil(),
            plan_id: Uuid::new_v4(),
            amount: Decimal::new(4900, 2),
            currency: "USD".into(),
            period_start: now,
            period_end: now,
            issued_at: now,
        }
    }

    #[test]
    fn qr_payload_identifies_the_invoice() {
        assert_eq!(
            verification_payload(&invoice()),
            "INV-2026-000007|49.00 USD|00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn missing_fonts_are_reported_as_pdf_errors() {
        let now = Utc::now();
        let plan = SubscriptionPlan {
            id: Uuid::new_v4(),
            name: "Pro".into(),
            description: None,
            price_amount: Decimal::new(4900, 2),
            price_currency: "USD".into(),
            duration_days: 30,
            max_listings: 100,
            is_active: true,
            created_at: now,
        };
        let user = User {
            id: Uuid::new_v4(),
            email: "comprador@example.com".into(),
            password_hash: String::new(),
            display_name: "Comprador".into(),
            is_admin: false,
            is_suspended: false,
            subscription_plan_id: None,
            subscription_expires_at: None,
            created_at: now,
            updated_at: now,
        };

        let result = render_invoice("/caminho/que/nao/existe", &invoice(), &plan, &user);
        assert!(matches!(result, Err(AppError::PdfError(_))));
    }
}
