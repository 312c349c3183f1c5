// src/services/fx_service.rs

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::PgConnection;

use crate::{
    common::error::AppError,
    db::FxRepository,
    models::{
        fx::ExchangeRate,
        money::{normalize_currency, Price},
    },
};

pub const PIVOT_CURRENCY: &str = "USD";

/// Tabela "unidades da moeda por 1 USD", indexada pelo código em maiúsculas.
pub type RateTable = HashMap<String, Decimal>;

fn rate_for(code: &str, rates: &RateTable) -> Option<Decimal> {
    if code == PIVOT_CURRENCY {
        return Some(Decimal::ONE);
    }
    rates.get(code).copied().filter(|rate| *rate > Decimal::ZERO)
}

/// Valor em `target_currency`, ou `None` quando não dá para converter
/// (cotação ausente ou inutilizável, ou overflow). Mesma moeda sempre converte.
fn try_convert(price: &Price, target_currency: &str, rates: &RateTable) -> Option<Decimal> {
    let from = normalize_currency(&price.base_currency);
    let to = normalize_currency(target_currency);

    if from == to {
        return Some(price.base_amount);
    }

    let (Some(from_rate), Some(to_rate)) = (rate_for(&from, rates), rate_for(&to, rates)) else {
        tracing::warn!(
            "Cotação ausente para {} -> {}; mantendo o valor original",
            from,
            to
        );
        return None;
    };

    let converted = price
        .base_amount
        .checked_div(from_rate)
        .and_then(|usd| usd.checked_mul(to_rate));
    if converted.is_none() {
        tracing::warn!("Overflow convertendo {} {} -> {}", price.base_amount, from, to);
    }
    converted
}

/// Converte `price` para `target_currency` passando pelo USD.
///
/// Mesma moeda devolve o valor intacto. Sem cotação utilizável (ausente,
/// zero ou negativa) devolve o valor original e registra um aviso.
pub fn convert_price(price: &Price, target_currency: &str, rates: &RateTable) -> Decimal {
    try_convert(price, target_currency, rates).unwrap_or(price.base_amount)
}

#[derive(Clone)]
pub struct FxService {
    repo: FxRepository,
}

impl FxService {
    pub fn new(repo: FxRepository) -> Self {
        Self { repo }
    }

    pub async fn list_rates(&self) -> Result<Vec<ExchangeRate>, AppError> {
        self.repo.list_rates().await
    }

    pub async fn rate_table(&self) -> Result<RateTable, AppError> {
        Ok(self
            .repo
            .list_rates()
            .await?
            .into_iter()
            .map(|r| (normalize_currency(&r.currency), r.rate_per_usd))
            .collect())
    }

    pub async fn upsert_rate(
        &self,
        conn: &mut PgConnection,
        currency: &str,
        rate_per_usd: Decimal,
    ) -> Result<ExchangeRate, AppError> {
        let currency = normalize_currency(currency);
        if currency == PIVOT_CURRENCY {
            return Err(AppError::Conflict("a cotação do USD é fixa em 1".into()));
        }

        let rate = self.repo.upsert_rate(conn, &currency, rate_per_usd).await?;
        tracing::info!("💱 Cotação atualizada: 1 USD = {} {}", rate.rate_per_usd, rate.currency);
        Ok(rate)
    }

    pub async fn convert(&self, price: &Price, target_currency: &str) -> Result<Price, AppError> {
        let rates = self.rate_table().await?;
        Ok(display_price(price, target_currency, &rates))
    }
}

/// Preço convertido para exibição, com duas casas decimais.
/// No fallback o valor continua na moeda de origem.
pub fn display_price(price: &Price, target_currency: &str, rates: &RateTable) -> Price {
    match try_convert(price, target_currency, rates) {
        Some(amount) => Price::new(amount.round_dp(2), target_currency),
        None => Price::new(price.base_amount.round_dp(2), &price.base_currency),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn rates() -> RateTable {
        HashMap::from([
            ("BRL".to_string(), dec("5.00")),
            ("INR".to_string(), dec("83.00")),
            ("EUR".to_string(), dec("0.80")),
        ])
    }

    #[test]
    fn same_currency_is_returned_unchanged() {
        let price = Price::new(dec("12.34"), "BRL");
        assert_eq!(convert_price(&price, "BRL", &HashMap::new()), dec("12.34"));
    }

    #[test]
    fn pivots_through_usd() {
        let price = Price::new(dec("100"), "BRL");
        // 100 BRL = 20 USD = 16 EUR
        assert_eq!(convert_price(&price, "EUR", &rates()), dec("16"));
        assert_eq!(convert_price(&price, "USD", &rates()), dec("20"));
    }

    #[test]
    fn currency_codes_are_case_insensitive() {
        let price = Price::new(dec("10"), "usd");
        assert_eq!(convert_price(&price, "inr", &rates()), dec("830"));
    }

    #[test]
    fn missing_rate_falls_back_to_the_original_amount() {
        let price = Price::new(dec("50"), "BRL");
        assert_eq!(convert_price(&price, "JPY", &rates()), dec("50"));
    }

    #[test]
    fn zero_rate_counts_as_missing() {
        let mut table = rates();
        table.insert("JPY".into(), Decimal::ZERO);
        let price = Price::new(dec("50"), "JPY");
        assert_eq!(convert_price(&price, "BRL", &table), dec("50"));
    }

    #[test]
    fn display_price_keeps_the_origin_currency_on_fallback() {
        let price = Price::new(dec("50"), "BRL");
        let shown = display_price(&price, "JPY", &rates());
        assert_eq!(shown.base_currency, "BRL");
        assert_eq!(shown.base_amount, dec("50"));

        let shown = display_price(&price, "INR", &rates());
        assert_eq!(shown.base_currency, "INR");
        assert_eq!(shown.base_amount, dec("830.00"));
    }

    #[test]
    fn display_price_keeps_the_origin_currency_on_overflow() {
        let table = HashMap::from([
            ("BRL".to_string(), dec("0.00000001")),
            ("INR".to_string(), dec("83")),
        ]);
        let price = Price::new(dec("100000000000000000000000"), "BRL");

        let shown = display_price(&price, "INR", &table);
        assert_eq!(shown.base_currency, "BRL");
        assert_eq!(shown.base_amount, price.base_amount);
        assert_eq!(convert_price(&price, "INR", &table), price.base_amount);
    }

    const CODES: [&str; 4] = ["USD", "BRL", "INR", "EUR"];

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        #[test]
        fn converting_to_the_origin_currency_is_the_identity(
            cents in 0i64..100_000_000_000i64,
            code in 0usize..CODES.len(),
        ) {
            let price = Price::new(Decimal::new(cents, 2), CODES[code]);
            prop_assert_eq!(convert_price(&price, CODES[code], &rates()), price.base_amount);
        }

        #[test]
        fn a_round_trip_through_another_currency_returns_the_original_amount(
            cents in 0i64..100_000_000_000i64,
            rate_a in 1i64..10_000_000i64,
            rate_b in 1i64..10_000_000i64,
        ) {
            let table = HashMap::from([
                ("AAA".to_string(), Decimal::new(rate_a, 4)),
                ("BBB".to_string(), Decimal::new(rate_b, 4)),
            ]);
            let original = Price::new(Decimal::new(cents, 2), "AAA");

            let there = convert_price(&original, "BBB", &table);
            let back = convert_price(&Price::new(there, "BBB"), "AAA", &table);

            prop_assert!((back - original.base_amount).abs() <= Decimal::new(1, 6));
        }
    }
}
