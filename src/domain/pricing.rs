//! Custom bouquet pricing.

use std::collections::HashMap;

use thiserror::Error;
use uuid::Uuid;

use florista_api_types::{FlowerView, QuoteItem, QuoteLine, QuoteResponse};

const MAX_STEMS_PER_LINE: u32 = 500;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("a custom bouquet needs at least one flower")]
    Empty,
    #[error("flower `{0}` does not exist")]
    UnknownFlower(Uuid),
    #[error("flower `{0}` is out of stock")]
    OutOfStock(Uuid),
    #[error("quantity for flower `{flower_id}` must be between 1 and {max}")]
    InvalidQuantity { flower_id: Uuid, max: u32 },
    #[error("quote total exceeds the representable amount")]
    Overflow,
}

/// Price a custom bouquet against the current flower catalog.
///
/// Lines keep the order of `items`; repeated flowers are priced per line.
pub fn quote_custom_bouquet(
    items: &[QuoteItem],
    flowers: &[FlowerView],
) -> Result<QuoteResponse, PricingError> {
    if items.is_empty() {
        return Err(PricingError::Empty);
    }

    let by_id: HashMap<Uuid, &FlowerView> = flowers.iter().map(|f| (f.id, f)).collect();

    let lines = items
        .iter()
        .map(|item| {
            let flower = by_id
                .get(&item.flower_id)
                .ok_or(PricingError::UnknownFlower(item.flower_id))?;
            if !flower.in_stock {
                return Err(PricingError::OutOfStock(flower.id));
            }
            if item.quantity == 0 || item.quantity > MAX_STEMS_PER_LINE {
                return Err(PricingError::InvalidQuantity {
                    flower_id: flower.id,
                    max: MAX_STEMS_PER_LINE,
                });
            }
            Ok(QuoteLine {
                flower_id: flower.id,
                name: flower.name.clone(),
                quantity: item.quantity,
                unit_price_cents: flower.price_cents,
                line_total_cents: flower
                    .price_cents
                    .checked_mul(i64::from(item.quantity))
                    .ok_or(PricingError::Overflow)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let total_cents = lines
        .iter()
        .try_fold(0i64, |total, line| total.checked_add(line.line_total_cents))
        .ok_or(PricingError::Overflow)?;

    Ok(QuoteResponse { lines, total_cents })
}
