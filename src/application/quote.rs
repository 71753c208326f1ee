use thiserror::Error;

use florista_api_types::{QuoteRequest, QuoteResponse};

use crate::application::catalog::{CatalogError, CatalogService};
use crate::domain::pricing::{PricingError, quote_custom_bouquet};

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Prices custom bouquets against the cached flower list.
#[derive(Clone)]
pub struct QuoteService {
    catalog: CatalogService,
}

impl QuoteService {
    pub fn new(catalog: CatalogService) -> Self {
        Self { catalog }
    }

    pub async fn quote(&self, request: &QuoteRequest) -> Result<QuoteResponse, QuoteError> {
        if request.items.is_empty() {
            return Err(PricingError::Empty.into());
        }
        let flowers = self.catalog.flowers().await?;
        Ok(quote_custom_bouquet(&request.items, &flowers)?)
    }
}
