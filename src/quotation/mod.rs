//! Sales quotation operations.
//!
//! A typed create, and the composite that creates a quotation and then reads
//! back the business partner it was raised for.

pub mod types;

pub use types::{QuotationLine, SalesQuotation};

use crate::error::GatewayError;
use crate::proxy::{Composite, CompositeResult, Forward, ProxyRequest};
use crate::upstream::UpstreamResponse;

pub const QUOTATION_RESOURCE: &str = "SalesQuotation";

/// Business partner lookup by key. Quotes in the key are doubled per OData.
pub fn business_partner_path(card_code: &str) -> String {
    format!("BusinessPartners('{}')", card_code.replace('\'', "''"))
}

fn checked(quotation: &SalesQuotation) -> Result<(), GatewayError> {
    quotation.validate().map_err(|errors| {
        GatewayError::Validation(format!("Invalid quotation data: {}", errors.join("; ")))
    })
}

/// Validate and create one quotation. The upstream response is returned as-is.
pub async fn create_quotation<F>(forwarder: &F, quotation: &SalesQuotation) -> Result<UpstreamResponse, GatewayError>
where
    F: Forward + ?Sized,
{
    checked(quotation)?;
    tracing::info!(card_code = %quotation.card_code, "Creating sales quotation");
    let request = ProxyRequest::post_json(QUOTATION_RESOURCE, quotation)?;
    forwarder.forward(&request).await
}

/// Create a quotation, then fetch its business partner.
///
/// The result holds the steps `quotation` and `businessPartner`.
pub async fn create_quotation_with_partner<F>(
    forwarder: &F,
    quotation: SalesQuotation,
) -> Result<CompositeResult, GatewayError>
where
    F: Forward + ?Sized,
{
    checked(&quotation)?;
    tracing::info!(
        card_code = %quotation.card_code,
        "Creating sales quotation and fetching business partner"
    );

    let partner_path = business_partner_path(&quotation.card_code);
    Composite::new()
        .step("quotation", move |_| ProxyRequest::post_json(QUOTATION_RESOURCE, &quotation))
        .step("businessPartner", move |_| ProxyRequest::get(partner_path.clone()))
        .run(forwarder)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partner_path_escapes_quotes() {
        assert_eq!(business_partner_path("C001"), "BusinessPartners('C001')");
        assert_eq!(business_partner_path("O'Neil"), "BusinessPartners('O''Neil')");
    }
}
