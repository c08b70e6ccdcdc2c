//! Lightweight input validation helpers. Keep logic minimal and deterministic.

use crate::{CoreError, Product, MAX_AMOUNT};

/// Validate a product before it is written through the service.
pub fn validate_product(p: &Product) -> Result<(), CoreError> {
    validate_text("name", p.name())?;
    validate_text("category", p.category())?;
    validate_amount("price", p.price())?;
    validate_amount("quantity_in_stock", p.quantity_in_stock())?;
    Ok(())
}

fn validate_text(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::InvalidProduct(format!("{field} is empty")));
    }
    Ok(())
}

/// Prices and quantities must be finite, non-negative and at most
/// [`MAX_AMOUNT`].
pub fn validate_amount(field: &str, value: f64) -> Result<(), CoreError> {
    if !value.is_finite() {
        return Err(CoreError::InvalidProduct(format!("{field} is not a number")));
    }
    if value < 0.0 {
        return Err(CoreError::InvalidProduct(format!("{field} is negative")));
    }
    if value > MAX_AMOUNT {
        return Err(CoreError::InvalidProduct(format!(
            "{field} exceeds {MAX_AMOUNT}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_regular_product() {
        let p = Product::new(1, "widget", "", "tools", 9.99, 3.0);
        assert!(validate_product(&p).is_ok());
    }

    #[test]
    fn rejects_blank_name_and_category() {
        let p = Product::new(1, "  ", "", "tools", 1.0, 1.0);
        assert!(matches!(validate_product(&p), Err(CoreError::InvalidProduct(_))));
        let p = Product::new(1, "widget", "", "", 1.0, 1.0);
        assert!(matches!(validate_product(&p), Err(CoreError::InvalidProduct(_))));
    }

    #[test]
    fn amount_rules() {
        assert!(validate_amount("price", 0.0).is_ok());
        assert!(validate_amount("price", -0.01).is_err());
        assert!(validate_amount("price", f64::NAN).is_err());
        assert!(validate_amount("price", f64::INFINITY).is_err());
        assert!(validate_amount("price", MAX_AMOUNT).is_ok());
        assert!(validate_amount("price", 1.0e17).is_err());
    }
}
