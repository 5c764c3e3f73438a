use rust_decimal::Decimal;

use super::{
    CreateCategoryRequest, CreateItemRequest, MenuKind, PriceInput, UpdateCategoryRequest,
    UpdateItemRequest, ValidationError, ValidationResult,
};

/// Trait for validating input models against the menu they target
pub trait Validate {
    fn validate(&self, kind: MenuKind) -> ValidationResult<()>;
}

/// Validation constants
pub const MAX_NAME_LENGTH: usize = 120;
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;
pub const MAX_PRICE_LABEL_LENGTH: usize = 60;
pub const MAX_PRICES_PER_ITEM: usize = 20;
pub const MAX_IMAGE_URL_LENGTH: usize = 500;
pub const MAX_UPLOAD_BYTES: usize = 1024 * 1024;
pub const MIN_PRICE: Decimal = Decimal::from_parts(1, 0, 0, false, 2); // 0.01
pub const MAX_PRICE: Decimal = Decimal::from_parts(99999999, 0, 0, false, 2); // 999999.99

impl Validate for CreateCategoryRequest {
    fn validate(&self, kind: MenuKind) -> ValidationResult<()> {
        validate_name("name_en", &self.name_en)?;
        if kind.requires_marathi_name() {
            validate_name("name_mr", self.name_mr.as_deref().unwrap_or_default())?;
        }
        Ok(())
    }
}

impl Validate for UpdateCategoryRequest {
    fn validate(&self, _kind: MenuKind) -> ValidationResult<()> {
        if let Some(name_en) = &self.name_en {
            validate_name("name_en", name_en)?;
        }
        if let Some(name_mr) = &self.name_mr {
            validate_optional_text("name_mr", name_mr, MAX_NAME_LENGTH)?;
        }
        Ok(())
    }
}

impl Validate for CreateItemRequest {
    fn validate(&self, _kind: MenuKind) -> ValidationResult<()> {
        validate_item_fields(
            &self.category_id,
            &self.name_en,
            self.name_mr.as_deref(),
            self.description_en.as_deref(),
            self.description_mr.as_deref(),
            self.image_url.as_deref(),
            &self.prices,
        )
    }
}

impl Validate for UpdateItemRequest {
    fn validate(&self, _kind: MenuKind) -> ValidationResult<()> {
        validate_item_fields(
            &self.category_id,
            &self.name_en,
            self.name_mr.as_deref(),
            self.description_en.as_deref(),
            self.description_mr.as_deref(),
            self.image_url.as_deref(),
            &self.prices,
        )
    }
}

fn validate_item_fields(
    category_id: &str,
    name_en: &str,
    name_mr: Option<&str>,
    description_en: Option<&str>,
    description_mr: Option<&str>,
    image_url: Option<&str>,
    prices: &[PriceInput],
) -> ValidationResult<()> {
    if category_id.trim().is_empty() {
        return Err(ValidationError::RequiredField {
            field: "category_id".to_string(),
        });
    }
    validate_name("name_en", name_en)?;
    if let Some(name_mr) = name_mr {
        validate_optional_text("name_mr", name_mr, MAX_NAME_LENGTH)?;
    }
    if let Some(description) = description_en {
        validate_optional_text("description_en", description, MAX_DESCRIPTION_LENGTH)?;
    }
    if let Some(description) = description_mr {
        validate_optional_text("description_mr", description, MAX_DESCRIPTION_LENGTH)?;
    }
    if let Some(url) = image_url {
        validate_image_url(url)?;
    }
    validate_prices(prices)
}

/// Validate a required display name
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::RequiredField {
            field: field.to_string(),
        });
    }

    validate_optional_text(field, trimmed, MAX_NAME_LENGTH)?;

    if trimmed
        .chars()
        .any(|c| c.is_control() && c != '\n' && c != '\r' && c != '\t')
    {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: name.to_string(),
            reason: "Contains invalid control characters".to_string(),
        });
    }

    Ok(())
}

/// Length check for free text. Counted in characters, Marathi text is multi-byte.
pub fn validate_optional_text(field: &str, text: &str, max_length: usize) -> ValidationResult<()> {
    let length = text.trim().chars().count();
    if length > max_length {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max_length,
            actual_length: length,
        });
    }
    Ok(())
}

/// Validate the price rows of an item. Placeholder rows (amount <= 0) are skipped.
pub fn validate_prices(prices: &[PriceInput]) -> ValidationResult<()> {
    if prices.len() > MAX_PRICES_PER_ITEM {
        return Err(ValidationError::InvalidValue {
            field: "prices".to_string(),
            value: prices.len().to_string(),
            reason: format!("Too many prices, maximum allowed: {}", MAX_PRICES_PER_ITEM),
        });
    }

    for (index, price) in prices.iter().enumerate() {
        if !price.is_persistable() {
            continue;
        }
        validate_price_amount(&format!("prices[{}].amount", index), &price.amount)?;
        for label in [&price.label_en, &price.label_mr].into_iter().flatten() {
            validate_optional_text(
                &format!("prices[{}].label", index),
                label,
                MAX_PRICE_LABEL_LENGTH,
            )?;
        }
    }

    Ok(())
}

/// Validate a price amount
pub fn validate_price_amount(field: &str, amount: &Decimal) -> ValidationResult<()> {
    if *amount < MIN_PRICE || *amount > MAX_PRICE {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: MIN_PRICE.to_string(),
            max: MAX_PRICE.to_string(),
            value: amount.to_string(),
        });
    }

    // 10.500 is two decimal places once trailing zeros go
    if amount.normalize().scale() > 2 {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: amount.to_string(),
            reason: "Price cannot have more than 2 decimal places".to_string(),
        });
    }

    Ok(())
}

/// Validate an item image URL. Blank means "no image".
pub fn validate_image_url(url: &str) -> ValidationResult<()> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Ok(());
    }

    if trimmed.len() > MAX_IMAGE_URL_LENGTH {
        return Err(ValidationError::TooLong {
            field: "image_url".to_string(),
            max_length: MAX_IMAGE_URL_LENGTH,
            actual_length: trimmed.len(),
        });
    }

    if !trimmed.starts_with("https://") && !trimmed.starts_with("http://") {
        return Err(ValidationError::InvalidFormat {
            field: "image_url".to_string(),
            expected: "http(s) URL".to_string(),
        });
    }

    Ok(())
}

/// Validate an uploaded image before it is sent to object storage
pub fn validate_upload(content_type: &str, size: usize) -> ValidationResult<()> {
    if size == 0 {
        return Err(ValidationError::RequiredField {
            field: "file".to_string(),
        });
    }

    if size > MAX_UPLOAD_BYTES {
        return Err(ValidationError::OutOfRange {
            field: "file".to_string(),
            min: "1".to_string(),
            max: MAX_UPLOAD_BYTES.to_string(),
            value: size.to_string(),
        });
    }

    if !content_type.starts_with("image/") {
        return Err(ValidationError::InvalidFormat {
            field: "file".to_string(),
            expected: "image/* content type".to_string(),
        });
    }

    Ok(())
}
