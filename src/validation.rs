//! Field rules shared by the HTTP handlers and the client, so a form that
//! fails here never reaches the network.

use std::{borrow::Cow, str::FromStr};

use rust_decimal::Decimal;
use validator::{ValidationError, ValidationErrors};

use crate::dto::{
    categories::{CategoryFields, CategoryPatch, CategoryRequest, NumberInput},
    products::{ProductFields, ProductInput},
};

pub const NAME_MAX_CHARS: usize = 255;
pub const PRIORITY_MIN: i32 = 1;
pub const PRIORITY_MAX: i32 = 10;

pub const PRODUCT_NAME_REQUIRED: &str = "Product name is required";
pub const PRICE_INVALID: &str = "Enter a valid price";
pub const DESCRIPTION_REQUIRED: &str = "Description is required";
pub const CATEGORY_NAME_REQUIRED: &str = "Category name is required";
pub const PRIORITY_INVALID: &str = "Enter a valid priority number (1-10)";
pub const PRIORITY_OUT_OF_RANGE: &str = "Priority must be between 1-10";

fn error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

/// Rejects empty and whitespace-only strings.
pub fn required_name(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error("required", "Name is required"));
    }
    Ok(())
}

fn name_rule(
    errors: &mut ValidationErrors,
    raw: Option<&str>,
    required_message: &'static str,
    subject: &'static str,
) -> Option<String> {
    let name = raw.map(str::trim).unwrap_or_default();
    if name.is_empty() {
        errors.add("name", error("required", required_message));
        return None;
    }
    if name.chars().count() > NAME_MAX_CHARS {
        errors.add(
            "name",
            error(
                "max",
                format!("{subject} name may not be greater than {NAME_MAX_CHARS} characters"),
            ),
        );
        return None;
    }
    Some(name.to_string())
}

/// Largest value a NUMERIC(12, 2) column holds.
pub fn price_max() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

pub fn parse_price(raw: Option<&str>) -> Result<Decimal, ValidationError> {
    let invalid = || error("numeric", PRICE_INVALID);
    let raw = raw.map(str::trim).filter(|s| !s.is_empty()).ok_or_else(invalid)?;
    let price = Decimal::from_str(raw)
        .map_err(|_| invalid())?
        .round_dp(2);
    if price <= Decimal::ZERO || price > price_max() {
        return Err(invalid());
    }
    Ok(price)
}

pub fn parse_priority(raw: Option<&NumberInput>) -> Result<i32, ValidationError> {
    let invalid = || error("integer", PRIORITY_INVALID);
    let value = raw.and_then(NumberInput::as_i64).ok_or_else(invalid)?;
    if value < i64::from(PRIORITY_MIN) {
        return Err(invalid());
    }
    if value > i64::from(PRIORITY_MAX) {
        return Err(error("between", PRIORITY_OUT_OF_RANGE));
    }
    i32::try_from(value).map_err(|_| invalid())
}

/// Validate the text fields of a product form. Errors are added to `errors`
/// so callers can fold in the photo check before reporting.
pub fn product_fields(input: &ProductInput, errors: &mut ValidationErrors) -> Option<ProductFields> {
    let name = name_rule(errors, input.name.as_deref(), PRODUCT_NAME_REQUIRED, "Product");
    let price = match parse_price(input.price.as_deref()) {
        Ok(price) => Some(price),
        Err(err) => {
            errors.add("price", err);
            None
        }
    };
    let description = input.description.as_ref().map(|d| {
        let trimmed = d.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    Some(ProductFields {
        name: name?,
        price: price?,
        description,
    })
}

pub fn check_product(input: &ProductInput) -> Result<ProductFields, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    match product_fields(input, &mut errors) {
        Some(fields) if errors.is_empty() => Ok(fields),
        _ => Err(errors),
    }
}

/// The admin forms also insist on a description, which the API itself treats as optional.
pub fn check_product_form(input: &ProductInput) -> Result<ProductFields, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let fields = product_fields(input, &mut errors);
    if input.description.as_deref().map(str::trim).unwrap_or_default().is_empty() {
        errors.add("description", error("required", DESCRIPTION_REQUIRED));
    }
    match fields {
        Some(fields) if errors.is_empty() => Ok(fields),
        _ => Err(errors),
    }
}

pub fn check_new_category(input: &CategoryRequest) -> Result<CategoryFields, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let name = name_rule(&mut errors, input.name.as_deref(), CATEGORY_NAME_REQUIRED, "Category");
    let priority = match parse_priority(input.priority.as_ref()) {
        Ok(priority) => Some(priority),
        Err(err) => {
            errors.add("priority", err);
            None
        }
    };
    match (name, priority) {
        (Some(name), Some(priority)) if errors.is_empty() => Ok(CategoryFields { name, priority }),
        _ => Err(errors),
    }
}

/// Partial update: only the fields that are present are checked.
pub fn check_category_patch(input: &CategoryRequest) -> Result<CategoryPatch, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let name = input
        .name
        .as_deref()
        .and_then(|raw| name_rule(&mut errors, Some(raw), CATEGORY_NAME_REQUIRED, "Category"));
    let priority = match input.priority.as_ref() {
        Some(raw) => match parse_priority(Some(raw)) {
            Ok(priority) => Some(priority),
            Err(err) => {
                errors.add("priority", err);
                None
            }
        },
        None => None,
    };
    if errors.is_empty() {
        Ok(CategoryPatch { name, priority })
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::field_messages;

    fn product(name: &str, price: &str, description: Option<&str>) -> ProductInput {
        ProductInput {
            name: Some(name.to_string()),
            price: Some(price.to_string()),
            description: description.map(str::to_string),
        }
    }

    fn category(name: Option<&str>, priority: Option<NumberInput>) -> CategoryRequest {
        CategoryRequest {
            name: name.map(str::to_string),
            priority,
        }
    }

    #[test]
    fn valid_product_is_trimmed_and_rounded() {
        let fields = check_product(&product("  Ferris Mug ", "12.499", Some(" mug "))).unwrap();
        assert_eq!(fields.name, "Ferris Mug");
        assert_eq!(fields.price, Decimal::new(1250, 2));
        assert_eq!(fields.description, Some(Some("mug".to_string())));
    }

    #[test]
    fn blank_description_clears_it() {
        let fields = check_product(&product("Mug", "1", Some("   "))).unwrap();
        assert_eq!(fields.description, Some(None));
        let fields = check_product(&product("Mug", "1", None)).unwrap();
        assert_eq!(fields.description, None);
    }

    #[test]
    fn empty_name_and_bad_price_are_both_reported() {
        let errors = check_product(&product("   ", "abc", None)).unwrap_err();
        let messages = field_messages(&errors);
        assert_eq!(messages["name"], vec![PRODUCT_NAME_REQUIRED.to_string()]);
        assert_eq!(messages["price"], vec![PRICE_INVALID.to_string()]);
    }

    #[test]
    fn non_positive_prices_are_rejected() {
        for raw in ["0", "-1", "", "99999999999", "0.004", "0.005"] {
            assert!(parse_price(Some(raw)).is_err(), "{raw} should be rejected");
        }
        assert!(parse_price(None).is_err());
    }

    #[test]
    fn long_names_are_rejected() {
        let long = "x".repeat(NAME_MAX_CHARS + 1);
        let errors = check_product(&product(&long, "1", None)).unwrap_err();
        assert_eq!(
            field_messages(&errors)["name"],
            vec!["Product name may not be greater than 255 characters".to_string()]
        );
    }

    #[test]
    fn admin_form_requires_description() {
        let errors = check_product_form(&product("Mug", "1", Some(" "))).unwrap_err();
        assert_eq!(
            field_messages(&errors)["description"],
            vec![DESCRIPTION_REQUIRED.to_string()]
        );
    }

    #[test]
    fn category_priority_range() {
        let ok = check_new_category(&category(Some("Tools"), Some(NumberInput::Text("3".into()))))
            .unwrap();
        assert_eq!(ok.priority, 3);

        let too_high = check_new_category(&category(Some("Tools"), Some(NumberInput::Text("11".into()))))
            .unwrap_err();
        assert_eq!(
            field_messages(&too_high)["priority"],
            vec![PRIORITY_OUT_OF_RANGE.to_string()]
        );

        for raw in ["0", "-2", "abc", "2.5"] {
            let errors = check_new_category(&category(Some("Tools"), Some(NumberInput::Text(raw.into()))))
                .unwrap_err();
            assert_eq!(
                field_messages(&errors)["priority"],
                vec![PRIORITY_INVALID.to_string()],
                "{raw}"
            );
        }

        let missing = check_new_category(&category(None, None)).unwrap_err();
        let messages = field_messages(&missing);
        assert_eq!(messages["name"], vec![CATEGORY_NAME_REQUIRED.to_string()]);
        assert_eq!(messages["priority"], vec![PRIORITY_INVALID.to_string()]);
    }

    #[test]
    fn category_patch_checks_only_present_fields() {
        let patch = check_category_patch(&category(None, Some(NumberInput::Text("7".into())))).unwrap();
        assert_eq!(patch.name, None);
        assert_eq!(patch.priority, Some(7));

        let errors = check_category_patch(&category(Some(" "), None)).unwrap_err();
        assert!(field_messages(&errors).contains_key("name"));
    }
}
