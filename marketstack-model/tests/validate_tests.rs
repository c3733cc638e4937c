use marketstack_model::validate::{self, MAX_CHANGE_REASON_LEN, MAX_DESCRIPTION_LEN, MAX_PRODUCT_NAME_LEN};
use marketstack_model::ValidationError;

#[test]
fn product_name_rules() {
    assert!(validate::product_name("Air Max").is_ok());
    assert_eq!(
        validate::product_name("  "),
        Err(ValidationError::Empty { field: "product name" })
    );
    assert!(validate::product_name("a,b").is_err());
    assert!(validate::product_name("a\nb").is_err());
    let long = "x".repeat(MAX_PRODUCT_NAME_LEN + 1);
    assert!(matches!(
        validate::product_name(&long),
        Err(ValidationError::TooLong { len, max, .. }) if len == MAX_PRODUCT_NAME_LEN + 1 && max == MAX_PRODUCT_NAME_LEN
    ));
}

#[test]
fn description_may_be_empty() {
    assert!(validate::description("").is_ok());
    assert!(validate::description(&"d".repeat(MAX_DESCRIPTION_LEN)).is_ok());
    assert!(validate::description(&"d".repeat(MAX_DESCRIPTION_LEN + 1)).is_err());
    assert!(validate::description("cheap, cheerful").is_err());
}

#[test]
fn store_and_seller_rules() {
    assert!(validate::store_name("Nike").is_ok());
    assert!(validate::store_name("").is_err());
    assert!(validate::store_name("Nike\r").is_err());
    assert!(validate::seller_id("a@x.com").is_ok());
    assert!(validate::seller_id("a@x.com,b").is_err());
}

#[test]
fn quantity_parsing() {
    assert_eq!(validate::quantity(" 12 "), Ok(12));
    assert!(matches!(validate::quantity("-1"), Err(ValidationError::InvalidQuantity(_))));
    assert!(validate::quantity("1.5").is_err());
}

#[test]
fn change_reason_truncates() {
    assert_eq!(validate::change_reason("  "), None);
    assert_eq!(validate::change_reason(" sale "), Some("sale".to_string()));
    let long = "r".repeat(MAX_CHANGE_REASON_LEN + 30);
    assert_eq!(
        validate::change_reason(&long).map(|r| r.chars().count()),
        Some(MAX_CHANGE_REASON_LEN)
    );
}

#[test]
fn error_messages_name_the_field() {
    let err = validate::store_name("a,b").unwrap_err();
    assert!(err.to_string().contains("store name"));
}
