//! Catalog line codec.
//!
//! A line is comma-delimited with no quoting. Field counting follows the
//! rule the catalog has always used: trailing empty fields are dropped
//! before counting, so `seller,store,` has two fields.
//!
//! | fields | format                                   |
//! |--------|------------------------------------------|
//! | blank  | [`LineFormat::Blank`]                    |
//! | `< 7`  | [`LineFormat::Incomplete`] (no products) |
//! | `7`    | [`LineFormat::Legacy`] (one 5-field group) |
//! | `>= 8` | [`LineFormat::Current`] (6-field groups) |

use marketstack_model::{validate, Price, ProductRecord, SellerRecord, StoreRecord};
use marketstack_types::Category;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// Fields before the first product group: seller and store.
pub const HEADER_WIDTH: usize = 2;

/// Fields per product group in legacy lines.
pub const LEGACY_GROUP_WIDTH: usize = 5;

/// Fields per product group in current lines.
pub const GROUP_WIDTH: usize = 6;

/// Smallest field count that carries a product.
const MIN_PRODUCT_FIELDS: usize = HEADER_WIDTH + LEGACY_GROUP_WIDTH;

/// How a line is laid out, judged by its field count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineFormat {
    /// Empty or whitespace only.
    Blank,
    /// Seller-only or seller+store line without products.
    Incomplete,
    /// Exactly one 5-field product group.
    Legacy,
    /// 6-field product groups.
    Current,
}

impl LineFormat {
    /// Whether the line counts as legacy for migration purposes.
    #[must_use]
    pub const fn is_legacy(&self) -> bool {
        matches!(self, LineFormat::Incomplete | LineFormat::Legacy)
    }
}

/// Seller and store named at the start of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineHeader {
    /// Seller identifier. Empty for the sentinel seller.
    pub seller: String,
    /// Store name, absent on seller-only lines.
    pub store: Option<String>,
}

/// Why a product group was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupError {
    #[error("expected {expected} fields, found {found}")]
    Incomplete { expected: usize, found: usize },

    #[error("invalid quantity {0:?}")]
    InvalidQuantity(String),

    #[error("invalid price {0:?}")]
    InvalidPrice(String),

    #[error("empty product name")]
    EmptyName,
}

/// A product group that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedGroup {
    /// Zero-based index of the group within the line.
    pub position: usize,
    /// The group's raw fields, re-joined.
    pub text: String,
    pub error: GroupError,
}

/// A line whose field count fits both layouts.
///
/// Two or more legacy groups produce 12, 17, ... fields, which field counting
/// reads as current format. Such lines are reported, never rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatAmbiguity {
    pub field_count: usize,
    /// How many 5-field groups the product section divides into.
    pub legacy_groups: usize,
}

/// Everything [`decode_line_detailed`] learns from one line.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedLine {
    pub format: LineFormat,
    /// `None` for blank lines.
    pub header: Option<LineHeader>,
    pub products: Vec<ProductRecord>,
    pub malformed: Vec<MalformedGroup>,
    pub ambiguity: Option<FormatAmbiguity>,
}

/// Splits a line on the delimiter, dropping trailing empty fields.
/// A trailing `\r` is not part of any field.
#[must_use]
pub fn split_fields(line: &str) -> Vec<&str> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let mut fields: Vec<&str> = line.split(validate::DELIMITER).collect();
    while fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    fields
}

/// Number of fields in `line`, after dropping trailing empty fields.
#[must_use]
pub fn field_count(line: &str) -> usize {
    split_fields(line).len()
}

/// Classifies a line by field count.
#[must_use]
pub fn detect_format(line: &str) -> LineFormat {
    if line.trim().is_empty() {
        return LineFormat::Blank;
    }
    match field_count(line) {
        n if n < MIN_PRODUCT_FIELDS => LineFormat::Incomplete,
        MIN_PRODUCT_FIELDS => LineFormat::Legacy,
        _ => LineFormat::Current,
    }
}

/// True iff the line is non-blank and has fewer than 8 fields.
#[must_use]
pub fn is_legacy_format(line: &str) -> bool {
    detect_format(line).is_legacy()
}

/// Reads the seller and store at the start of a line. `None` for blank lines.
#[must_use]
pub fn header(line: &str) -> Option<LineHeader> {
    if line.trim().is_empty() {
        return None;
    }
    let fields = split_fields(line);
    let seller = fields.first().map(|s| s.trim().to_string()).unwrap_or_default();
    let store = fields
        .get(1)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    Some(LineHeader { seller, store })
}

/// Flags lines that a reader could take for either layout.
///
/// A line is ambiguous when it has at least 8 fields, its product section
/// splits evenly into 5-field groups, and the 6-field reading does not end
/// every group in a known category tag.
#[must_use]
pub fn ambiguity(line: &str) -> Option<FormatAmbiguity> {
    if detect_format(line) != LineFormat::Current {
        return None;
    }
    let fields = split_fields(line);
    let body = &fields[HEADER_WIDTH..];
    if body.len() % LEGACY_GROUP_WIDTH != 0 {
        return None;
    }
    let reads_as_current = body.len() % GROUP_WIDTH == 0
        && body
            .chunks(GROUP_WIDTH)
            .all(|group| Category::from_tag(group[GROUP_WIDTH - 1]).is_some());
    if reads_as_current {
        return None;
    }
    Some(FormatAmbiguity {
        field_count: fields.len(),
        legacy_groups: body.len() / LEGACY_GROUP_WIDTH,
    })
}

/// Maps a category tag onto the closed set, falling back to the legacy
/// default for unknown or blank tags.
#[must_use]
pub fn parse_category(tag: &str) -> Category {
    Category::parse_or_default(tag)
}

/// Parses one product group. Legacy groups have no category field.
pub fn decode_group(fields: &[&str]) -> Result<ProductRecord, GroupError> {
    let width = if fields.len() == LEGACY_GROUP_WIDTH {
        LEGACY_GROUP_WIDTH
    } else {
        GROUP_WIDTH
    };
    if fields.len() != width {
        return Err(GroupError::Incomplete {
            expected: GROUP_WIDTH,
            found: fields.len(),
        });
    }

    let name = fields[0].trim();
    if name.is_empty() {
        return Err(GroupError::EmptyName);
    }
    let quantity = validate::quantity(fields[1])
        .map_err(|_| GroupError::InvalidQuantity(fields[1].trim().to_string()))?;
    let price = Price::parse(fields[2])
        .map_err(|_| GroupError::InvalidPrice(fields[2].trim().to_string()))?;
    let category = match fields.get(5) {
        Some(tag) => parse_category(tag),
        None => Category::LEGACY_DEFAULT,
    };

    Ok(ProductRecord::new(name, quantity, price, fields[3], fields[4], category))
}

/// Decodes a line, reporting skipped groups instead of logging them.
#[must_use]
pub fn decode_line_detailed(line: &str) -> DecodedLine {
    let format = detect_format(line);
    let mut decoded = DecodedLine {
        format,
        header: header(line),
        products: Vec::new(),
        malformed: Vec::new(),
        ambiguity: ambiguity(line),
    };

    let width = match format {
        LineFormat::Blank | LineFormat::Incomplete => return decoded,
        LineFormat::Legacy => LEGACY_GROUP_WIDTH,
        LineFormat::Current => GROUP_WIDTH,
    };

    let fields = split_fields(line);
    for (position, group) in fields[HEADER_WIDTH..].chunks(width).enumerate() {
        let result = if group.len() == width {
            decode_group(group)
        } else {
            Err(GroupError::Incomplete {
                expected: width,
                found: group.len(),
            })
        };
        match result {
            Ok(product) => decoded.products.push(product),
            Err(error) => decoded.malformed.push(MalformedGroup {
                position,
                text: group.join(","),
                error,
            }),
        }
    }
    decoded
}

/// Decodes the products embedded in a line.
///
/// Groups that cannot be decoded are skipped with a warning. Lines with
/// fewer than 7 fields yield nothing.
#[must_use]
pub fn decode_line(line: &str) -> Vec<ProductRecord> {
    let decoded = decode_line_detailed(line);
    if let Some(amb) = &decoded.ambiguity {
        warn!(
            "Line with {} fields also reads as {} legacy product groups; decoding as current format",
            amb.field_count, amb.legacy_groups
        );
    }
    for group in &decoded.malformed {
        warn!(
            "Skipping product group {} ({}): {}",
            group.position, group.text, group.error
        );
    }
    decoded.products
}

/// Canonical 6-field form of a product.
#[must_use]
pub fn encode_product(record: &ProductRecord) -> String {
    format!(
        "{},{},{},{},{},{}",
        record.name,
        record.quantity,
        record.price,
        record.description,
        record.store_name,
        record.category.as_tag()
    )
}

/// The single line representing `store` for `seller_id`.
///
/// Stores without products keep a trailing delimiter: `seller,store,`.
#[must_use]
pub fn encode_store_line(seller_id: &str, store: &StoreRecord) -> String {
    if store.is_empty() {
        return format!("{seller_id},{},", store.name());
    }
    let mut line = format!("{seller_id},{}", store.name());
    for product in store.products() {
        line.push(',');
        line.push_str(&encode_product(product));
    }
    line
}

/// Seller-only line: `seller,`.
#[must_use]
pub fn encode_seller_line(seller_id: &str) -> String {
    format!("{seller_id},")
}

/// Every line needed to represent `seller`.
///
/// Sellers without stores get a seller-only line.
#[must_use]
pub fn encode_seller(seller: &SellerRecord) -> Vec<String> {
    if seller.stores().is_empty() {
        return vec![encode_seller_line(seller.id())];
    }
    seller
        .stores()
        .iter()
        .map(|store| encode_store_line(seller.id(), store))
        .collect()
}
