//! Catalog models: categories, products, and measurement units.
//!
//! Product decoding tolerates the schema drift the backend has shipped over
//! time: prices arrive as JSON numbers, plain numeric strings, or strings
//! with a comma decimal separator, and unknown units fall back to `Piece`.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Measurement unit a product is sold in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Unit {
    Kg,
    #[default]
    Piece,
    Pack,
    Dozen,
    Liter,
    Gram,
    Pound,
}

impl Unit {
    /// Lowercase name for display ("kg", "piece", ...).
    pub fn display_name(&self) -> &'static str {
        match self {
            Unit::Kg => "kg",
            Unit::Piece => "piece",
            Unit::Pack => "pack",
            Unit::Dozen => "dozen",
            Unit::Liter => "liter",
            Unit::Gram => "gram",
            Unit::Pound => "pound",
        }
    }

    fn from_wire(value: &str) -> Self {
        match value.to_uppercase().as_str() {
            "KG" => Unit::Kg,
            "PIECE" => Unit::Piece,
            "PACK" => Unit::Pack,
            "DOZEN" => Unit::Dozen,
            "LITER" => Unit::Liter,
            "GRAM" => Unit::Gram,
            "POUND" => Unit::Pound,
            _ => Unit::Piece,
        }
    }
}

/// A catalog product as served by the `/fruits` endpoint.
///
/// The wire format is flat (`categoryId`/`categoryName`); decoding folds the
/// pair into a nested [`Category`].
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: Option<i64>,
    pub unit: Unit,
    pub category: Category,
    pub image_filename: Option<String>,
    pub image_url: Option<String>,
}

impl Product {
    pub fn stock_count(&self) -> i64 {
        self.stock.unwrap_or(0)
    }
}

#[derive(Deserialize)]
struct ProductWire {
    id: i64,
    name: String,
    #[serde(default)]
    description: Option<String>,
    price: PriceRepr,
    #[serde(default)]
    stock: Option<i64>,
    #[serde(default)]
    unit: Option<serde_json::Value>,
    #[serde(rename = "categoryId")]
    category_id: i64,
    #[serde(rename = "categoryName")]
    category_name: String,
    #[serde(rename = "imageFilename", default)]
    image_filename: Option<String>,
    #[serde(rename = "imageUrl", default)]
    image_url: Option<String>,
}

/// Raw price value before normalization.
#[derive(Deserialize)]
#[serde(untagged)]
enum PriceRepr {
    Number(serde_json::Number),
    Text(String),
}

impl PriceRepr {
    /// Normalize to an exact decimal. The fallback order is fixed: a JSON
    /// number, then a plain numeric string, then a string with a comma
    /// decimal separator ("19,99").
    fn into_decimal(self) -> Result<Decimal, String> {
        match self {
            PriceRepr::Number(number) => {
                let text = number.to_string();
                Decimal::from_str(&text)
                    .or_else(|_| Decimal::from_scientific(&text))
                    .map_err(|_| format!("price {} is out of range", text))
            }
            PriceRepr::Text(text) => {
                let trimmed = text.trim();
                if let Ok(price) = Decimal::from_str(trimmed) {
                    return Ok(price);
                }
                let normalized = trimmed.replace(',', ".");
                Decimal::from_str(&normalized).map_err(|_| {
                    format!("price string '{}' is not a recognized number format", text)
                })
            }
        }
    }
}

impl<'de> Deserialize<'de> for Product {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let wire = ProductWire::deserialize(deserializer)?;
        let price = wire.price.into_decimal().map_err(serde::de::Error::custom)?;
        let unit = match wire.unit.as_ref().and_then(|value| value.as_str()) {
            Some(text) => Unit::from_wire(text),
            None => Unit::Piece,
        };

        Ok(Product {
            id: wire.id,
            name: wire.name,
            description: wire.description,
            price,
            stock: wire.stock,
            unit,
            category: Category {
                id: wire.category_id,
                name: wire.category_name,
            },
            image_filename: wire.image_filename,
            image_url: wire.image_url,
        })
    }
}

#[derive(Serialize)]
struct ProductWireOut<'a> {
    id: i64,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    price: &'a Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    stock: Option<i64>,
    unit: Unit,
    #[serde(rename = "categoryId")]
    category_id: i64,
    #[serde(rename = "categoryName")]
    category_name: &'a str,
    #[serde(rename = "imageFilename", skip_serializing_if = "Option::is_none")]
    image_filename: Option<&'a str>,
    #[serde(rename = "imageUrl", skip_serializing_if = "Option::is_none")]
    image_url: Option<&'a str>,
}

impl Serialize for Product {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        ProductWireOut {
            id: self.id,
            name: &self.name,
            description: self.description.as_deref(),
            price: &self.price,
            stock: self.stock,
            unit: self.unit,
            category_id: self.category.id,
            category_name: &self.category.name,
            image_filename: self.image_filename.as_deref(),
            image_url: self.image_url.as_deref(),
        }
        .serialize(serializer)
    }
}
