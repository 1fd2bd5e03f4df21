//! Order history and checkout models.
//!
//! Older backend deployments called products "fruits" on the wire, so order
//! items and checkout lines accept `fruitId`/`fruitName` wherever
//! `productId`/`productName` are absent, and encode both spellings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Option<i64>,
    #[serde(rename = "customerName", default)]
    pub customer_name: Option<String>,
    #[serde(rename = "shippingAddress", default)]
    pub shipping_address: Option<String>,
    #[serde(rename = "orderDate", default)]
    pub order_date: Option<String>,
    #[serde(rename = "totalAmount")]
    pub total_amount: Decimal,
    #[serde(default)]
    pub items: Option<Vec<OrderItem>>,
    #[serde(rename = "userId", default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Placed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

/// One line of a placed order, with the price the backend charged.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub id: i64,
    pub quantity: u32,
    pub price: Decimal,
    pub product_id: i64,
    pub product_name: String,
}

#[derive(Deserialize)]
struct OrderItemWire {
    id: i64,
    quantity: u32,
    price: Decimal,
    #[serde(rename = "productId", default)]
    product_id: Option<i64>,
    #[serde(rename = "productName", default)]
    product_name: Option<String>,
    #[serde(rename = "fruitId", default)]
    fruit_id: Option<i64>,
    #[serde(rename = "fruitName", default)]
    fruit_name: Option<String>,
}

impl<'de> Deserialize<'de> for OrderItem {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let wire = OrderItemWire::deserialize(deserializer)?;
        let product_id = wire
            .product_id
            .or(wire.fruit_id)
            .ok_or_else(|| serde::de::Error::missing_field("productId"))?;
        let product_name = wire
            .product_name
            .or(wire.fruit_name)
            .ok_or_else(|| serde::de::Error::missing_field("productName"))?;

        Ok(OrderItem {
            id: wire.id,
            quantity: wire.quantity,
            price: wire.price,
            product_id,
            product_name,
        })
    }
}

#[derive(Serialize)]
struct OrderItemWireOut<'a> {
    id: i64,
    quantity: u32,
    price: &'a Decimal,
    #[serde(rename = "productId")]
    product_id: i64,
    #[serde(rename = "productName")]
    product_name: &'a str,
    #[serde(rename = "fruitId")]
    fruit_id: i64,
    #[serde(rename = "fruitName")]
    fruit_name: &'a str,
}

impl Serialize for OrderItem {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        OrderItemWireOut {
            id: self.id,
            quantity: self.quantity,
            price: &self.price,
            product_id: self.product_id,
            product_name: &self.product_name,
            fruit_id: self.product_id,
            fruit_name: &self.product_name,
        }
        .serialize(serializer)
    }
}

/// Checkout line: product id and quantity only. The backend re-prices
/// authoritatively at order time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartItemDto {
    pub product_id: i64,
    pub quantity: u32,
}

impl CartItemDto {
    pub fn new(product_id: i64, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

#[derive(Deserialize)]
struct CartItemDtoWire {
    quantity: u32,
    #[serde(rename = "productId", default)]
    product_id: Option<i64>,
    #[serde(rename = "fruitId", default)]
    fruit_id: Option<i64>,
}

impl<'de> Deserialize<'de> for CartItemDto {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let wire = CartItemDtoWire::deserialize(deserializer)?;
        let product_id = wire
            .product_id
            .or(wire.fruit_id)
            .ok_or_else(|| serde::de::Error::missing_field("productId"))?;

        Ok(CartItemDto {
            product_id,
            quantity: wire.quantity,
        })
    }
}

#[derive(Serialize)]
struct CartItemDtoWireOut {
    quantity: u32,
    #[serde(rename = "productId")]
    product_id: i64,
    #[serde(rename = "fruitId")]
    fruit_id: i64,
}

impl Serialize for CartItemDto {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        CartItemDtoWireOut {
            quantity: self.quantity,
            product_id: self.product_id,
            fruit_id: self.product_id,
        }
        .serialize(serializer)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    #[serde(rename = "cartItems")]
    pub cart_items: Vec<CartItemDto>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn order_item_prefers_product_keys() {
        let item: OrderItem = serde_json::from_value(serde_json::json!({
            "id": 1, "quantity": 2, "price": "3.50",
            "productId": 9, "productName": "Apple",
            "fruitId": 4, "fruitName": "Legacy"
        }))
        .unwrap();
        assert_eq!(item.product_id, 9);
        assert_eq!(item.product_name, "Apple");
    }

    #[test]
    fn order_item_falls_back_to_legacy_keys() {
        let item: OrderItem = serde_json::from_value(serde_json::json!({
            "id": 1, "quantity": 2, "price": 3.5,
            "fruitId": 4, "fruitName": "Banana"
        }))
        .unwrap();
        assert_eq!(item.product_id, 4);
        assert_eq!(item.product_name, "Banana");
        assert_eq!(item.price, Decimal::from_str("3.5").unwrap());
    }

    #[test]
    fn order_item_without_any_id_fails() {
        let result: Result<OrderItem, _> = serde_json::from_value(serde_json::json!({
            "id": 1, "quantity": 2, "price": 3.5, "productName": "Apple"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn order_item_encodes_both_key_generations() {
        let item = OrderItem {
            id: 1,
            quantity: 2,
            price: Decimal::from_str("3.50").unwrap(),
            product_id: 9,
            product_name: "Apple".into(),
        };
        let encoded = serde_json::to_value(&item).unwrap();
        assert_eq!(encoded["productId"], 9);
        assert_eq!(encoded["fruitId"], 9);
        assert_eq!(encoded["productName"], "Apple");
        assert_eq!(encoded["fruitName"], "Apple");
    }

    #[test]
    fn cart_item_dto_encodes_both_id_keys() {
        let encoded = serde_json::to_value(CartItemDto::new(5, 3)).unwrap();
        assert_eq!(encoded["productId"], 5);
        assert_eq!(encoded["fruitId"], 5);
        assert_eq!(encoded["quantity"], 3);
    }

    #[test]
    fn cart_item_dto_decodes_legacy_id() {
        let dto: CartItemDto =
            serde_json::from_value(serde_json::json!({"fruitId": 5, "quantity": 3})).unwrap();
        assert_eq!(dto, CartItemDto::new(5, 3));
    }
}
