use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;
use std::time::Duration;

/// Placeholder substituted with the simulated user's id inside body strings.
pub const USER_PLACEHOLDER: &str = "{user}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named HTTP request template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<Map<String, Value>>,
    pub weight: u32,
}

impl Operation {
    pub fn get(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method: HttpMethod::Get,
            path: path.into(),
            body: None,
            weight: 1,
        }
    }

    pub fn post(name: impl Into<String>, path: impl Into<String>, body: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            method: HttpMethod::Post,
            path: path.into(),
            body: Some(body),
            weight: 1,
        }
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    /// Body with every `{user}` placeholder replaced by `user_id`.
    pub fn render_body(&self, user_id: usize) -> Option<Value> {
        self.body.as_ref().map(|body| {
            let rendered = body
                .iter()
                .map(|(key, value)| (key.clone(), render_value(value, user_id)))
                .collect();
            Value::Object(rendered)
        })
    }
}

fn render_value(value: &Value, user_id: usize) -> Value {
    match value {
        Value::String(text) if text.contains(USER_PLACEHOLDER) => {
            Value::String(text.replace(USER_PLACEHOLDER, &user_id.to_string()))
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| render_value(v, user_id)).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), render_value(v, user_id)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Which field names the stock in an order payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OrderSchema {
    #[default]
    Company,
    Symbol,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderTicket {
    pub quantity: u32,
    pub order_type: String,
    pub total_amount: Number,
    pub unit_price: Number,
    pub transaction_type: String,
}

impl Default for OrderTicket {
    fn default() -> Self {
        Self {
            quantity: 10,
            order_type: "market".to_string(),
            total_amount: Number::from(1000),
            unit_price: Number::from(100),
            transaction_type: "buy".to_string(),
        }
    }
}

impl OrderTicket {
    pub fn to_body(&self, schema: OrderSchema, symbol: &str) -> Map<String, Value> {
        let key = match schema {
            OrderSchema::Company => "company",
            OrderSchema::Symbol => "symbol",
        };

        let mut body = Map::new();
        body.insert(key.to_string(), Value::String(symbol.to_string()));
        body.insert("quantity".to_string(), Value::from(self.quantity));
        body.insert("orderType".to_string(), Value::String(self.order_type.clone()));
        body.insert("totalAmount".to_string(), Value::Number(self.total_amount.clone()));
        body.insert("unitPrice".to_string(), Value::Number(self.unit_price.clone()));
        body.insert(
            "transactionType".to_string(),
            Value::String(self.transaction_type.clone()),
        );
        body
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: "loadtest-{user}".to_string(),
            email: "loadtest-{user}@example.com".to_string(),
            password: "loadtest-password".to_string(),
        }
    }
}

impl Credentials {
    pub fn to_body(&self) -> Map<String, Value> {
        let mut body = Map::new();
        body.insert("username".to_string(), Value::String(self.username.clone()));
        body.insert("email".to_string(), Value::String(self.email.clone()));
        body.insert("password".to_string(), Value::String(self.password.clone()));
        body
    }
}

/// Per-user state carried between requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: usize,
    token: Option<String>,
}

impl Session {
    pub fn anonymous(user_id: usize) -> Self {
        Self {
            user_id,
            token: None,
        }
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// What happened when one operation was executed.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestRecord {
    pub name: String,
    pub method: HttpMethod,
    pub path: String,
    pub status: Option<u16>,
    pub latency: Duration,
    pub content_length: u64,
    pub error: Option<String>,
}

impl RequestRecord {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct Outcome {
    pub record: RequestRecord,
    pub body: Option<Value>,
}
