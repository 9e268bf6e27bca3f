use crate::domain::model::{Credentials, Operation, OrderSchema, OrderTicket};
use crate::utils::error::{Result, SwarmError};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub const LOAD_COMPANIES: &str = "load_companies";
pub const LOAD_STOCK_PRICE: &str = "load_stock_price";
pub const GET_ALL_NOTIFICATIONS: &str = "get_all_notifications";
pub const GET_ALL_POSTS: &str = "get_all_posts";
pub const GET_PENDING_ORDERS: &str = "get_pending_orders";
pub const GET_OPEN_POSITIONS: &str = "get_open_positions";
pub const GET_CLOSED_POSITIONS: &str = "get_closed_positions";
pub const PLACE_ORDER: &str = "place_order";
pub const REGISTER: &str = "register";
pub const LOGIN: &str = "login";
pub const GET_USER_BALANCE: &str = "get_user_balance";
pub const GET_USER_INFO: &str = "get_user_info";
pub const GET_STOCK_PERCENTAGES: &str = "get_stock_percentages";
pub const GET_PROFIT_LOSS: &str = "get_profit_loss";

/// Knobs for the standard trading catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogOptions {
    pub symbol: String,
    pub order: OrderTicket,
    pub order_schema: OrderSchema,
    pub credentials: Credentials,
    /// When non-empty, only these operations are kept.
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub weights: HashMap<String, u32>,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            symbol: "AAPL".to_string(),
            order: OrderTicket::default(),
            order_schema: OrderSchema::default(),
            credentials: Credentials::default(),
            include: Vec::new(),
            exclude: Vec::new(),
            weights: HashMap::new(),
        }
    }
}

/// Read-only set of operations a simulated user picks from.
#[derive(Debug, Clone)]
pub struct TaskCatalog {
    operations: Vec<Operation>,
    sampler: WeightedIndex<u32>,
}

#[derive(Debug, Default)]
pub struct TaskCatalogBuilder {
    operations: Vec<Operation>,
    seen: HashSet<String>,
    duplicate: Option<String>,
}

impl TaskCatalogBuilder {
    pub fn register(mut self, operation: Operation) -> Self {
        if !self.seen.insert(operation.name.clone()) && self.duplicate.is_none() {
            self.duplicate = Some(operation.name.clone());
        }
        self.operations.push(operation);
        self
    }

    pub fn build(self) -> Result<TaskCatalog> {
        if let Some(name) = self.duplicate {
            return Err(SwarmError::DuplicateOperation { name });
        }
        TaskCatalog::from_operations(self.operations)
    }
}

impl TaskCatalog {
    pub fn builder() -> TaskCatalogBuilder {
        TaskCatalogBuilder::default()
    }

    fn from_operations(operations: Vec<Operation>) -> Result<Self> {
        if operations.is_empty() {
            return Err(SwarmError::EmptyCatalog);
        }

        let sampler = WeightedIndex::new(operations.iter().map(|op| op.weight))
            .map_err(|_| SwarmError::EmptyCatalog)?;

        Ok(Self {
            operations,
            sampler,
        })
    }

    /// The full trading API surface, filtered and weighted by `options`.
    pub fn standard(options: &CatalogOptions) -> Result<Self> {
        let all = standard_operations(options);
        let known: HashSet<&str> = all.iter().map(|op| op.name.as_str()).collect();

        for name in options
            .include
            .iter()
            .chain(options.exclude.iter())
            .chain(options.weights.keys())
        {
            if !known.contains(name.as_str()) {
                return Err(SwarmError::UnknownOperation { name: name.clone() });
            }
        }

        let mut builder = Self::builder();
        for mut op in all {
            if !options.include.is_empty() && !options.include.contains(&op.name) {
                continue;
            }
            if options.exclude.contains(&op.name) {
                continue;
            }
            if let Some(weight) = options.weights.get(&op.name) {
                op.weight = *weight;
            }
            builder = builder.register(op);
        }

        let catalog = builder.build()?;
        tracing::debug!("Built task catalog with {} operations", catalog.len());
        Ok(catalog)
    }

    /// Weighted choice with repetition; uniform when every weight is equal.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &Operation {
        &self.operations[self.sampler.sample(rng)]
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.name == name)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

fn standard_operations(options: &CatalogOptions) -> Vec<Operation> {
    let credentials = options.credentials.to_body();

    vec![
        Operation::get(LOAD_COMPANIES, "/data/companies"),
        Operation::get(
            LOAD_STOCK_PRICE,
            format!("/data/stock-price/{}", options.symbol),
        ),
        Operation::get(GET_ALL_NOTIFICATIONS, "/notifications/getAllNotifications"),
        Operation::get(GET_ALL_POSTS, "/posts/"),
        Operation::get(GET_PENDING_ORDERS, "/summary/pending-orders"),
        Operation::get(GET_OPEN_POSITIONS, "/summary/open-positions"),
        Operation::get(GET_CLOSED_POSITIONS, "/summary/closed-positions"),
        Operation::post(
            PLACE_ORDER,
            "/transactions/order",
            options.order.to_body(options.order_schema, &options.symbol),
        ),
        Operation::post(REGISTER, "/auth/register", credentials.clone()),
        Operation::post(LOGIN, "/auth/login", credentials),
        Operation::get(GET_USER_BALANCE, "/auth/balance"),
        Operation::get(GET_USER_INFO, "/auth/info"),
        Operation::get(GET_STOCK_PERCENTAGES, "/charts/stock-percentages"),
        Operation::get(GET_PROFIT_LOSS, "/charts/profit-loss"),
    ]
}
