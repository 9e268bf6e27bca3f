pub mod catalog;
pub mod engine;
pub mod session;
pub mod swarm;
pub mod user;
pub mod wait_time;

pub use crate::domain::model::{HttpMethod, Operation, Outcome, RequestRecord, Session};
pub use crate::domain::ports::{ConfigProvider, Executor, Storage};
pub use crate::utils::error::Result;
