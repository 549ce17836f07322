//! Tools the research agents can call

pub mod news;
pub mod risk;
pub mod stock_price;

pub use news::{NewsQuery, NewsSearchTool};
pub use risk::RiskAssessmentTool;
pub use stock_price::{StockPriceTool, fetch_stock_price};
