//! Financial data module - enriched per-ticker report for the server path.

mod financial_data_model;
mod financial_data_service;

pub use financial_data_model::FinancialData;
pub use financial_data_service::FinancialDataService;
