//! Peak-shaving BESS financial engine for electric-arc-furnace steel mills.

/// Battery and furnace parameter records.
pub mod assets;
pub mod config;
/// Discounted-cash-flow primitives, debt, and depreciation.
pub mod finance;
pub mod incentives;
pub mod io;
pub mod project;
/// Billing simulator, financial engine, and size optimizer.
pub mod sim;
pub mod tariff;
