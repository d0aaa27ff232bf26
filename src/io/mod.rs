/// CSV export of cash-flow rows and optimizer grids.
pub mod export;
