pub mod blocks;
pub mod error;
pub mod geometry;
pub mod io;
pub mod stations;
pub mod strata;
pub mod transactions;
