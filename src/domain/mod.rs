//! Domain layer - transaction assembly and wallet capabilities

pub mod transactions;
pub mod wallet;
