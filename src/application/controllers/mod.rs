//! Screen controllers driving the builder, bridge and swap client

pub mod dashboard;
pub mod passkey_auth;
pub mod state;
pub mod swap;
pub mod transactions;

#[cfg(test)]
pub(crate) mod test_support;

pub use dashboard::DashboardController;
pub use passkey_auth::PasskeyAuthController;
pub use state::ActionState;
pub use swap::SwapController;
pub use transactions::{TransactionController, TransactionForm, TransactionOutcome};
