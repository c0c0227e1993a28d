//! Transaction domain - assembly of unsigned transactions

mod builder;

pub use builder::{
    native_transfer_instructions, self_test_instructions, token_transfer_instructions,
    TransactionBuilder, SELF_TEST_LAMPORTS,
};
