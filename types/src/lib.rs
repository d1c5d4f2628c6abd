pub mod api;
pub mod execution;

pub use execution::{
    Code, Key, ParseError, Transaction, Value, DELIMITER, GAS_WANTED, MAX_KEY_LEN, MAX_VALUE_LEN,
};
