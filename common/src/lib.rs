#[macro_use]
pub mod macros;
pub mod cancel_token;
pub mod key_index_vec;
pub mod log_setup;
pub mod test_utils;

pub use cancel_token::CancelToken;
pub use key_index_vec::{KeyIndexKey, KeyIndexVec};

pub fn is_debug() -> bool {
    cfg!(debug_assertions)
}
