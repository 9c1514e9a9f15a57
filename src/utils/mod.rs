pub mod debounce;
pub mod test_helpers;
pub mod tokens;
