pub mod authority;
pub mod clock;
pub mod input;
pub mod move_token;
pub mod session;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;
