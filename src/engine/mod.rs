pub mod channel;
pub mod protocol;
pub mod worker;
