pub mod activity;
pub mod ping;
pub mod sync;
