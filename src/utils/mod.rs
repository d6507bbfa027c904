mod time;
mod txid;

pub use time::current_time_millis;
pub use txid::TransactionIdGenerator;
