pub mod fan_out;
pub mod pool;
pub mod time;
