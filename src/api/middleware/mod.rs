pub mod metrics;
pub mod trace_id;
