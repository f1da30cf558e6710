pub mod analysis;
pub mod scan_log;
