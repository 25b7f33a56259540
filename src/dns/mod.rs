pub mod dreamhost;

pub use dreamhost::{DnsRecordValue, DreamhostClient, DreamhostError};
