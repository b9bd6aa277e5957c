pub mod cache;
pub mod client;
pub mod extractor;

pub use cache::{CacheStats, ScheduleCache};
pub use client::EmiasClient;
pub use extractor::{
    extract_complex_resource_id, extract_slots, extract_upstream_slots, find_doctor,
    parse_slot_time,
};
