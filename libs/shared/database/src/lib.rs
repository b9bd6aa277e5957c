pub mod memory;
pub mod store;
pub mod supabase;
pub mod supabase_store;

pub use memory::InMemoryAppointmentStore;
pub use store::{AppointmentStore, StoreError};
pub use supabase_store::SupabaseAppointmentStore;
