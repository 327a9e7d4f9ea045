// padrs State Cache
// Cached process addresses and the routines that keep them fresh

pub mod address;
pub mod sync;

pub use address::{AddressCell, AddressStore, CellKey, NULL_ADDRESS};
pub use sync::{register_sync_routines, SyncTaskIds};
