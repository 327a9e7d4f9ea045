// padrs Cache Synchronization Routines
// Scheduler routines that refresh address cells on reader notifications

use std::sync::Arc;

use crate::event::GameEvent;
use crate::lookup::AddressSource;
use crate::sched::{Scheduler, Step, TaskId, WaitOn};
use crate::state::address::{AddressStore, CellKey, NULL_ADDRESS};

/// Priority of the "Game States" sync routine.
pub const SYNC_PRIORITY_GAME_STATES: i32 = 60;
/// Priority of the "File Root" sync routine.
pub const SYNC_PRIORITY_FILE_ROOT: i32 = 50;
/// Priority of the area-change counter sync routine.
pub const SYNC_PRIORITY_AREA_CHANGE: i32 = 40;
/// Shared priority of the cull-size and terrain-table sync routines.
/// Their relative order on a shared tick is registration order; nothing
/// may depend on it.
pub const SYNC_PRIORITY_TERRAIN: i32 = 30;
/// Priority of the process-closed reset routine, below every sync routine.
pub const SYNC_PRIORITY_PROCESS_CLOSED: i32 = -10;

/// Handles of the registered cache routines.
#[derive(Debug, Clone)]
pub struct SyncTaskIds {
    /// One sync task per cell, in catalog order.
    pub cells: Vec<TaskId>,
    /// The process-closed reset task.
    pub reset: TaskId,
}

/// Register the cache update routines on a scheduler.
///
/// Six routines re-arm on [`GameEvent::AddressFound`] and copy the current
/// lookup result for their own key into their cell (the null sentinel when
/// the lookup has no answer). A seventh re-arms on
/// [`GameEvent::ProcessClosed`], resets every cell, and — when
/// `close_on_exit` is set — runs `on_close` so the host can tear down its
/// display surface.
pub fn register_sync_routines(
    sched: &mut Scheduler,
    store: Arc<AddressStore>,
    source: Arc<dyn AddressSource>,
    close_on_exit: bool,
    mut on_close: Option<Box<dyn FnMut()>>,
) -> SyncTaskIds {
    let plan = [
        (CellKey::GameStates, SYNC_PRIORITY_GAME_STATES),
        (CellKey::FileRoot, SYNC_PRIORITY_FILE_ROOT),
        (CellKey::AreaChange, SYNC_PRIORITY_AREA_CHANGE),
        (CellKey::CullSize, SYNC_PRIORITY_TERRAIN),
        (CellKey::TerrainRotationSelector, SYNC_PRIORITY_TERRAIN),
        (CellKey::TerrainRotatorHelper, SYNC_PRIORITY_TERRAIN),
    ];

    let mut cells = Vec::with_capacity(plan.len());
    for (key, priority) in plan {
        let store = store.clone();
        let source = source.clone();
        let id = sched.spawn(
            format!("sync:{}", key),
            priority,
            WaitOn::Event(GameEvent::AddressFound),
            move || {
                let address = source.lookup(key.lookup_name()).unwrap_or(NULL_ADDRESS);
                store.cell(key).store(address);
                log::debug!("sync: {} -> {:#x}", key, address);
                Step::Wait(WaitOn::Event(GameEvent::AddressFound))
            },
        );
        cells.push(id);
    }

    let reset_store = store.clone();
    let reset = sched.spawn(
        "sync:process-closed",
        SYNC_PRIORITY_PROCESS_CLOSED,
        WaitOn::Event(GameEvent::ProcessClosed),
        move || {
            log::debug!("sync: process closed, resetting cells");
            reset_store.reset_all();
            if close_on_exit {
                if let Some(hook) = on_close.as_mut() {
                    hook();
                }
            }
            Step::Wait(WaitOn::Event(GameEvent::ProcessClosed))
        },
    );

    SyncTaskIds { cells, reset }
}
