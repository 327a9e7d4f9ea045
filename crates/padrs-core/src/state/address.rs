// padrs Address Cells
// Named cells caching externally-discovered process addresses

use std::sync::atomic::{AtomicU64, Ordering};

use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// Sentinel stored while a cell has no valid address.
pub const NULL_ADDRESS: u64 = 0;

/// Entry count of the terrain rotation selector table.
pub const TERRAIN_ROTATION_SELECTOR_LEN: usize = 9;

/// Entry count of the terrain rotator helper table.
pub const TERRAIN_ROTATOR_HELPER_LEN: usize = 25;

/// The fixed set of cached addresses.
///
/// The display string of each key is the symbolic name handed to the
/// external address table, so the enum doubles as the lookup catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum CellKey {
    #[strum(serialize = "Game States")]
    GameStates,
    #[strum(serialize = "File Root")]
    FileRoot,
    #[strum(serialize = "AreaChangeCounter")]
    AreaChange,
    #[strum(serialize = "GameCullSize")]
    CullSize,
    #[strum(serialize = "Terrain Rotation Selector")]
    TerrainRotationSelector,
    #[strum(serialize = "Terrain Rotator Helper")]
    TerrainRotatorHelper,
}

impl CellKey {
    /// Symbolic name used against the external address table.
    pub fn lookup_name(self) -> &'static str {
        match self {
            CellKey::GameStates => "Game States",
            CellKey::FileRoot => "File Root",
            CellKey::AreaChange => "AreaChangeCounter",
            CellKey::CullSize => "GameCullSize",
            CellKey::TerrainRotationSelector => "Terrain Rotation Selector",
            CellKey::TerrainRotatorHelper => "Terrain Rotator Helper",
        }
    }

    fn index(self) -> usize {
        match self {
            CellKey::GameStates => 0,
            CellKey::FileRoot => 1,
            CellKey::AreaChange => 2,
            CellKey::CullSize => 3,
            CellKey::TerrainRotationSelector => 4,
            CellKey::TerrainRotatorHelper => 5,
        }
    }
}

/// One cached address.
///
/// Written only from the scheduler's thread of control; read freely from
/// anywhere, which is why the payload is atomic rather than locked.
#[derive(Debug)]
pub struct AddressCell {
    key: CellKey,
    address: AtomicU64,
}

impl AddressCell {
    fn new(key: CellKey) -> Self {
        Self {
            key,
            address: AtomicU64::new(NULL_ADDRESS),
        }
    }

    /// The cell's key.
    pub fn key(&self) -> CellKey {
        self.key
    }

    /// Current cached address (may be [`NULL_ADDRESS`]).
    pub fn load(&self) -> u64 {
        self.address.load(Ordering::SeqCst)
    }

    /// Replace the cached address.
    pub fn store(&self, address: u64) {
        self.address.store(address, Ordering::SeqCst);
    }

    /// Drop back to the null sentinel.
    pub fn reset(&self) {
        self.store(NULL_ADDRESS);
    }

    /// Whether the cell currently holds no valid address.
    pub fn is_null(&self) -> bool {
        self.load() == NULL_ADDRESS
    }
}

/// The full set of cached address cells.
#[derive(Debug)]
pub struct AddressStore {
    cells: [AddressCell; 6],
}

impl AddressStore {
    /// Create a store with every cell at the null sentinel.
    pub fn new() -> Self {
        Self {
            cells: [
                AddressCell::new(CellKey::GameStates),
                AddressCell::new(CellKey::FileRoot),
                AddressCell::new(CellKey::AreaChange),
                AddressCell::new(CellKey::CullSize),
                AddressCell::new(CellKey::TerrainRotationSelector),
                AddressCell::new(CellKey::TerrainRotatorHelper),
            ],
        }
    }

    /// The cell for a key.
    pub fn cell(&self, key: CellKey) -> &AddressCell {
        &self.cells[key.index()]
    }

    /// All cells, in catalog order.
    pub fn cells(&self) -> &[AddressCell] {
        &self.cells
    }

    /// Reset every cell to the null sentinel.
    ///
    /// Invoked when the observed process goes away; no cell may keep a
    /// stale address past that point.
    pub fn reset_all(&self) {
        for cell in &self.cells {
            cell.reset();
        }
    }

    /// Diagnostic lines in `key = address` form, catalog order.
    pub fn status_lines(&self) -> Vec<String> {
        CellKey::iter()
            .map(|key| {
                let cell = self.cell(key);
                if cell.is_null() {
                    format!("{} = <null>", key)
                } else {
                    format!("{} = {:#x}", key, cell.load())
                }
            })
            .collect()
    }
}

impl Default for AddressStore {
    fn default() -> Self {
        Self::new()
    }
}
