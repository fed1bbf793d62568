use std::collections::HashMap;

/// Longitude shifted to [0, 360) for grid indexing
#[inline(always)]
fn normalize_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0)
}

/// Latitude shifted to [0, 180) for grid indexing
#[inline(always)]
fn normalize_lat(lat: f64) -> f64 {
    (lat + 90.0).clamp(0.0, 179.999)
}

/// Spatial hash grid over geographic positions.
/// Cells wrap around the antimeridian so radius queries near ±180 still work.
pub struct SpatialGrid<T> {
    /// Grid cells indexed by (cell_x, cell_y)
    cells: HashMap<(i32, i32), Vec<usize>>,
    /// All items (indices into this vec stored in cells)
    items: Vec<T>,
    /// Cell size in degrees
    cell_size: f64,
}

impl<T> SpatialGrid<T> {
    /// Create a new spatial grid with given cell size in degrees
    pub fn new(cell_size: f64) -> Self {
        Self {
            cells: HashMap::new(),
            items: Vec::new(),
            cell_size,
        }
    }

    #[inline(always)]
    fn columns(&self) -> i32 {
        (360.0 / self.cell_size).ceil() as i32
    }

    #[inline(always)]
    fn to_cell(&self, lon: f64, lat: f64) -> (i32, i32) {
        let x = (normalize_lon(lon) / self.cell_size).floor() as i32;
        let y = (normalize_lat(lat) / self.cell_size).floor() as i32;
        (x, y)
    }

    /// Insert an item at a geographic position
    pub fn insert(&mut self, lon: f64, lat: f64, item: T) {
        let idx = self.items.len();
        self.items.push(item);

        let cell = self.to_cell(lon, lat);
        self.cells.entry(cell).or_default().push(idx);
    }

    /// Indices of items in cells within `radius_degrees` of a point.
    /// Candidates only; callers apply their own exact distance check.
    pub fn query_radius(&self, lon: f64, lat: f64, radius_degrees: f64) -> Vec<usize> {
        let (cx, cy) = self.to_cell(lon, lat);
        let columns = self.columns();
        let cell_radius = ((radius_degrees / self.cell_size).ceil() as i32).min(columns / 2);

        let mut results = Vec::new();
        for dy in -cell_radius..=cell_radius {
            for dx in -cell_radius..=cell_radius {
                let cell = ((cx + dx).rem_euclid(columns), cy + dy);
                if let Some(indices) = self.cells.get(&cell) {
                    results.extend_from_slice(indices);
                }
            }
        }
        results.sort_unstable();
        results.dedup();
        results
    }

    #[inline(always)]
    pub fn get(&self, idx: usize) -> Option<&T> {
        self.items.get(idx)
    }

    #[inline(always)]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> FromIterator<(f64, f64, T)> for SpatialGrid<T> {
    fn from_iter<I: IntoIterator<Item = (f64, f64, T)>>(iter: I) -> Self {
        let mut grid = Self::new(5.0);
        for (lon, lat, item) in iter {
            grid.insert(lon, lat, item);
        }
        grid
    }
}
