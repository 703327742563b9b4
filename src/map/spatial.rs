use std::collections::HashMap;

/// Hash grid over lon/lat for picking items near a point
pub struct SpatialGrid<T> {
    cells: HashMap<(i32, i32), Vec<usize>>,
    items: Vec<(f64, f64, T)>,
    /// Cell size in degrees
    cell_size: f64,
}

impl<T> SpatialGrid<T> {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cells: HashMap::new(),
            items: Vec::new(),
            cell_size,
        }
    }

    #[inline(always)]
    fn to_cell(&self, lon: f64, lat: f64) -> (i32, i32) {
        (
            (lon / self.cell_size).floor() as i32,
            (lat / self.cell_size).floor() as i32,
        )
    }

    pub fn insert(&mut self, lon: f64, lat: f64, item: T) {
        let idx = self.items.len();
        self.items.push((lon, lat, item));
        let cell = self.to_cell(lon, lat);
        self.cells.entry(cell).or_default().push(idx);
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.items.clear();
    }

    /// Indices of items in cells touching the radius (may include items
    /// slightly outside it)
    pub fn query_radius(&self, lon: f64, lat: f64, radius_degrees: f64) -> Vec<usize> {
        let (cx, cy) = self.to_cell(lon, lat);
        let reach = (radius_degrees / self.cell_size).ceil() as i32;

        let mut results = Vec::new();
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                if let Some(indices) = self.cells.get(&(cx + dx, cy + dy)) {
                    results.extend_from_slice(indices);
                }
            }
        }
        results
    }

    /// Closest item within `radius_degrees`, by planar degree distance
    pub fn nearest(&self, lon: f64, lat: f64, radius_degrees: f64) -> Option<&T> {
        let r2 = radius_degrees * radius_degrees;
        self.query_radius(lon, lat, radius_degrees)
            .into_iter()
            .filter_map(|idx| self.items.get(idx))
            .map(|(x, y, item)| ((x - lon).powi(2) + (y - lat).powi(2), item))
            .filter(|(d2, _)| *d2 <= r2)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, item)| item)
    }

    /// All items with their positions
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64, &T)> {
        self.items.iter().map(|(lon, lat, item)| (*lon, *lat, item))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
