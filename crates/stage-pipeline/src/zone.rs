//! Zone lookup: maps a cell index to the zone it belongs to.
//!
//! A global lookup resolves every index to one implicit zone, so single and
//! multi zone configurations go through the same code.

/// Name of the implicit zone of a global lookup.
pub const GLOBAL_ZONE: &str = "global";

/// Resolves cell indices to zones.
///
/// Per-cell lookups describe one horizontal layer. Indices past the layer wrap
/// around, so arrays holding several depth layers resolve each layer the same
/// way.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneLookup {
    names: Vec<String>,
    cells: Option<Vec<Option<usize>>>,
}

impl ZoneLookup {
    /// A lookup with one zone covering every cell.
    pub fn global() -> Self {
        Self {
            names: vec![GLOBAL_ZONE.to_string()],
            cells: None,
        }
    }

    /// A lookup from the zone id of each cell of one layer. `None` marks a
    /// cell outside every zone.
    ///
    /// Zones are numbered in first-seen order.
    pub fn from_cells<S: AsRef<str>>(cells: &[Option<S>]) -> Self {
        let mut names: Vec<String> = Vec::new();
        let zones = cells
            .iter()
            .map(|cell| {
                cell.as_ref().map(|name| {
                    let name = name.as_ref();
                    match names.iter().position(|n| n == name) {
                        Some(index) => index,
                        None => {
                            names.push(name.to_string());
                            names.len() - 1
                        }
                    }
                })
            })
            .collect();
        Self {
            names,
            cells: Some(zones),
        }
    }

    pub fn is_global(&self) -> bool {
        self.cells.is_none()
    }

    /// Zone ids in zone-number order.
    pub fn zone_names(&self) -> &[String] {
        &self.names
    }

    pub fn zone_count(&self) -> usize {
        self.names.len()
    }

    /// Number of cells in one layer, or `None` for a global lookup.
    pub fn layer_cells(&self) -> Option<usize> {
        self.cells.as_ref().map(Vec::len)
    }

    /// Zone number of the cell at `index`.
    #[inline]
    pub fn zone_of(&self, index: usize) -> Option<usize> {
        match &self.cells {
            None => Some(0),
            Some(cells) if cells.is_empty() => None,
            Some(cells) => cells[index % cells.len()],
        }
    }

    /// Zone id of the cell at `index`.
    pub fn zone_id_of(&self, index: usize) -> Option<&str> {
        self.zone_of(index)
            .and_then(|zone| self.names.get(zone))
            .map(String::as_str)
    }
}

impl Default for ZoneLookup {
    fn default() -> Self {
        Self::global()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_lookup_resolves_everything() {
        let lookup = ZoneLookup::global();
        assert!(lookup.is_global());
        assert_eq!(lookup.zone_of(0), Some(0));
        assert_eq!(lookup.zone_id_of(123_456), Some(GLOBAL_ZONE));
        assert_eq!(lookup.layer_cells(), None);
    }

    #[test]
    fn test_per_cell_lookup_wraps_layers() {
        let lookup = ZoneLookup::from_cells(&[Some("north"), Some("north"), None, Some("south")]);
        assert_eq!(lookup.zone_names(), &["north".to_string(), "south".to_string()]);
        assert_eq!(lookup.zone_id_of(1), Some("north"));
        assert_eq!(lookup.zone_id_of(2), None);
        assert_eq!(lookup.zone_id_of(3), Some("south"));
        // second depth layer
        assert_eq!(lookup.zone_id_of(4), Some("north"));
        assert_eq!(lookup.zone_id_of(7), Some("south"));
    }

    #[test]
    fn test_empty_lookup_resolves_nothing() {
        let lookup = ZoneLookup::from_cells::<&str>(&[]);
        assert_eq!(lookup.zone_of(0), None);
        assert_eq!(lookup.zone_count(), 0);
    }
}
