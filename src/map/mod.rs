use crate::errors::{TerrapathError, TerrapathResult};
use derive_more::{Display, From};

/// Grid coordinate pair identifying one terrain cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, From)]
#[display("({x}, {y})")]
pub struct Cell {
    pub x: u32,
    pub y: u32,
}

impl Cell {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Calculate Euclidean distance to another cell
    pub fn euclidean_distance(&self, other: &Cell) -> f32 {
        let dx = self.x as f32 - other.x as f32;
        let dy = self.y as f32 - other.y as f32;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Terrain classification derived from the scalar field.
///
/// The eight classes partition the scalar range [0, 200) into half-open
/// bands of width 25, in this order: Swamp, Rough, Water, Grass, Dirt,
/// Sand, Lava, Snow. Water is impassable regardless of the road flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum TerrainClass {
    Swamp,
    Rough,
    Water,
    Grass,
    Dirt,
    Sand,
    Lava,
    Snow,
}

impl TerrainClass {
    /// Classify a terrain scalar. Total over all inputs: values below the
    /// Swamp band classify as Swamp, values past the Snow band as Snow.
    pub fn from_scalar(value: i32) -> Self {
        if value < 25 {
            TerrainClass::Swamp
        } else if value < 50 {
            TerrainClass::Rough
        } else if value < 75 {
            TerrainClass::Water
        } else if value < 100 {
            TerrainClass::Grass
        } else if value < 125 {
            TerrainClass::Dirt
        } else if value < 150 {
            TerrainClass::Sand
        } else if value < 175 {
            TerrainClass::Lava
        } else {
            TerrainClass::Snow
        }
    }

    /// Base traversal cost for this class, before the road discount.
    /// Water is a sentinel: no finite cost makes it traversable.
    pub fn base_cost(self) -> f32 {
        match self {
            TerrainClass::Swamp | TerrainClass::Lava => 175.0,
            TerrainClass::Rough => 125.0,
            TerrainClass::Water => f32::INFINITY,
            TerrainClass::Grass | TerrainClass::Dirt => 100.0,
            TerrainClass::Sand | TerrainClass::Snow => 150.0,
        }
    }

    /// Cost multiplier applied when the cell carries a road: 0.65 for the
    /// cheap classes (Grass, Dirt, Snow), 0.75 for the expensive ones
    /// (Swamp, Rough, Sand, Lava).
    pub fn road_discount(self) -> f32 {
        match self {
            TerrainClass::Swamp
            | TerrainClass::Rough
            | TerrainClass::Sand
            | TerrainClass::Lava => 0.75,
            TerrainClass::Grass | TerrainClass::Dirt | TerrainClass::Snow => 0.65,
            TerrainClass::Water => 1.0,
        }
    }

    pub fn is_passable(self) -> bool {
        self != TerrainClass::Water
    }
}

/// Terrain scalar grid plus road overlay for one generated map.
///
/// Both grids share the same fixed dimensions for the field's lifetime.
/// Only field generation mutates them; every other component reads.
#[derive(Debug, Clone)]
pub struct TerrainField {
    width: u32,
    height: u32,
    scalar: Vec<i32>, // Flattened 2D array (row-major)
    road: Vec<bool>,
}

impl TerrainField {
    /// Create a field from a scalar grid with no roads, with validation
    pub fn new(width: u32, height: u32, scalar: Vec<i32>) -> TerrapathResult<Self> {
        if width == 0 || height == 0 {
            return Err(TerrapathError::InvalidDimensions {
                reason: format!("Field dimensions must be positive, got {width}x{height}"),
            });
        }

        let expected_size = (width * height) as usize;
        if scalar.len() != expected_size {
            return Err(TerrapathError::InvalidDimensions {
                reason: format!(
                    "Scalar grid size {} does not match field dimensions {}x{} (expected {})",
                    scalar.len(),
                    width,
                    height,
                    expected_size
                ),
            });
        }

        Ok(Self {
            width,
            height,
            scalar,
            road: vec![false; expected_size],
        })
    }

    /// Create a uniform field for testing
    pub fn uniform(width: u32, height: u32, value: i32) -> TerrapathResult<Self> {
        Self::new(width, height, vec![value; (width * height) as usize])
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x < self.width && cell.y < self.height
    }

    fn index(&self, cell: Cell) -> usize {
        (cell.y * self.width + cell.x) as usize
    }

    /// Terrain scalar at a cell, or `None` out of bounds
    pub fn scalar_at(&self, cell: Cell) -> Option<i32> {
        if !self.in_bounds(cell) {
            return None;
        }
        self.scalar.get(self.index(cell)).copied()
    }

    /// Terrain class at a cell, or `None` out of bounds
    pub fn class_of(&self, cell: Cell) -> Option<TerrainClass> {
        self.scalar_at(cell).map(TerrainClass::from_scalar)
    }

    /// Check if a cell carries a road. Out-of-bounds cells never do.
    pub fn is_road(&self, cell: Cell) -> bool {
        if !self.in_bounds(cell) {
            return false;
        }
        self.road.get(self.index(cell)).copied().unwrap_or(false)
    }

    /// Check if a cell can be traversed at all. Out-of-bounds cells and
    /// Water cells cannot.
    pub fn is_passable(&self, cell: Cell) -> bool {
        self.class_of(cell).is_some_and(TerrainClass::is_passable)
    }

    /// Traversal cost of entering a cell: the class base cost, discounted
    /// when the cell carries a road. Impassable and out-of-bounds cells
    /// cost the infinite sentinel.
    pub fn traversal_cost(&self, cell: Cell) -> f32 {
        let Some(class) = self.class_of(cell) else {
            return f32::INFINITY;
        };

        let base = class.base_cost();
        if self.is_road(cell) { base * class.road_discount() } else { base }
    }

    /// Replace the road overlay. Restricted to field generation.
    pub(crate) fn set_roads(&mut self, road: Vec<bool>) {
        debug_assert_eq!(road.len(), self.scalar.len());
        self.road = road;
    }

    #[cfg(test)]
    pub(crate) fn set_road_for_test(&mut self, cell: Cell, road: bool) {
        let index = self.index(cell);
        self.road[index] = road;
    }
}
