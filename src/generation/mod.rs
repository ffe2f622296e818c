use crate::errors::{TerrapathError, TerrapathResult};
use crate::map::{Cell, TerrainClass, TerrainField};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;
use validator::Validate;

/// Terrain scalars are drawn uniformly from [0, TERRAIN_SCALAR_MAX).
const TERRAIN_SCALAR_MAX: i32 = 200;
/// Road field values are drawn uniformly from [0, ROAD_FIELD_MAX).
const ROAD_FIELD_MAX: i32 = 6;
/// Terrain smoothing blends cell and neighbor average in equal parts.
const TERRAIN_BLEND_DIVISOR: i32 = 2;
/// Road smoothing divides the same blend by 4, pushing most cells to 0 or 1.
const ROAD_BLEND_DIVISOR: i32 = 4;

const ORTHOGONAL_OFFSETS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Parameters for one "new map" request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenerationConfig {
    #[validate(range(min = 1, max = 2048))]
    pub width: u32,
    #[validate(range(min = 1, max = 2048))]
    pub height: u32,
    #[validate(range(max = 100))]
    pub smoothing_passes: u32,
    pub seed: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            width: 60,
            height: 60,
            smoothing_passes: 5,
            seed: 12345,
        }
    }
}

impl GenerationConfig {
    /// Load a config from a TOML file with validation
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> TerrapathResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(TerrapathError::ConfigFileNotFound {
                path: path.to_path_buf(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate().map_err(validation_error)?;

        Ok(config)
    }
}

/// Collapse validator output into one readable error
fn validation_error(validation_errors: validator::ValidationErrors) -> TerrapathError {
    let error_details = validation_errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            format!("{field}: {}", error_msgs.join(", "))
        })
        .collect::<Vec<String>>()
        .join("; ");

    TerrapathError::InvalidConfig {
        reason: error_details,
    }
}

/// Generator for terrain fields and their road overlays.
///
/// Owns an explicitly seeded RNG so generation is deterministic per seed;
/// the same seed and config always produce the same field.
pub struct FieldGenerator {
    rng: Pcg64,
}

impl FieldGenerator {
    /// Create a generator seeded for reproducible output
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg64::seed_from_u64(seed),
        }
    }

    /// Generate a complete field: smoothed terrain plus road overlay
    pub fn generate(&mut self, config: &GenerationConfig) -> TerrapathResult<TerrainField> {
        config.validate().map_err(validation_error)?;

        let mut field =
            self.generate_terrain(config.width, config.height, config.smoothing_passes)?;
        self.generate_roads(&mut field);

        Ok(field)
    }

    /// Fill a fresh field with uniform random scalars in [0, 200), then
    /// apply `smoothing_passes` neighbor-averaging passes.
    pub fn generate_terrain(
        &mut self,
        width: u32,
        height: u32,
        smoothing_passes: u32,
    ) -> TerrapathResult<TerrainField> {
        if width == 0 || height == 0 {
            return Err(TerrapathError::InvalidDimensions {
                reason: format!("Field dimensions must be positive, got {width}x{height}"),
            });
        }

        let total_cells = (width * height) as usize;
        let mut scalar = Vec::with_capacity(total_cells);
        for _ in 0..total_cells {
            scalar.push(self.rng.gen_range(0..TERRAIN_SCALAR_MAX));
        }

        let scalar = smooth(scalar, width, height, smoothing_passes, TERRAIN_BLEND_DIVISOR);

        info!("Generated {width}x{height} terrain with {smoothing_passes} smoothing passes");
        TerrainField::new(width, height, scalar)
    }

    /// Regenerate the field's road overlay in place.
    ///
    /// Draws an independent random field in [0, 6), smooths it exactly one
    /// pass with the road blend divisor, then thresholds it against the
    /// terrain. Water cells never become roads.
    pub fn generate_roads(&mut self, field: &mut TerrainField) {
        let (width, height) = (field.width(), field.height());
        let total_cells = (width * height) as usize;

        let mut raw = Vec::with_capacity(total_cells);
        for _ in 0..total_cells {
            raw.push(self.rng.gen_range(0..ROAD_FIELD_MAX));
        }

        let smoothed = smooth(raw, width, height, 1, ROAD_BLEND_DIVISOR);
        let road = threshold_roads(field, &smoothed);

        let road_count = road.iter().filter(|&&r| r).count();
        info!(
            "Road overlay: {road_count}/{total_cells} cells ({percentage:.1}%)",
            percentage = (road_count as f32 / total_cells as f32) * 100.0
        );

        field.set_roads(road);
    }

    /// Pick a uniformly random cell that carries a road on passable
    /// terrain, or `None` when the field has no such cell
    pub fn random_road_cell(&mut self, field: &TerrainField) -> Option<Cell> {
        let mut candidates = Vec::new();
        for y in 0..field.height() {
            for x in 0..field.width() {
                let cell = Cell::new(x, y);
                if field.is_road(cell) && field.is_passable(cell) {
                    candidates.push(cell);
                }
            }
        }

        if candidates.is_empty() {
            return None;
        }
        Some(candidates[self.rng.gen_range(0..candidates.len())])
    }
}

/// Apply `passes` neighbor-averaging passes to a scalar grid.
///
/// Every pass reads the full previous buffer, so cells never observe
/// half-updated neighbors within a pass.
fn smooth(mut grid: Vec<i32>, width: u32, height: u32, passes: u32, blend_divisor: i32) -> Vec<i32> {
    for _ in 0..passes {
        grid = smooth_pass(&grid, width, height, blend_divisor);
    }
    grid
}

/// One pass: blend each cell with the average of its in-bounds neighbors.
///
/// Border cells average over fewer neighbors; the denominator is exactly
/// the number of neighbors summed. Integer division truncates at both the
/// average and the blend.
fn smooth_pass(grid: &[i32], width: u32, height: u32, blend_divisor: i32) -> Vec<i32> {
    let w = width as i32;
    let h = height as i32;
    let mut out = vec![0; grid.len()];

    for y in 0..h {
        for x in 0..w {
            let mut neighbor_sum = 0;
            let mut neighbor_count = 0;

            for dy in -1..=1 {
                for dx in -1..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let (nx, ny) = (x + dx, y + dy);
                    if nx >= 0 && ny >= 0 && nx < w && ny < h {
                        neighbor_sum += grid[(ny * w + nx) as usize];
                        neighbor_count += 1;
                    }
                }
            }

            let index = (y * w + x) as usize;
            // A 1x1 grid has no neighbors to average; leave the cell alone.
            out[index] = if neighbor_count == 0 {
                grid[index]
            } else {
                (grid[index] + neighbor_sum / neighbor_count) / blend_divisor
            };
        }
    }

    out
}

/// Threshold a smoothed road field against the terrain.
///
/// A cell becomes a road when its smoothed value is nonzero and its terrain
/// is not Water. Cells with value exactly 1 additionally need at least one
/// orthogonal in-bounds neighbor with a nonzero value, which suppresses
/// isolated single-cell roads.
fn threshold_roads(field: &TerrainField, smoothed: &[i32]) -> Vec<bool> {
    let (width, height) = (field.width(), field.height());
    let mut road = vec![false; smoothed.len()];

    for y in 0..height {
        for x in 0..width {
            let index = (y * width + x) as usize;
            let value = smoothed[index];

            if value == 0 {
                continue;
            }
            if field.class_of(Cell::new(x, y)) == Some(TerrainClass::Water) {
                continue;
            }
            if value == 1 && !has_nonzero_orthogonal_neighbor(smoothed, width, height, x, y) {
                continue;
            }

            road[index] = true;
        }
    }

    road
}

fn has_nonzero_orthogonal_neighbor(
    smoothed: &[i32],
    width: u32,
    height: u32,
    x: u32,
    y: u32,
) -> bool {
    ORTHOGONAL_OFFSETS.iter().any(|&(dx, dy)| {
        let (nx, ny) = (x as i32 + dx, y as i32 + dy);
        nx >= 0
            && ny >= 0
            && nx < width as i32
            && ny < height as i32
            && smoothed[(ny as u32 * width + nx as u32) as usize] != 0
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_is_deterministic_per_seed() {
        let config = GenerationConfig {
            width: 24,
            height: 24,
            smoothing_passes: 3,
            seed: 777,
        };

        let field_a = FieldGenerator::new(config.seed).generate(&config).unwrap();
        let field_b = FieldGenerator::new(config.seed).generate(&config).unwrap();

        for y in 0..config.height {
            for x in 0..config.width {
                let cell = Cell::new(x, y);
                assert_eq!(field_a.scalar_at(cell), field_b.scalar_at(cell));
                assert_eq!(field_a.is_road(cell), field_b.is_road(cell));
            }
        }
    }

    #[test]
    fn test_generated_scalars_stay_in_range() {
        let mut generator = FieldGenerator::new(42);
        let field = generator.generate_terrain(32, 32, 8).unwrap();

        for y in 0..32 {
            for x in 0..32 {
                let value = field.scalar_at(Cell::new(x, y)).unwrap();
                assert!(
                    (0..200).contains(&value),
                    "scalar {value} escaped [0, 200) at ({x}, {y})"
                );
            }
        }
    }

    #[test]
    fn test_water_cells_are_never_roads() {
        for seed in [1, 99, 4096, 123456789] {
            let mut generator = FieldGenerator::new(seed);
            let config = GenerationConfig {
                seed,
                ..Default::default()
            };
            let field = generator.generate(&config).unwrap();

            for y in 0..field.height() {
                for x in 0..field.width() {
                    let cell = Cell::new(x, y);
                    if field.class_of(cell) == Some(TerrainClass::Water) {
                        assert!(!field.is_road(cell), "water cell {cell} marked as road");
                    }
                }
            }
        }
    }

    #[test]
    fn test_smooth_zero_passes_is_identity() {
        let grid = vec![5, 180, 42, 0, 199, 17];
        assert_eq!(smooth(grid.clone(), 3, 2, 0, TERRAIN_BLEND_DIVISOR), grid);
    }

    #[test]
    fn test_smooth_pass_known_values() {
        // 2x2 grid, row-major [0, 4, 8, 12]. Each cell has three neighbors;
        // integer division truncates the neighbor average (e.g. 20/3 = 6).
        let grid = vec![0, 4, 8, 12];
        assert_eq!(smooth_pass(&grid, 2, 2, 2), vec![4, 5, 6, 8]);
        assert_eq!(smooth_pass(&grid, 2, 2, 4), vec![2, 2, 3, 4]);
    }

    #[test]
    fn test_smooth_is_deterministic() {
        let grid = vec![13, 150, 78, 91, 2, 166, 45, 120, 33];
        let once = smooth(grid.clone(), 3, 3, 4, TERRAIN_BLEND_DIVISOR);
        let twice = smooth(grid, 3, 3, 4, TERRAIN_BLEND_DIVISOR);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_smooth_single_cell_grid() {
        assert_eq!(smooth(vec![120], 1, 1, 5, TERRAIN_BLEND_DIVISOR), vec![120]);
    }

    #[test]
    fn test_road_threshold_suppresses_isolated_ones() {
        let field = TerrainField::uniform(3, 3, 80).unwrap();

        // A lone 1 surrounded by zeros is suppressed.
        let smoothed = vec![0, 0, 0, 0, 1, 0, 0, 0, 0];
        let road = threshold_roads(&field, &smoothed);
        assert!(road.iter().all(|&r| !r));

        // The same 1 survives once an orthogonal neighbor is nonzero.
        let smoothed = vec![0, 1, 0, 0, 1, 0, 0, 0, 0];
        let road = threshold_roads(&field, &smoothed);
        assert!(road[4]);
    }

    #[test]
    fn test_road_threshold_skips_water() {
        // Center cell is Water; everything else Grass.
        let mut scalar = vec![80; 9];
        scalar[4] = 60;
        let field = TerrainField::new(3, 3, scalar).unwrap();

        let smoothed = vec![2; 9];
        let road = threshold_roads(&field, &smoothed);
        assert!(!road[4], "water cell must stay roadless");
        assert!(road[0] && road[8], "grass cells with value 2 become roads");
    }

    #[test]
    fn test_generate_rejects_invalid_config() {
        let config = GenerationConfig {
            width: 0,
            ..Default::default()
        };
        let result = FieldGenerator::new(1).generate(&config);
        assert!(matches!(result, Err(TerrapathError::InvalidConfig { .. })));
    }

    #[test]
    fn test_generate_terrain_rejects_zero_dimensions() {
        let mut generator = FieldGenerator::new(1);
        assert!(matches!(
            generator.generate_terrain(0, 10, 1),
            Err(TerrapathError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            generator.generate_terrain(10, 0, 1),
            Err(TerrapathError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_random_road_cell() {
        let mut generator = FieldGenerator::new(7);

        // No roads at all: nothing to pick.
        let field = TerrainField::uniform(4, 4, 80).unwrap();
        assert_eq!(generator.random_road_cell(&field), None);

        // One road cell: always picked.
        let mut field = TerrainField::uniform(4, 4, 80).unwrap();
        field.set_road_for_test(Cell::new(2, 3), true);
        assert_eq!(generator.random_road_cell(&field), Some(Cell::new(2, 3)));
    }

    #[test]
    fn test_config_load_missing_file() {
        let result = GenerationConfig::load_from_file("definitely/not/here.toml");
        assert!(matches!(
            result,
            Err(TerrapathError::ConfigFileNotFound { .. })
        ));
    }

    #[test]
    fn test_config_parses_from_toml() {
        let config: GenerationConfig =
            toml::from_str("width = 80\nheight = 40\nsmoothing_passes = 2\nseed = 9").unwrap();
        assert_eq!(config.width, 80);
        assert_eq!(config.height, 40);
        assert_eq!(config.smoothing_passes, 2);
        assert_eq!(config.seed, 9);
    }
}
