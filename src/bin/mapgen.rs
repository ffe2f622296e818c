use clap::Parser;
use std::collections::HashSet;
use std::path::PathBuf;
use terrapath::{
    Cell, FieldGenerator, GenerationConfig, Pathfinder, TerrainClass, TerrainField,
    TerrapathError, TerrapathResult,
};

#[derive(Parser)]
#[command(name = "mapgen")]
#[command(about = "Generate a terrain map with roads and preview it in the terminal")]
struct Args {
    /// Terrain size in grid cells (format: WIDTHxHEIGHT)
    #[arg(long, default_value = "60x60")]
    size: String,

    /// Number of smoothing passes applied to the raw terrain
    #[arg(long, default_value = "5")]
    smoothing: u32,

    /// Random seed for reproducible generation
    #[arg(long, default_value = "12345")]
    seed: u64,

    /// Read generation parameters from a TOML file instead of flags
    #[arg(long)]
    config: Option<PathBuf>,

    /// Route to search, start to goal (format: "X1,Y1:X2,Y2")
    #[arg(long)]
    route: Option<String>,

    /// Search between two randomly picked road cells
    #[arg(long)]
    random_route: bool,
}

fn main() -> TerrapathResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => GenerationConfig::load_from_file(path)?,
        None => {
            let (width, height) = parse_size(&args.size)?;
            GenerationConfig {
                width,
                height,
                smoothing_passes: args.smoothing,
                seed: args.seed,
            }
        }
    };

    let mut generator = FieldGenerator::new(config.seed);
    let field = generator.generate(&config)?;

    let route = resolve_route(&args, &mut generator, &field)?;
    let path = match route {
        Some((start, goal)) => Some(Pathfinder::new().find_path(&field, start, goal)?),
        None => None,
    };

    print_field(&field, path.as_deref());
    print_field_summary(&config, &field);

    if let (Some((start, goal)), Some(path)) = (route, &path) {
        println!("\nRoute from {start} to {goal}: {} cells", path.len());
    }

    Ok(())
}

/// Pick the route endpoints from the flags, if any
fn resolve_route(
    args: &Args,
    generator: &mut FieldGenerator,
    field: &TerrainField,
) -> TerrapathResult<Option<(Cell, Cell)>> {
    if let Some(route) = &args.route {
        return parse_route(route).map(Some);
    }

    if args.random_route {
        let start = generator.random_road_cell(field);
        let goal = generator.random_road_cell(field);
        match (start, goal) {
            (Some(start), Some(goal)) => return Ok(Some((start, goal))),
            _ => println!("No road cells available for a random route"),
        }
    }

    Ok(None)
}

/// Parse size string "WIDTHxHEIGHT" with validation
fn parse_size(size_str: &str) -> TerrapathResult<(u32, u32)> {
    let [width, height] = parse_delimited::<2>(size_str, 'x', "size")?;

    if width == 0 || height == 0 {
        return Err(TerrapathError::InvalidConfig {
            reason: "Width and height must be greater than 0".to_string(),
        });
    }

    Ok((width, height))
}

/// Parse cell string "X,Y"
fn parse_cell(cell_str: &str) -> TerrapathResult<Cell> {
    let [x, y] = parse_delimited::<2>(cell_str, ',', "cell")?;
    Ok(Cell::new(x, y))
}

/// Parse route string "X1,Y1:X2,Y2" into start and goal cells
fn parse_route(route_str: &str) -> TerrapathResult<(Cell, Cell)> {
    let parts: Vec<&str> = route_str.split(':').collect();
    if parts.len() != 2 {
        return Err(TerrapathError::InvalidConfig {
            reason: format!(
                "Invalid route format '{route_str}'. Expected 'X1,Y1:X2,Y2' (start to goal)"
            ),
        });
    }

    Ok((parse_cell(parts[0])?, parse_cell(parts[1])?))
}

/// Generic parser for delimited unsigned integers
fn parse_delimited<const N: usize>(
    input: &str,
    delimiter: char,
    type_name: &str,
) -> TerrapathResult<[u32; N]> {
    let parts: Vec<&str> = input.split(delimiter).collect();
    if parts.len() != N {
        return Err(TerrapathError::InvalidConfig {
            reason: format!(
                "Invalid {type_name} format '{input}'. Expected {N} {delimiter}-separated values"
            ),
        });
    }

    let mut result = [0u32; N];
    for (i, part) in parts.iter().enumerate() {
        result[i] = part
            .trim()
            .parse()
            .map_err(|_| TerrapathError::InvalidConfig {
                reason: format!("Invalid {type_name} value: '{part}'"),
            })?;
    }

    Ok(result)
}

fn class_char(class: TerrainClass) -> char {
    match class {
        TerrainClass::Swamp => 's',
        TerrainClass::Rough => 'r',
        TerrainClass::Water => '~',
        TerrainClass::Grass => '.',
        TerrainClass::Dirt => ':',
        TerrainClass::Sand => ',',
        TerrainClass::Lava => '^',
        TerrainClass::Snow => '*',
    }
}

/// Render the field as one character per cell, with roads and the found
/// route drawn over the terrain
fn print_field(field: &TerrainField, path: Option<&[Cell]>) {
    let route: HashSet<Cell> = path.iter().flat_map(|p| p.iter().copied()).collect();
    // Path cells run goal to start.
    let goal = path.and_then(|p| p.first().copied());
    let start = path.and_then(|p| p.last().copied());

    for y in 0..field.height() {
        let mut row = String::with_capacity(field.width() as usize);
        for x in 0..field.width() {
            let cell = Cell::new(x, y);
            let ch = if Some(cell) == start {
                'S'
            } else if Some(cell) == goal {
                'G'
            } else if route.contains(&cell) {
                'o'
            } else if field.is_road(cell) {
                '#'
            } else {
                field.class_of(cell).map_or('?', class_char)
            };
            row.push(ch);
        }
        println!("{row}");
    }
}

fn print_field_summary(config: &GenerationConfig, field: &TerrainField) {
    let total_cells = (field.width() * field.height()) as usize;
    let mut road_count = 0usize;
    let mut class_counts = [0usize; 8];

    let classes = [
        TerrainClass::Swamp,
        TerrainClass::Rough,
        TerrainClass::Water,
        TerrainClass::Grass,
        TerrainClass::Dirt,
        TerrainClass::Sand,
        TerrainClass::Lava,
        TerrainClass::Snow,
    ];

    for y in 0..field.height() {
        for x in 0..field.width() {
            let cell = Cell::new(x, y);
            if field.is_road(cell) {
                road_count += 1;
            }
            if let Some(class) = field.class_of(cell) {
                if let Some(slot) = classes.iter().position(|&c| c == class) {
                    class_counts[slot] += 1;
                }
            }
        }
    }

    println!("\nMap summary:");
    println!(
        "  Terrain: {}x{} cells, seed {}, {} smoothing passes",
        field.width(),
        field.height(),
        config.seed,
        config.smoothing_passes
    );
    println!(
        "  Roads: {} cells ({:.1}%)",
        road_count,
        (road_count as f32 / total_cells as f32) * 100.0
    );
    println!("  Terrain classes:");
    for (class, count) in classes.iter().zip(class_counts) {
        println!("    {} ('{}'): {count} cells", class, class_char(*class));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("64x64").unwrap(), (64, 64));
        assert_eq!(parse_size("128x256").unwrap(), (128, 256));

        assert!(parse_size("64").is_err());
        assert!(parse_size("0x64").is_err());
        assert!(parse_size("axb").is_err());
    }

    #[test]
    fn test_parse_cell() {
        assert_eq!(parse_cell("3,7").unwrap(), Cell::new(3, 7));
        assert_eq!(parse_cell("0, 0").unwrap(), Cell::new(0, 0));

        assert!(parse_cell("3").is_err());
        assert!(parse_cell("3,7,9").is_err());
        assert!(parse_cell("-1,2").is_err());
    }

    #[test]
    fn test_parse_route() {
        let (start, goal) = parse_route("1,2:30,40").unwrap();
        assert_eq!(start, Cell::new(1, 2));
        assert_eq!(goal, Cell::new(30, 40));

        assert!(parse_route("1,2").is_err());
        assert!(parse_route("1,2:3,4:5,6").is_err());
    }

    #[test]
    fn test_class_chars_are_distinct() {
        let chars = [
            class_char(TerrainClass::Swamp),
            class_char(TerrainClass::Rough),
            class_char(TerrainClass::Water),
            class_char(TerrainClass::Grass),
            class_char(TerrainClass::Dirt),
            class_char(TerrainClass::Sand),
            class_char(TerrainClass::Lava),
            class_char(TerrainClass::Snow),
        ];
        let unique: HashSet<char> = chars.into_iter().collect();
        assert_eq!(unique.len(), chars.len());
    }
}
