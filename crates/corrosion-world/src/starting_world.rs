//! Default starting world for the headless host.
//!
//! Three planets and a handful of grids chosen to exercise every aging
//! rule: an exposed outpost with a sealed interior, a respawn rover, a
//! concrete bunker, a powered base, a ship parked in a sealed hangar, a
//! station inside a safe zone, an outpost on Triton with protective
//! paint, and a lander on a moon no zone config matches.

use corrosion_types::{BoundingSphere, GridCell, SessionRole, StructureId, WorldPoint, ZoneId, ZoneInfo};

use crate::error::WorldError;
use crate::grid::{Grid, extent_cells};
use crate::world_map::WorldMap;

/// Subtype used for plain armor blocks.
pub const ARMOR_SUBTYPE: &str = "LargeBlockArmorBlock";

const EARTH_RADIUS: f64 = 60_000.0;
const SURFACE: f64 = EARTH_RADIUS + 10.0;

/// Identifiers for the starting planets and grids.
#[derive(Debug, Clone)]
pub struct StartingWorldIds {
    /// EarthLike planet.
    pub earth: ZoneId,
    /// Triton planet.
    pub triton: ZoneId,
    /// A moon with no matching zone config.
    pub moon: ZoneId,
    /// 5x5x5 armor shell with a sealed interior and an inner pillar.
    pub outpost: StructureId,
    /// Four-block respawn rover.
    pub rover: StructureId,
    /// 2x2x2 concrete bunker.
    pub bunker: StructureId,
    /// 2x2x2 powered base.
    pub base: StructureId,
    /// Hangar with a sealed bay.
    pub hangar: StructureId,
    /// Small ship parked inside the hangar bay.
    pub ship: StructureId,
    /// Station inside a safe zone.
    pub station: StructureId,
    /// Outpost on Triton painted with a protective stage.
    pub triton_outpost: StructureId,
    /// Lander on the moon.
    pub lander: StructureId,
}

fn planet(name: &str, center: WorldPoint, radius: f64, atmosphere: f64) -> ZoneInfo {
    ZoneInfo {
        id: ZoneId::new(),
        name: name.to_owned(),
        center,
        average_radius: radius,
        atmosphere_altitude: atmosphere,
    }
}

fn surface_point(x: f64) -> WorldPoint {
    WorldPoint::new(x, SURFACE, 0.0)
}

/// Fill the inclusive box `min..=max` with one-cell armor blocks.
fn fill_box(grid: &mut Grid, min: GridCell, max: GridCell, skin: &str) -> Result<(), WorldError> {
    for cell in extent_cells(min, max) {
        grid.add_armor(cell, skin, ARMOR_SUBTYPE)?;
    }
    Ok(())
}

/// An `size`-wide cube shell of armor whose interior is a sealed room,
/// with one pillar block standing in the middle of the floor.
fn outpost(size: i32) -> Result<Grid, WorldError> {
    let mut grid = Grid::new("Outpost", BoundingSphere::new(surface_point(0.0), 8.0));
    let last = size.saturating_sub(1);
    let interior_min = GridCell::new(1, 1, 1);
    let interior_max = GridCell::new(last.saturating_sub(1), last.saturating_sub(1), last.saturating_sub(1));

    for cell in extent_cells(GridCell::new(0, 0, 0), GridCell::new(last, last, last)) {
        if !cell.within(interior_min, interior_max) {
            grid.add_armor(cell, "", ARMOR_SUBTYPE)?;
        }
    }

    let pillar = GridCell::new(size / 2, 1, size / 2);
    grid.add_armor(pillar, "", ARMOR_SUBTYPE)?;
    grid.seal_cells(
        extent_cells(interior_min, interior_max)
            .into_iter()
            .filter(|cell| *cell != pillar),
    );
    Ok(grid)
}

/// Build the default starting world with an offline session loaded.
///
/// # Errors
///
/// Returns [`WorldError`] if any grid cannot be assembled.
pub fn create_starting_world() -> Result<(WorldMap, StartingWorldIds), WorldError> {
    let mut world = WorldMap::new();
    world.set_session(Some(SessionRole::Offline));

    let earth = world.add_zone(planet("EarthLike", WorldPoint::ORIGIN, EARTH_RADIUS, 8_000.0))?;
    let triton_center = WorldPoint::new(1_000_000.0, 0.0, 0.0);
    let triton = world.add_zone(planet("Triton", triton_center, 40_000.0, 5_000.0))?;
    let moon_center = WorldPoint::new(0.0, 0.0, 400_000.0);
    let moon = world.add_zone(planet("Moon", moon_center, 9_500.0, 0.0))?;

    let outpost = world.add_grid(outpost(5)?)?;

    let mut rover = Grid::new("Respawn Rover", BoundingSphere::new(surface_point(100.0), 3.0));
    rover.set_respawn(true);
    fill_box(&mut rover, GridCell::new(0, 0, 0), GridCell::new(3, 0, 0), "")?;
    let rover = world.add_grid(rover)?;

    let mut bunker = Grid::new("Bunker", BoundingSphere::new(surface_point(200.0), 3.0));
    fill_box(&mut bunker, GridCell::new(0, 0, 0), GridCell::new(1, 1, 1), "Concrete_Armor")?;
    let bunker = world.add_grid(bunker)?;

    let mut base = Grid::new("Powered Base", BoundingSphere::new(surface_point(300.0), 3.0));
    base.set_powered(true);
    fill_box(&mut base, GridCell::new(0, 0, 0), GridCell::new(1, 1, 1), "")?;
    let base = world.add_grid(base)?;

    let bay_center = surface_point(500.0);
    let mut hangar = Grid::new("Hangar", BoundingSphere::new(bay_center, 40.0));
    fill_box(&mut hangar, GridCell::new(0, 0, 0), GridCell::new(3, 0, 3), "")?;
    hangar.seal_room(BoundingSphere::new(bay_center, 20.0));
    let hangar = world.add_grid(hangar)?;

    let mut ship = Grid::new("Parked Ship", BoundingSphere::new(bay_center, 5.0));
    fill_box(&mut ship, GridCell::new(0, 0, 0), GridCell::new(2, 0, 0), "")?;
    let ship = world.add_grid(ship)?;

    let station_center = surface_point(800.0);
    let mut station = Grid::new("Trade Station", BoundingSphere::new(station_center, 3.0));
    fill_box(&mut station, GridCell::new(0, 0, 0), GridCell::new(1, 1, 1), "")?;
    let station = world.add_grid(station)?;
    world.add_safe_zone(BoundingSphere::new(station_center, 50.0));

    let triton_surface = WorldPoint::new(triton_center.x, 40_010.0, 0.0);
    let mut triton_outpost = Grid::new("Ice Camp", BoundingSphere::new(triton_surface, 3.0));
    fill_box(&mut triton_outpost, GridCell::new(0, 0, 0), GridCell::new(1, 1, 0), "Clean_Armor")?;
    let triton_outpost = world.add_grid(triton_outpost)?;

    // The moon has no atmosphere, so the lander has to touch its surface.
    let lander_at = WorldPoint::new(0.0, 0.0, moon_center.z + 9_502.0);
    let mut lander = Grid::new("Lander", BoundingSphere::new(lander_at, 3.0));
    fill_box(&mut lander, GridCell::new(0, 0, 0), GridCell::new(1, 0, 0), "")?;
    let lander = world.add_grid(lander)?;

    let ids = StartingWorldIds {
        earth,
        triton,
        moon,
        outpost,
        rover,
        bunker,
        base,
        hangar,
        ship,
        station,
        triton_outpost,
        lander,
    };
    Ok((world, ids))
}
