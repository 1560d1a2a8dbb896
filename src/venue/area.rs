use std::collections::HashSet;

use thiserror::Error;

/// Floors of the venue. The set is closed, so an unknown floor cannot be
/// expressed by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Floor {
    Ground,
    Upper,
}

impl Floor {
    /// Every floor, lowest first.
    pub const ALL: [Floor; 2] = [Floor::Ground, Floor::Upper];

    pub fn number(self) -> u8 {
        match self {
            Floor::Ground => 1,
            Floor::Upper => 2,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|floor| floor.number() == number)
    }

    pub fn label(self) -> &'static str {
        match self {
            Floor::Ground => "Térreo",
            Floor::Upper => "Superior",
        }
    }

    /// Theme printed on the floor plate.
    pub fn theme(self) -> &'static str {
        match self {
            Floor::Ground => "Conexão",
            Floor::Upper => "Reflexão",
        }
    }
}

/// Symbolic category of an area; only the renderer cares about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaIcon {
    Stage,
    Tea,
    Gallery,
    Entrance,
    Workshop,
    Mentoring,
    Reading,
    Press,
    Staff,
}

impl AreaIcon {
    pub fn glyph(self) -> char {
        match self {
            AreaIcon::Stage => '*',
            AreaIcon::Tea => '~',
            AreaIcon::Gallery => '!',
            AreaIcon::Entrance => '>',
            AreaIcon::Workshop => '/',
            AreaIcon::Mentoring => '&',
            AreaIcon::Reading => '=',
            AreaIcon::Press => '#',
            AreaIcon::Staff => '+',
        }
    }
}

/// Position and size on the floor plate, in percent of the plate (0..=100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlateRect {
    pub x: u8,
    pub y: u8,
    pub w: u8,
    pub h: u8,
}

impl PlateRect {
    pub const fn new(x: u8, y: u8, w: u8, h: u8) -> Self {
        Self { x, y, w, h }
    }
}

/// A named, described zone within a venue floor plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Area {
    pub id: String,
    pub floor: Floor,
    pub label: String,
    pub description: String,
    pub icon: AreaIcon,
    pub plate: PlateRect,
    /// Relative stacking depth; higher paints on top.
    pub depth: u8,
}

impl Area {
    pub fn new(
        id: impl Into<String>,
        floor: Floor,
        label: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            floor,
            label: label.into(),
            description: description.into(),
            icon: AreaIcon::Stage,
            plate: PlateRect::new(0, 0, 100, 100),
            depth: 20,
        }
    }

    pub fn with_icon(mut self, icon: AreaIcon) -> Self {
        self.icon = icon;
        self
    }

    pub fn with_plate(mut self, plate: PlateRect) -> Self {
        self.plate = plate;
        self
    }

    pub fn with_depth(mut self, depth: u8) -> Self {
        self.depth = depth;
        self
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("area id `{0}` is declared more than once")]
    DuplicateArea(String),
}

/// Immutable, declaration-ordered set of areas with unique identifiers.
#[derive(Debug, Clone)]
pub struct AreaCatalog {
    areas: Vec<Area>,
}

impl AreaCatalog {
    pub fn new(areas: Vec<Area>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for area in &areas {
            if !seen.insert(area.id.as_str()) {
                return Err(CatalogError::DuplicateArea(area.id.clone()));
            }
        }
        Ok(Self { areas })
    }

    /// The EPPA 2025 floor plan at Hotel Bourbon.
    pub fn eppa_default() -> Self {
        Self {
            areas: default_areas(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Area> {
        self.areas.iter().find(|area| area.id == id)
    }

    pub fn on_floor(&self, floor: Floor) -> impl Iterator<Item = &Area> + '_ {
        self.areas.iter().filter(move |area| area.floor == floor)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Area> + '_ {
        self.areas.iter()
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// Lowest floor that holds an area, or the ground floor for an empty plan.
    pub fn lowest_floor(&self) -> Floor {
        self.areas
            .iter()
            .map(|area| area.floor)
            .min()
            .unwrap_or(Floor::Ground)
    }
}

fn default_areas() -> Vec<Area> {
    use AreaIcon::*;
    use Floor::*;

    vec![
        Area::new("main", Ground, "Santuário Criativo", "Palestras sem pressa e conversas profundas.")
            .with_icon(Stage)
            .with_plate(PlateRect::new(15, 10, 50, 60))
            .with_depth(30),
        Area::new("lounge", Ground, "Oásis (No-Wifi)", "Área de desconexão. Respire e tome um chá.")
            .with_icon(Tea)
            .with_plate(PlateRect::new(70, 10, 25, 40)),
        Area::new("expo", Ground, "Galeria da Calma", "Exposição de arte contemplativa.")
            .with_icon(Gallery)
            .with_plate(PlateRect::new(15, 75, 50, 20))
            .with_depth(15),
        Area::new("welcome", Ground, "Boas-vindas", "Check-in humanizado.")
            .with_icon(Entrance)
            .with_plate(PlateRect::new(70, 55, 25, 40)),
        Area::new("sala1", Upper, "Oficina de Ar", "Descompressão Criativa A")
            .with_icon(Workshop)
            .with_plate(PlateRect::new(10, 10, 25, 40)),
        Area::new("sala2", Upper, "Oficina de Terra", "Descompressão Criativa B")
            .with_icon(Workshop)
            .with_plate(PlateRect::new(38, 10, 25, 40)),
        Area::new("sala3", Upper, "Sala Zen", "Mentoria humanizada e escuta ativa.")
            .with_icon(Mentoring)
            .with_plate(PlateRect::new(66, 10, 25, 40)),
        Area::new("sala4", Upper, "Sala Silêncio", "Leitura e meditação.")
            .with_icon(Reading)
            .with_plate(PlateRect::new(10, 55, 25, 40)),
        Area::new("sala5", Upper, "Imprensa Slow", "Cobertura consciente do evento.")
            .with_icon(Press)
            .with_plate(PlateRect::new(38, 55, 25, 40)),
        Area::new("sala6", Upper, "Apoio", "Staff e cuidado.")
            .with_icon(Staff)
            .with_plate(PlateRect::new(66, 55, 25, 40)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_numbers_round_trip_for_known_floors_only() {
        assert_eq!(Floor::from_number(1), Some(Floor::Ground));
        assert_eq!(Floor::from_number(2), Some(Floor::Upper));
        assert_eq!(Floor::from_number(3), None);
        assert_eq!(Floor::from_number(0), None);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = AreaCatalog::new(vec![
            Area::new("main", Floor::Ground, "A", "a"),
            Area::new("main", Floor::Upper, "B", "b"),
        ])
        .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateArea("main".to_string()));
    }

    #[test]
    fn default_catalogue_is_valid_and_split_by_floor() {
        let catalog = AreaCatalog::eppa_default();
        assert!(AreaCatalog::new(catalog.iter().cloned().collect()).is_ok());
        assert_eq!(catalog.len(), 10);
        assert_eq!(catalog.on_floor(Floor::Ground).count(), 4);
        assert_eq!(catalog.on_floor(Floor::Upper).count(), 6);
        assert_eq!(catalog.lowest_floor(), Floor::Ground);
        assert_eq!(catalog.get("sala3").map(|a| a.label.as_str()), Some("Sala Zen"));
    }

    #[test]
    fn lowest_floor_follows_declared_areas() {
        let catalog =
            AreaCatalog::new(vec![Area::new("sala1", Floor::Upper, "Oficina", "")]).unwrap();
        assert_eq!(catalog.lowest_floor(), Floor::Upper);
        assert_eq!(AreaCatalog::new(Vec::new()).unwrap().lowest_floor(), Floor::Ground);
    }
}
