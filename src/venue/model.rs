use std::sync::mpsc::{self, Receiver, Sender};

use serde_json::json;

use crate::logging::{LogLevel, Logger, emit, json_kv};

use super::area::{Area, AreaCatalog, Floor};

const VENUE_TARGET: &str = "eppa::venue";

/// Session-scoped view state of the map.
///
/// When `active_area` is set it always names an area on `active_floor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapViewState {
    pub active_floor: Floor,
    pub active_area: Option<String>,
}

/// Effective transition broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapChange {
    FloorChanged {
        floor: Floor,
        cleared: Option<String>,
    },
    AreaSelected {
        area_id: String,
    },
    SelectionCleared {
        area_id: String,
    },
}

/// Label and description of the selected area, as shown on the info card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionSummary<'a> {
    pub floor: Floor,
    pub label: &'a str,
    pub description: &'a str,
}

/// Venue map model: the area catalogue plus the view state the renderer
/// draws from.
pub struct VenueMap {
    catalog: AreaCatalog,
    state: MapViewState,
    revision: u64,
    subscribers: Vec<Sender<MapChange>>,
    logger: Option<Logger>,
}

impl VenueMap {
    pub fn new(catalog: AreaCatalog) -> Self {
        let state = MapViewState {
            active_floor: catalog.lowest_floor(),
            active_area: None,
        };
        Self {
            catalog,
            state,
            revision: 0,
            subscribers: Vec::new(),
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn catalog(&self) -> &AreaCatalog {
        &self.catalog
    }

    pub fn state(&self) -> &MapViewState {
        &self.state
    }

    pub fn active_floor(&self) -> Floor {
        self.state.active_floor
    }

    pub fn active_area(&self) -> Option<&str> {
        self.state.active_area.as_deref()
    }

    /// Bumped once per effective transition; lets renderers poll for changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Receive every effective transition from now on.
    pub fn subscribe(&mut self) -> Receiver<MapChange> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Show `floor` and drop any selection. Returns whether state changed.
    pub fn select_floor(&mut self, floor: Floor) -> bool {
        let cleared = self.state.active_area.take();
        if floor == self.state.active_floor {
            return match cleared {
                Some(area_id) => {
                    self.commit(MapChange::SelectionCleared { area_id });
                    true
                }
                None => false,
            };
        }

        self.state.active_floor = floor;
        self.commit(MapChange::FloorChanged { floor, cleared });
        true
    }

    /// Toggle selection of an area on the active floor. Identifiers that are
    /// unknown or belong to another floor leave the state untouched.
    pub fn select_area(&mut self, area_id: &str) -> bool {
        let on_active_floor = self
            .catalog
            .get(area_id)
            .is_some_and(|area| area.floor == self.state.active_floor);
        if !on_active_floor {
            return false;
        }

        if self.state.active_area.as_deref() == Some(area_id) {
            self.state.active_area = None;
            self.commit(MapChange::SelectionCleared {
                area_id: area_id.to_string(),
            });
        } else {
            self.state.active_area = Some(area_id.to_string());
            self.commit(MapChange::AreaSelected {
                area_id: area_id.to_string(),
            });
        }
        true
    }

    /// Close the info card.
    pub fn clear_selection(&mut self) -> bool {
        match self.state.active_area.take() {
            Some(area_id) => {
                self.commit(MapChange::SelectionCleared { area_id });
                true
            }
            None => false,
        }
    }

    /// Areas of `floor` in declaration order.
    pub fn areas_for_floor(&self, floor: Floor) -> Vec<&Area> {
        self.catalog.on_floor(floor).collect()
    }

    pub fn active_areas(&self) -> Vec<&Area> {
        self.areas_for_floor(self.state.active_floor)
    }

    pub fn area(&self, id: &str) -> Option<&Area> {
        self.catalog.get(id)
    }

    pub fn selected_area(&self) -> Option<&Area> {
        self.state
            .active_area
            .as_deref()
            .and_then(|id| self.catalog.get(id))
    }

    pub fn describe_selection(&self) -> Option<SelectionSummary<'_>> {
        self.selected_area().map(|area| SelectionSummary {
            floor: area.floor,
            label: &area.label,
            description: &area.description,
        })
    }

    fn commit(&mut self, change: MapChange) {
        self.revision += 1;
        self.log_change(&change);
        self.subscribers.retain(|tx| tx.send(change.clone()).is_ok());
    }

    fn log_change(&self, change: &MapChange) {
        let (message, mut fields) = match change {
            MapChange::FloorChanged { floor, cleared } => (
                "floor_changed",
                vec![
                    json_kv("floor", json!(floor.number())),
                    json_kv("cleared", json!(cleared)),
                ],
            ),
            MapChange::AreaSelected { area_id } => {
                ("area_selected", vec![json_kv("area", json!(area_id))])
            }
            MapChange::SelectionCleared { area_id } => {
                ("selection_cleared", vec![json_kv("area", json!(area_id))])
            }
        };
        fields.push(json_kv("revision", json!(self.revision)));
        emit(self.logger.as_ref(), LogLevel::Debug, VENUE_TARGET, message, fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemorySink;

    fn sample_map() -> VenueMap {
        let catalog = AreaCatalog::new(vec![
            Area::new("main", Floor::Ground, "Santuário Criativo", "Palestras sem pressa."),
            Area::new("lounge", Floor::Ground, "Oásis", "Respire e tome um chá."),
            Area::new("sala1", Floor::Upper, "Oficina de Ar", "Descompressão Criativa A"),
        ])
        .unwrap();
        VenueMap::new(catalog)
    }

    #[test]
    fn starts_on_lowest_floor_without_selection() {
        let map = sample_map();
        assert_eq!(map.active_floor(), Floor::Ground);
        assert_eq!(map.active_area(), None);
        assert_eq!(map.revision(), 0);
    }

    #[test]
    fn select_floor_always_clears_selection() {
        for floor in Floor::ALL {
            let mut map = sample_map();
            map.select_area("lounge");
            map.select_floor(floor);
            assert_eq!(map.active_floor(), floor);
            assert_eq!(map.active_area(), None);
        }
    }

    #[test]
    fn selecting_an_area_twice_toggles_it_off() {
        let mut map = sample_map();
        for area in map.active_areas().into_iter().map(|a| a.id.clone()).collect::<Vec<_>>() {
            assert!(map.select_area(&area));
            assert_eq!(map.active_area(), Some(area.as_str()));
            assert!(map.select_area(&area));
            assert_eq!(map.active_area(), None);
        }
    }

    #[test]
    fn off_floor_areas_are_ignored() {
        let mut map = sample_map();
        map.select_area("main");
        let before = map.revision();
        assert!(!map.select_area("sala1"));
        assert!(!map.select_area("nowhere"));
        assert_eq!(map.active_area(), Some("main"));
        assert_eq!(map.revision(), before);
    }

    #[test]
    fn every_off_floor_area_is_a_no_op_on_the_default_plan() {
        for floor in Floor::ALL {
            let mut map = VenueMap::new(AreaCatalog::eppa_default());
            map.select_floor(floor);
            let first = map.active_areas()[0].id.clone();
            map.select_area(&first);

            let others: Vec<String> = map
                .catalog()
                .iter()
                .filter(|area| area.floor != floor)
                .map(|area| area.id.clone())
                .collect();
            assert!(!others.is_empty());
            for id in others {
                assert!(!map.select_area(&id));
                assert_eq!(map.active_area(), Some(first.as_str()));
            }
        }
    }

    #[test]
    fn selecting_main_twice_ends_with_nothing_selected() {
        let mut map = VenueMap::new(AreaCatalog::eppa_default());
        map.select_area("main");
        map.select_area("main");
        assert_eq!(map.active_area(), None);
        assert_eq!(map.revision(), 2);
    }

    #[test]
    fn floor_switch_scenario() {
        let mut map = sample_map();
        map.select_area("lounge");
        assert_eq!(map.active_area(), Some("lounge"));

        map.select_floor(Floor::Upper);
        assert_eq!(map.active_floor(), Floor::Upper);
        assert_eq!(map.active_area(), None);

        assert!(!map.select_area("lounge"));
        assert_eq!(map.active_area(), None);
    }

    #[test]
    fn areas_for_floor_keeps_declaration_order() {
        let map = sample_map();
        let ids: Vec<_> = map
            .areas_for_floor(Floor::Ground)
            .into_iter()
            .map(|area| area.id.as_str())
            .collect();
        assert_eq!(ids, vec!["main", "lounge"]);
        assert_eq!(map.areas_for_floor(Floor::Upper).len(), 1);
    }

    #[test]
    fn describe_selection_reports_label_and_description() {
        let mut map = sample_map();
        assert!(map.describe_selection().is_none());
        map.select_area("lounge");
        let summary = map.describe_selection().unwrap();
        assert_eq!(summary.label, "Oásis");
        assert_eq!(summary.description, "Respire e tome um chá.");
        assert_eq!(summary.floor, Floor::Ground);
    }

    #[test]
    fn subscribers_receive_only_effective_changes() {
        let mut map = sample_map();
        let changes = map.subscribe();

        map.select_floor(Floor::Ground);
        map.select_area("sala1");
        map.select_area("main");
        map.select_floor(Floor::Upper);
        map.clear_selection();

        let received: Vec<_> = changes.try_iter().collect();
        assert_eq!(
            received,
            vec![
                MapChange::AreaSelected {
                    area_id: "main".to_string()
                },
                MapChange::FloorChanged {
                    floor: Floor::Upper,
                    cleared: Some("main".to_string()),
                },
            ]
        );
        assert_eq!(map.revision(), 2);
    }

    #[test]
    fn reselecting_current_floor_clears_selection_only() {
        let mut map = sample_map();
        let changes = map.subscribe();
        map.select_area("main");
        assert!(map.select_floor(Floor::Ground));
        assert_eq!(map.active_area(), None);
        assert_eq!(
            changes.try_iter().last(),
            Some(MapChange::SelectionCleared {
                area_id: "main".to_string()
            })
        );
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let mut map = sample_map();
        drop(map.subscribe());
        let live = map.subscribe();
        map.select_area("main");
        assert_eq!(map.subscribers.len(), 1);
        assert_eq!(live.try_iter().count(), 1);
    }

    #[test]
    fn transitions_are_logged() {
        let sink = MemorySink::new();
        let mut map = sample_map().with_logger(Logger::new(sink.clone()));
        map.select_area("main");
        map.select_floor(Floor::Upper);
        assert_eq!(
            sink.messages(),
            vec!["area_selected".to_string(), "floor_changed".to_string()]
        );
    }
}
