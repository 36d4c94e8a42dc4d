//! The coupled scenario: four registries and the links between them.
//!
//! A [`CoupledContext`] is built from one scenario file. Its single
//! top-level record routes each recognised key to a loader:
//!
//! | Key                                        | Loads                          |
//! |--------------------------------------------|--------------------------------|
//! | `wind`, `flood`                            | Disaster description + geometry |
//! | `electricpowergrid`, `naturalgassystem`    | Infrastructure geometry layer  |
//! | `assets`                                   | Asset file                     |
//! | `fragilities`                              | Fragility file                 |
//! | `code winds`                               | ASCE 7 design wind table       |
//!
//! Relative paths resolve against the scenario file's directory. After
//! loading, three link passes run in a fixed order: infrastructure elements
//! find nearby assets, assets bind the fragility registry, and fragilities bind
//! their disaster layers. Each pass replaces the previous result, so
//! linking twice yields the same graph.

use std::path::{Path, PathBuf};

use cascade_hazard::{CodeWindTable, DisasterLayer, DisasterList, FragilityList};
use cascade_types::block;
use cascade_types::{DisasterKind, InfrastructureKind};
use tracing::{debug, info};

use crate::asset::AssetList;
use crate::config::EngineSettings;
use crate::error::CoreError;
use crate::geostore::GeoStore;
use crate::infrastructure::InfrastructureList;
use crate::render::{AssetMarker, Renderer};

/// Scenario key that loads the design wind table.
const CODE_WINDS_KEY: &str = "code winds";

/// A loaded scenario.
#[derive(Debug, Clone, Default)]
pub struct CoupledContext {
    /// Scenario name.
    pub name: String,
    /// Scenario description.
    pub description: String,
    /// Configuration format version.
    pub version: String,
    /// Scenario creation date.
    pub date: String,
    pub(crate) settings: EngineSettings,
    pub(crate) disasters: DisasterList,
    pub(crate) infrastructures: InfrastructureList,
    pub(crate) assets: AssetList,
    pub(crate) fragilities: FragilityList,
    pub(crate) code_winds: Option<CodeWindTable>,
    pub(crate) linked: bool,
}

/// Read a configuration text file, tagging errors with its path.
fn read_text(path: &Path) -> Result<String, CoreError> {
    std::fs::read_to_string(path).map_err(|source| CoreError::io(path, source))
}

/// The description file of a disaster layer: `<base>.txt`.
fn description_path(base: &Path) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(".txt");
    PathBuf::from(name)
}

impl CoupledContext {
    /// Create an empty, unlinked context.
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Load the scenario at `path` and run the link passes.
    pub fn load(
        path: &Path,
        store: &dyn GeoStore,
        settings: EngineSettings,
    ) -> Result<Self, CoreError> {
        let mut context = Self::new(settings);
        context.configure_from_file(path, store)?;
        context.link()?;
        Ok(context)
    }

    /// Parse the scenario file at `path`, resolving relative paths against
    /// its directory.
    pub fn configure_from_file(
        &mut self,
        path: &Path,
        store: &dyn GeoStore,
    ) -> Result<(), CoreError> {
        let text = read_text(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        info!(scenario = %path.display(), "Loading scenario");
        self.configure_from_text(&text, base, store)
    }

    /// Parse scenario text. Keys are applied in file order; relative paths
    /// resolve against `base`.
    pub fn configure_from_text(
        &mut self,
        text: &str,
        base: &Path,
        store: &dyn GeoStore,
    ) -> Result<(), CoreError> {
        let record = block::parse_first_record(text)?;
        for entry in record.iter() {
            let value = block::unquote(&entry.value);
            let key = entry.key.as_str();
            match key {
                "version" => value.clone_into(&mut self.version),
                "date" => value.clone_into(&mut self.date),
                "name" => value.clone_into(&mut self.name),
                "description" => value.clone_into(&mut self.description),
                "assets" => {
                    let file = base.join(value);
                    self.assets.append_from_text(&read_text(&file)?)?;
                }
                "fragilities" => {
                    let file = base.join(value);
                    self.fragilities.append_from_text(&read_text(&file)?)?;
                }
                CODE_WINDS_KEY => {
                    let file = base.join(value);
                    self.code_winds = Some(CodeWindTable::parse(&read_text(&file)?)?);
                }
                _ => {
                    if let Some(kind) = disaster_key(key) {
                        self.load_disaster(kind, &base.join(value), store)?;
                    } else if let Some(kind) = infrastructure_key(key) {
                        self.infrastructures
                            .append(kind, &base.join(value), store)?;
                    } else {
                        debug!(key, line = entry.line, "ignoring scenario key");
                    }
                }
            }
        }
        self.linked = false;
        Ok(())
    }

    /// Load a disaster layer: description from `<base>.txt`, geometry from
    /// the store at `<base>`.
    fn load_disaster(
        &mut self,
        kind: DisasterKind,
        base: &Path,
        store: &dyn GeoStore,
    ) -> Result<(), CoreError> {
        let description = read_text(&description_path(base))?;
        let geometry = store.open(base)?;
        self.disasters
            .append_from_description(&description, kind, &geometry)?;
        Ok(())
    }

    /// Run the three link passes in order.
    pub fn link(&mut self) -> Result<(), CoreError> {
        self.link_infrastructures_to_assets();
        self.link_assets_to_fragilities()?;
        self.link_fragilities_to_disasters()?;
        self.linked = true;
        Ok(())
    }

    /// Pass 1: attach to every element the assets within the proximity
    /// radius. Returns the total number of attachments.
    pub fn link_infrastructures_to_assets(&mut self) -> usize {
        let radius = self.settings.linking.proximity_radius_deg;
        let mut links = 0_usize;
        for layer in self.infrastructures.iter_mut() {
            for element in layer.elements_mut() {
                links = links.saturating_add(element.find_assets(&self.assets, radius));
            }
        }
        info!(links, radius, "Linked infrastructure elements to assets");
        links
    }

    /// Pass 2: validate every asset's fragility pairs and bind it to the
    /// whole fragility registry.
    pub fn link_assets_to_fragilities(&mut self) -> Result<usize, CoreError> {
        let mut links = 0_usize;
        for asset in self.assets.iter_mut() {
            links = links.saturating_add(asset.link_fragilities(&self.fragilities)?);
        }
        info!(links, "Linked assets to fragilities");
        Ok(links)
    }

    /// Pass 3: bind every fragility to the disaster layer of its type.
    pub fn link_fragilities_to_disasters(&mut self) -> Result<usize, CoreError> {
        let mut links = 0_usize;
        for (class, fragility) in self.fragilities.iter_mut() {
            let kind = fragility
                .disaster_type
                .parse::<DisasterKind>()
                .ok()
                .filter(|kind| self.disasters.contains(*kind))
                .ok_or_else(|| CoreError::UnresolvedDisaster {
                    fragility: class.clone(),
                    disaster: fragility.disaster_type.clone(),
                })?;
            fragility.link_disaster(kind);
            links = links.saturating_add(1);
        }
        info!(links, "Linked fragilities to disasters");
        Ok(links)
    }

    /// Whether the link passes have run since the last configuration change.
    pub const fn is_linked(&self) -> bool {
        self.linked
    }

    /// Engine settings in effect.
    pub const fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Disaster layers.
    pub const fn disasters(&self) -> &DisasterList {
        &self.disasters
    }

    /// Infrastructure layers.
    pub const fn infrastructures(&self) -> &InfrastructureList {
        &self.infrastructures
    }

    /// Infrastructure layers, mutably.
    pub const fn infrastructures_mut(&mut self) -> &mut InfrastructureList {
        &mut self.infrastructures
    }

    /// Assets.
    pub const fn assets(&self) -> &AssetList {
        &self.assets
    }

    /// Fragilities.
    pub const fn fragilities(&self) -> &FragilityList {
        &self.fragilities
    }

    /// The design wind table, if the scenario names one.
    pub const fn code_winds(&self) -> Option<&CodeWindTable> {
        self.code_winds.as_ref()
    }

    /// Hand every disaster layer and the asset markers to `renderer`.
    pub fn display(&self, renderer: &mut dyn Renderer) {
        for layer in self.disasters.iter() {
            match layer {
                DisasterLayer::Hurricane(hurricane) => {
                    for swath in hurricane.swaths() {
                        renderer.draw_lines(layer.name(), &swath.ring);
                    }
                }
                DisasterLayer::Flood(flood) => {
                    renderer.draw_contours(layer.name(), flood.samples());
                }
            }
        }
        let markers: Vec<AssetMarker> = self
            .assets
            .iter()
            .map(|asset| AssetMarker {
                name: asset.name.clone(),
                location: asset.location,
                destroyed: asset.destroyed(),
            })
            .collect();
        renderer.draw_points("Assets", &markers);
    }
}

/// The disaster kind a scenario key names, if any.
fn disaster_key(key: &str) -> Option<DisasterKind> {
    DisasterKind::ALL
        .into_iter()
        .find(|kind| kind.name().eq_ignore_ascii_case(key))
}

/// The infrastructure kind a scenario key names, if any.
fn infrastructure_key(key: &str) -> Option<InfrastructureKind> {
    InfrastructureKind::ALL
        .into_iter()
        .find(|kind| kind.name().eq_ignore_ascii_case(key))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cascade_types::{AttributeValue, FieldDescriptor, GeoLayer, LatLon, Shape};

    use super::*;
    use crate::geostore::MemoryGeoStore;

    #[derive(Default)]
    struct Recorder {
        lines: usize,
        contours: usize,
        points: Vec<AssetMarker>,
    }

    impl Renderer for Recorder {
        fn draw_lines(&mut self, _layer: &str, _ring: &[[f64; 2]]) {
            self.lines = self.lines.saturating_add(1);
        }

        fn draw_contours(&mut self, _layer: &str, _samples: &[([f64; 2], f64)]) {
            self.contours = self.contours.saturating_add(1);
        }

        fn draw_points(&mut self, _layer: &str, markers: &[AssetMarker]) {
            self.points.extend_from_slice(markers);
        }
    }

    #[test]
    fn scenario_keys_are_recognised_case_insensitively() {
        assert_eq!(disaster_key("wind"), Some(DisasterKind::Wind));
        assert_eq!(disaster_key("flood"), Some(DisasterKind::Flood));
        assert_eq!(
            infrastructure_key("electricpowergrid"),
            Some(InfrastructureKind::ElectricPowerGrid)
        );
        assert_eq!(disaster_key("assets"), None);
    }

    #[test]
    fn description_path_appends_txt() {
        assert_eq!(
            description_path(Path::new("data/ivan.v1")),
            PathBuf::from("data/ivan.v1.txt")
        );
    }

    #[test]
    fn header_keys_keep_last_value() {
        let store = MemoryGeoStore::new();
        let mut context = CoupledContext::default();
        let text = "version = 1\nname = 'First'\nname = 'Ivan'\ncolour = blue\nend\n";
        context
            .configure_from_text(text, Path::new(""), &store)
            .unwrap();
        assert_eq!(context.name, "Ivan");
        assert_eq!(context.version, "1");
    }

    #[test]
    fn infrastructure_layers_load_from_store() {
        let mut store = MemoryGeoStore::new();
        store.insert(
            "net/buses",
            GeoLayer {
                fields: vec![FieldDescriptor::text("Name", 10)],
                shapes: vec![Shape::point(LatLon::new(30.0, -85.0))],
                records: vec![vec![AttributeValue::from("b1")]],
            },
        );
        let mut context = CoupledContext::default();
        let text = "version = 1\nElectricPowerGrid = 'buses'\nend\n";
        context
            .configure_from_text(text, Path::new("net"), &store)
            .unwrap();
        assert_eq!(context.infrastructures().len(), 1);
        assert!(!context.is_linked());
    }

    #[test]
    fn missing_end_is_a_format_error() {
        let store = MemoryGeoStore::new();
        let mut context = CoupledContext::default();
        let err = context
            .configure_from_text("version = 1\nname = x\n", Path::new(""), &store)
            .unwrap_err();
        assert!(matches!(err, CoreError::Block(_)));
    }

    #[test]
    fn unresolved_disaster_fails_linking() {
        let mut context = CoupledContext::default();
        context
            .fragilities
            .append_from_text(
                "version = 1\nfragility type = 'Threshold'\nfragility class = 'Levee'\n\
                 disaster type = 'Flood'\nthreshold = 0.5\nend\n",
            )
            .unwrap();
        let err = context.link().unwrap_err();
        assert!(matches!(err, CoreError::UnresolvedDisaster { .. }));
        assert!(!context.is_linked());
    }

    #[test]
    fn display_feeds_renderer() {
        let mut context = CoupledContext::default();
        context.disasters.insert(DisasterLayer::Hurricane(
            cascade_hazard::Hurricane::from_swaths(
                "Wind",
                vec![cascade_hazard::WindSwath {
                    ring: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]],
                    wind_kt: 50.0,
                }],
            ),
        ));
        context
            .assets
            .insert(crate::asset::Asset::new("a", LatLon::new(0.5, 0.5)));

        let mut recorder = Recorder::default();
        context.display(&mut recorder);
        assert_eq!(recorder.lines, 1);
        assert_eq!(recorder.contours, 0);
        assert_eq!(recorder.points.len(), 1);
        assert!(!recorder.points[0].destroyed);
    }
}
