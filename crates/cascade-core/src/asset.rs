//! Assets: physical things at a position that a hazard can destroy.
//!
//! An [`Asset`] is built from one record of an asset file. Its
//! `fragility class` key lists `Disaster:Fragility` pairs, which the linker
//! validates. Linking then binds the asset to every key of the shared
//! fragility registry. Evaluation looks every key up in the shared
//! registries, so assets never hold references into them.
//!
//! Destruction is monotone: once [`Asset::is_destroyed`] returns `true` for
//! an asset, it returns `true` for the rest of the run without evaluating.

use std::collections::BTreeMap;

use cascade_hazard::{DisasterList, Fragility, FragilityList};
use cascade_types::block::{self, Entry, Record};
use cascade_types::{DestructionMode, DisasterKind, FragilityKind, LatLon};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::ThresholdConfig;
use crate::error::CoreError;

/// One `Disaster:Fragility` pair from an asset's `fragility class` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragilityPair {
    /// Disaster type name, e.g. `Wind`.
    pub disaster: String,
    /// Fragility class, or a fragility type name such as `WindCurves`.
    pub fragility: String,
}

/// Read-only registries and constants an asset is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    /// All fragilities, keyed by class.
    pub fragilities: &'a FragilityList,
    /// All disaster layers, keyed by kind.
    pub disasters: &'a DisasterList,
    /// Threshold derivation constants.
    pub thresholds: &'a ThresholdConfig,
}

impl EvaluationContext<'_> {
    /// The failure threshold of `fragility` against a `disaster` layer.
    ///
    /// Flood fragilities use the fixed flood constant; every other model
    /// derives its threshold from `criteria` at the configured roughness.
    pub fn threshold(
        &self,
        fragility: &Fragility,
        disaster: DisasterKind,
        criteria: f64,
    ) -> Result<f64, CoreError> {
        match disaster {
            DisasterKind::Flood => Ok(self.thresholds.flood_threshold),
            DisasterKind::Wind => {
                Ok(fragility.curve_threshold(criteria, self.thresholds.wind_roughness)?)
            }
        }
    }
}

/// A physical asset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Asset {
    /// Asset name; also the registry key.
    pub name: String,
    /// Asset class label.
    pub asset_class: String,
    /// Free-text description.
    pub description: String,
    /// Format version string from the record.
    pub version: String,
    /// Creation date string from the record.
    pub date: String,
    /// Position.
    pub location: LatLon,
    /// Declared `Disaster:Fragility` pairs, in file order.
    pub pairs: Vec<FragilityPair>,
    fragilities: Vec<String>,
    destroyed: bool,
}

impl Asset {
    /// Create an intact asset with no declared fragilities.
    pub fn new(name: &str, location: LatLon) -> Self {
        Self {
            name: name.to_owned(),
            location,
            ..Self::default()
        }
    }

    /// Build an asset from one asset-file record. Later keys win.
    pub fn from_record(record: &Record) -> Result<Self, CoreError> {
        let mut asset = Self::default();
        let mut named = false;
        for entry in record.iter() {
            let value = block::unquote(&entry.value);
            match entry.key.as_str() {
                "version" => value.clone_into(&mut asset.version),
                "date" => value.clone_into(&mut asset.date),
                "name" => {
                    value.clone_into(&mut asset.name);
                    named = true;
                }
                "description" => value.clone_into(&mut asset.description),
                "asset class" => value.clone_into(&mut asset.asset_class),
                "latitude" => asset.location.lat = parse_number(entry, value)?,
                "longitude" => asset.location.lon = parse_number(entry, value)?,
                "latlong" => asset.location = parse_lat_lon(entry, value)?,
                "fragility class" => asset.pairs = parse_pairs(entry, value)?,
                other => debug!(key = other, line = entry.line, "ignoring asset key"),
            }
        }
        if !named {
            return Err(CoreError::MissingKey {
                line: record.start_line,
                key: "name",
            });
        }
        Ok(asset)
    }

    /// Whether the asset has been destroyed.
    pub const fn destroyed(&self) -> bool {
        self.destroyed
    }

    /// Fragility registry keys bound by the linker.
    pub fn fragility_keys(&self) -> &[String] {
        &self.fragilities
    }

    /// Bind the asset to every fragility in the shared registry.
    ///
    /// Every registered fragility is checked during evaluation, whatever the
    /// asset's declared pairs say. The pairs are still validated: each must
    /// name a registered class, or a fragility type with at least one
    /// registered fragility for the pair's disaster. Relinking replaces the
    /// previous binding.
    pub fn link_fragilities(&mut self, list: &FragilityList) -> Result<usize, CoreError> {
        for pair in &self.pairs {
            if let Some(fragility) = list.get(&pair.fragility) {
                if !fragility.disaster_type.eq_ignore_ascii_case(&pair.disaster) {
                    warn!(
                        asset = self.name,
                        fragility = pair.fragility,
                        declared = pair.disaster,
                        actual = fragility.disaster_type,
                        "fragility pair names a different disaster than the fragility"
                    );
                }
                continue;
            }
            let by_type = pair.fragility.parse::<FragilityKind>().is_ok_and(|kind| {
                list.iter().any(|(_, f)| {
                    f.kind() == kind && f.disaster_type.eq_ignore_ascii_case(&pair.disaster)
                })
            });
            if !by_type {
                return Err(CoreError::UnresolvedFragility {
                    asset: self.name.clone(),
                    disaster: pair.disaster.clone(),
                    fragility: pair.fragility.clone(),
                });
            }
        }

        self.fragilities = list.iter().map(|(class, _)| class.clone()).collect();
        Ok(self.fragilities.len())
    }

    /// Decide whether the asset is destroyed, evaluating its fragilities in
    /// order and stopping at the first that fails it.
    ///
    /// - [`DestructionMode::SimpleThreshold`]: fails when the intensity
    ///   strictly exceeds the fragility's threshold.
    /// - [`DestructionMode::Stochastic`]: fails when a uniform draw from
    ///   `rng` is below the intensity.
    /// - [`DestructionMode::EverythingMustGo`]: always fails.
    ///
    /// An already destroyed asset returns `true` without evaluating.
    pub fn is_destroyed<R: Rng>(
        &mut self,
        ctx: &EvaluationContext<'_>,
        criteria: f64,
        mode: DestructionMode,
        rng: &mut R,
    ) -> Result<bool, CoreError> {
        if self.destroyed {
            return Ok(true);
        }
        for key in &self.fragilities {
            let fragility = ctx.fragilities.get(key).ok_or_else(|| CoreError::Dangling {
                owner: self.name.clone(),
                family: "fragility",
                name: key.clone(),
            })?;
            let kind = fragility
                .disaster()
                .ok_or_else(|| CoreError::NotLinked(fragility.vulnerability_class.clone()))?;
            let layer = ctx.disasters.get(kind).ok_or_else(|| CoreError::Dangling {
                owner: key.clone(),
                family: "disaster",
                name: kind.name().to_owned(),
            })?;
            let intensity = layer.intensity(self.location.lat, self.location.lon);

            let failed = match mode {
                DestructionMode::SimpleThreshold => {
                    let threshold = ctx.threshold(fragility, kind, criteria)?;
                    debug!(
                        asset = self.name,
                        fragility = key,
                        intensity,
                        threshold,
                        "threshold check"
                    );
                    intensity > threshold
                }
                DestructionMode::Stochastic => rng.random::<f64>() < intensity,
                DestructionMode::EverythingMustGo => true,
            };
            if failed {
                info!(
                    asset = self.name,
                    fragility = key,
                    disaster = %kind,
                    intensity,
                    unit = layer.unit(),
                    "Asset destroyed"
                );
                self.destroyed = true;
                break;
            }
        }
        Ok(self.destroyed)
    }
}

fn parse_number(entry: &Entry, token: &str) -> Result<f64, CoreError> {
    token.trim().parse().map_err(|_| CoreError::InvalidValue {
        line: entry.line,
        key: entry.key.clone(),
        value: token.to_owned(),
    })
}

fn parse_lat_lon(entry: &Entry, value: &str) -> Result<LatLon, CoreError> {
    let mut tokens = value.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(lat), Some(lon)) => Ok(LatLon::new(
            parse_number(entry, lat)?,
            parse_number(entry, lon)?,
        )),
        _ => Err(CoreError::InvalidValue {
            line: entry.line,
            key: entry.key.clone(),
            value: value.to_owned(),
        }),
    }
}

fn parse_pairs(entry: &Entry, value: &str) -> Result<Vec<FragilityPair>, CoreError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (disaster, fragility) =
                part.split_once(':').ok_or_else(|| CoreError::InvalidValue {
                    line: entry.line,
                    key: entry.key.clone(),
                    value: part.to_owned(),
                })?;
            Ok(FragilityPair {
                disaster: block::unquote(disaster).to_owned(),
                fragility: block::unquote(fragility).to_owned(),
            })
        })
        .collect()
}

/// All assets of a scenario, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct AssetList {
    entries: BTreeMap<String, Asset>,
}

impl AssetList {
    /// Create an empty list.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Parse every record of an asset file and add them to the list.
    ///
    /// All records are built before any is inserted, so a format error
    /// leaves the list unchanged. Returns the number of records added.
    pub fn append_from_text(&mut self, text: &str) -> Result<usize, CoreError> {
        let built = block::parse_records(text)?
            .iter()
            .map(Asset::from_record)
            .collect::<Result<Vec<_>, _>>()?;
        let count = built.len();
        for asset in built {
            self.insert(asset);
        }
        info!(count, total = self.entries.len(), "Assets loaded");
        Ok(count)
    }

    /// Insert an asset under its name, replacing any previous entry.
    pub fn insert(&mut self, asset: Asset) {
        let key = asset.name.clone();
        if self.entries.insert(key.clone(), asset).is_some() {
            debug!(asset = key, "asset redefined; later definition wins");
        }
    }

    /// Look up an asset by name.
    pub fn get(&self, name: &str) -> Option<&Asset> {
        self.entries.get(name)
    }

    /// Look up an asset by name for mutation.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Asset> {
        self.entries.get_mut(name)
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate assets in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.entries.values()
    }

    /// Iterate assets mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Asset> {
        self.entries.values_mut()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cascade_hazard::{DisasterLayer, Flood, Hurricane, WindSwath};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    const ASSETS: &str = "\
version = Hereld_2015-07-27
name = 'Substation 7'
asset class = 'substation'
latlong = 30.0 -85.0
fragility class = Wind:WoodFrame
end
version = Hereld_2015-07-27
name = 'Pump 2'
latitude = 29.5
longitude = -84.5
end
";

    /// Threshold fragility failing above `mph` gusts.
    fn threshold_fragility(class: &str, mph: f64) -> String {
        format!(
            "version = 1\nfragility type = 'Threshold'\nfragility class = '{class}'\n\
             disaster type = 'Wind'\nthreshold = {mph}\nunits = 'mph'\nend\n"
        )
    }

    fn registries(gust_kt: f64, threshold_mph: f64) -> (FragilityList, DisasterList) {
        let mut fragilities = FragilityList::new();
        fragilities
            .append_from_text(&threshold_fragility("WoodFrame", threshold_mph))
            .unwrap();
        for (_, f) in fragilities.iter_mut() {
            f.link_disaster(DisasterKind::Wind);
        }
        let mut disasters = DisasterList::new();
        disasters.insert(DisasterLayer::Hurricane(Hurricane::from_swaths(
            "Wind",
            vec![WindSwath {
                ring: vec![[-86.0, 29.0], [-84.0, 29.0], [-84.0, 31.0], [-86.0, 31.0]],
                wind_kt: gust_kt,
            }],
        )));
        (fragilities, disasters)
    }

    fn linked_asset(fragilities: &FragilityList) -> Asset {
        let mut list = AssetList::new();
        list.append_from_text(ASSETS).unwrap();
        let mut asset = list.get("Substation 7").unwrap().clone();
        asset.link_fragilities(fragilities).unwrap();
        asset
    }

    #[test]
    fn parses_asset_records() {
        let mut list = AssetList::new();
        assert_eq!(list.append_from_text(ASSETS).unwrap(), 2);

        let sub = list.get("Substation 7").unwrap();
        assert_eq!(sub.asset_class, "substation");
        assert!((sub.location.lat - 30.0).abs() < f64::EPSILON);
        assert!((sub.location.lon + 85.0).abs() < f64::EPSILON);
        assert_eq!(
            sub.pairs,
            vec![FragilityPair {
                disaster: "Wind".to_owned(),
                fragility: "WoodFrame".to_owned(),
            }]
        );

        let pump = list.get("Pump 2").unwrap();
        assert!((pump.location.lat - 29.5).abs() < f64::EPSILON);
        assert!(pump.pairs.is_empty());
    }

    #[test]
    fn repeated_key_keeps_last_value() {
        let text = "version = 1\nname = A\nlatitude = 10\nlatitude = 20\nend\n";
        let mut list = AssetList::new();
        list.append_from_text(text).unwrap();
        assert!((list.get("A").unwrap().location.lat - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn bad_coordinate_leaves_list_unchanged() {
        let text = format!("{ASSETS}version = 1\nname = B\nlatitude = north\nend\n");
        let mut list = AssetList::new();
        let err = list.append_from_text(&text).unwrap_err();
        assert!(matches!(err, CoreError::InvalidValue { line: 14, .. }));
        assert!(list.is_empty());
    }

    #[test]
    fn missing_name_is_an_error() {
        let mut list = AssetList::new();
        let err = list.append_from_text("version = 1\nlatitude = 1\nend\n").unwrap_err();
        assert!(matches!(err, CoreError::MissingKey { key: "name", .. }));
    }

    #[test]
    fn pair_without_colon_is_an_error() {
        let text = "version = 1\nname = A\nfragility class = WoodFrame\nend\n";
        let err = AssetList::new().append_from_text(text).unwrap_err();
        assert!(matches!(err, CoreError::InvalidValue { .. }));
    }

    #[test]
    fn linking_binds_the_whole_registry() {
        let mut fragilities = FragilityList::new();
        fragilities
            .append_from_text(&threshold_fragility("WoodFrame", 100.0))
            .unwrap();
        fragilities
            .append_from_text(&threshold_fragility("Steel", 200.0))
            .unwrap();
        let all = ["Steel".to_owned(), "WoodFrame".to_owned()];

        let mut by_class = Asset::new("a", LatLon::default());
        by_class.pairs = vec![FragilityPair {
            disaster: "Wind".to_owned(),
            fragility: "Steel".to_owned(),
        }];
        assert_eq!(by_class.link_fragilities(&fragilities).unwrap(), 2);
        assert_eq!(by_class.fragility_keys(), all);

        let mut by_type = Asset::new("b", LatLon::default());
        by_type.pairs = vec![FragilityPair {
            disaster: "Wind".to_owned(),
            fragility: "Threshold".to_owned(),
        }];
        assert_eq!(by_type.link_fragilities(&fragilities).unwrap(), 2);

        let mut unpaired = Asset::new("c", LatLon::default());
        assert_eq!(unpaired.link_fragilities(&fragilities).unwrap(), 2);
        // Relinking replaces rather than accumulates.
        assert_eq!(unpaired.link_fragilities(&fragilities).unwrap(), 2);
        assert_eq!(unpaired.fragility_keys(), all);
    }

    #[test]
    fn unnamed_fragility_in_registry_still_destroys() {
        // The asset names only the strong class, but the weak one is
        // registered too and fails under a 149.6 mph gust.
        let mut fragilities = FragilityList::new();
        fragilities
            .append_from_text(&threshold_fragility("Strong", 1000.0))
            .unwrap();
        fragilities
            .append_from_text(&threshold_fragility("Weak", 10.0))
            .unwrap();
        for (_, f) in fragilities.iter_mut() {
            f.link_disaster(DisasterKind::Wind);
        }
        let (_, disasters) = registries(100.0, 1000.0);
        let thresholds = ThresholdConfig::default();
        let ctx = EvaluationContext {
            fragilities: &fragilities,
            disasters: &disasters,
            thresholds: &thresholds,
        };

        let mut asset = Asset::new("pole", LatLon::new(30.0, -85.0));
        asset.pairs = vec![FragilityPair {
            disaster: "Wind".to_owned(),
            fragility: "Strong".to_owned(),
        }];
        asset.link_fragilities(&fragilities).unwrap();
        assert_eq!(
            asset.fragility_keys(),
            ["Strong".to_owned(), "Weak".to_owned()]
        );

        let mut rng = StdRng::seed_from_u64(1);
        assert!(
            asset
                .is_destroyed(&ctx, 0.5, DestructionMode::SimpleThreshold, &mut rng)
                .unwrap()
        );
    }

    #[test]
    fn unresolvable_pair_is_an_error() {
        let fragilities = FragilityList::new();
        let mut asset = Asset::new("a", LatLon::default());
        asset.pairs = vec![FragilityPair {
            disaster: "Wind".to_owned(),
            fragility: "Adobe".to_owned(),
        }];
        let err = asset.link_fragilities(&fragilities).unwrap_err();
        assert!(matches!(err, CoreError::UnresolvedFragility { .. }));
    }

    #[test]
    fn simple_threshold_is_strict() {
        // 100 kt sustained is a 149.6 mph gust.
        let gust = cascade_hazard::knots_to_gust_mph(100.0);
        let thresholds = ThresholdConfig::default();
        let mut rng = StdRng::seed_from_u64(1);

        let (fragilities, disasters) = registries(100.0, gust);
        let ctx = EvaluationContext {
            fragilities: &fragilities,
            disasters: &disasters,
            thresholds: &thresholds,
        };
        let mut at_threshold = linked_asset(&fragilities);
        assert!(
            !at_threshold
                .is_destroyed(&ctx, 0.5, DestructionMode::SimpleThreshold, &mut rng)
                .unwrap()
        );

        let (fragilities, disasters) = registries(100.0, gust - 1.0);
        let ctx = EvaluationContext {
            fragilities: &fragilities,
            disasters: &disasters,
            thresholds: &thresholds,
        };
        let mut above = linked_asset(&fragilities);
        assert!(
            above
                .is_destroyed(&ctx, 0.5, DestructionMode::SimpleThreshold, &mut rng)
                .unwrap()
        );
        assert!(above.destroyed());
    }

    #[test]
    fn destruction_is_monotone() {
        let thresholds = ThresholdConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        let (fragilities, disasters) = registries(100.0, 100.0);
        let ctx = EvaluationContext {
            fragilities: &fragilities,
            disasters: &disasters,
            thresholds: &thresholds,
        };
        let mut asset = linked_asset(&fragilities);
        assert!(asset.is_destroyed(&ctx, 0.5, DestructionMode::SimpleThreshold, &mut rng).unwrap());

        // A calm field cannot resurrect it.
        let (calm_fragilities, calm_disasters) = registries(0.0, 100.0);
        let calm = EvaluationContext {
            fragilities: &calm_fragilities,
            disasters: &calm_disasters,
            thresholds: &thresholds,
        };
        assert!(asset.is_destroyed(&calm, 0.5, DestructionMode::SimpleThreshold, &mut rng).unwrap());
    }

    #[test]
    fn everything_must_go_destroys_unconditionally() {
        let thresholds = ThresholdConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        let (fragilities, disasters) = registries(0.0, 1000.0);
        let ctx = EvaluationContext {
            fragilities: &fragilities,
            disasters: &disasters,
            thresholds: &thresholds,
        };
        let mut asset = linked_asset(&fragilities);
        assert!(asset.is_destroyed(&ctx, 0.5, DestructionMode::EverythingMustGo, &mut rng).unwrap());
    }

    #[test]
    fn stochastic_mode_uses_intensity_as_probability() {
        let thresholds = ThresholdConfig::default();
        let mut fragilities = FragilityList::new();
        let text = "version = 1\nfragility type = 'Threshold'\nfragility class = 'Levee'\n\
                    disaster type = 'Flood'\nthreshold = 0.5\nend\n";
        fragilities.append_from_text(text).unwrap();
        for (_, f) in fragilities.iter_mut() {
            f.link_disaster(DisasterKind::Flood);
        }
        let corners = [[-86.0, 29.0], [-84.0, 29.0], [-86.0, 31.0], [-84.0, 31.0]];
        let certain: Vec<([f64; 2], f64)> = corners.iter().map(|&p| (p, 1.0)).collect();
        let impossible: Vec<([f64; 2], f64)> = corners.iter().map(|&p| (p, 0.0)).collect();

        let mut rng = StdRng::seed_from_u64(42);
        for (samples, expected) in [(certain, true), (impossible, false)] {
            let mut disasters = DisasterList::new();
            disasters.insert(DisasterLayer::Flood(Flood::from_samples("Flood", samples)));
            let ctx = EvaluationContext {
                fragilities: &fragilities,
                disasters: &disasters,
                thresholds: &thresholds,
            };
            let mut asset = Asset::new("levee", LatLon::new(30.0, -85.0));
            asset.link_fragilities(&fragilities).unwrap();
            let destroyed = asset
                .is_destroyed(&ctx, 0.5, DestructionMode::Stochastic, &mut rng)
                .unwrap();
            assert_eq!(destroyed, expected);
        }
    }

    #[test]
    fn flood_uses_fixed_threshold() {
        let thresholds = ThresholdConfig {
            flood_threshold: 0.4,
            ..ThresholdConfig::default()
        };
        let mut fragilities = FragilityList::new();
        // The record's own threshold is ignored for flood.
        let text = "version = 1\nfragility type = 'Threshold'\nfragility class = 'Levee'\n\
                    disaster type = 'Flood'\nthreshold = 0.9\nend\n";
        fragilities.append_from_text(text).unwrap();
        for (_, f) in fragilities.iter_mut() {
            f.link_disaster(DisasterKind::Flood);
        }
        let samples = [[-86.0, 29.0], [-84.0, 29.0], [-86.0, 31.0], [-84.0, 31.0]]
            .iter()
            .map(|&p| (p, 0.5))
            .collect();
        let mut disasters = DisasterList::new();
        disasters.insert(DisasterLayer::Flood(Flood::from_samples("Flood", samples)));
        let ctx = EvaluationContext {
            fragilities: &fragilities,
            disasters: &disasters,
            thresholds: &thresholds,
        };
        let mut asset = Asset::new("levee", LatLon::new(30.0, -85.0));
        asset.link_fragilities(&fragilities).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(asset.is_destroyed(&ctx, 0.5, DestructionMode::SimpleThreshold, &mut rng).unwrap());
    }

    #[test]
    fn unlinked_fragility_is_an_error() {
        let thresholds = ThresholdConfig::default();
        let mut fragilities = FragilityList::new();
        fragilities
            .append_from_text(&threshold_fragility("WoodFrame", 100.0))
            .unwrap();
        let disasters = DisasterList::new();
        let ctx = EvaluationContext {
            fragilities: &fragilities,
            disasters: &disasters,
            thresholds: &thresholds,
        };
        let mut asset = linked_asset(&fragilities);
        let mut rng = StdRng::seed_from_u64(1);
        let err = asset
            .is_destroyed(&ctx, 0.5, DestructionMode::SimpleThreshold, &mut rng)
            .unwrap_err();
        assert!(matches!(err, CoreError::NotLinked(_)));
    }
}
