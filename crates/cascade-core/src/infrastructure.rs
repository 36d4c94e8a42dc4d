//! Infrastructure networks and their elements.
//!
//! An [`InfrastructureLayer`] wraps one geometry layer from the
//! [`GeoStore`]. Each geometry record becomes one [`InfrastructureElement`]
//! located at the record's first vertex. The layer keeps an outage column
//! (`Outage` or `Outaged`, appended as text defaulting to `False` when
//! absent) and writes `True` into it for removed elements on save.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use cascade_types::{AttributeValue, FieldDescriptor, GeoLayer, InfrastructureKind, LatLon};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::asset::AssetList;
use crate::error::CoreError;
use crate::geostore::GeoStore;

/// Attribute names recognised as the outage column.
const OUTAGE_FIELDS: [&str; 2] = ["Outage", "Outaged"];

/// Name of the outage column when one has to be appended.
const APPENDED_OUTAGE_FIELD: &str = "Outaged";

/// Width of the appended outage column.
const OUTAGE_FIELD_SIZE: u16 = 60;

/// Probability that [`InfrastructureLayer::randomly_trash`] removes an element.
const TRASH_PROBABILITY: f64 = 0.5;

/// One node of a network: a bus, a plant, a line segment.
#[derive(Debug, Clone, PartialEq)]
pub struct InfrastructureElement {
    /// Element name.
    pub name: String,
    /// Position of the element's first vertex.
    pub location: LatLon,
    assets: Vec<String>,
    removed: bool,
}

impl InfrastructureElement {
    /// Create an intact element with no assets.
    pub const fn new(name: String, location: LatLon) -> Self {
        Self {
            name,
            location,
            assets: Vec::new(),
            removed: false,
        }
    }

    /// Attach every asset strictly closer than `radius` degrees.
    ///
    /// Replaces any previous attachment, so repeated linking is stable.
    /// Returns the number of attached assets.
    pub fn find_assets(&mut self, assets: &AssetList, radius: f64) -> usize {
        self.assets = assets
            .iter()
            .filter(|asset| self.location.degree_distance(asset.location) < radius)
            .map(|asset| asset.name.clone())
            .collect();
        self.assets.len()
    }

    /// Names of attached assets, in asset-name order.
    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    /// Whether the element has been removed.
    pub const fn is_removed(&self) -> bool {
        self.removed
    }

    /// Mark the element removed.
    pub const fn remove(&mut self) {
        self.removed = true;
    }
}

/// One network loaded from a geometry layer.
#[derive(Debug, Clone)]
pub struct InfrastructureLayer {
    kind: InfrastructureKind,
    source: PathBuf,
    table: GeoLayer,
    outage_column: usize,
    elements: Vec<InfrastructureElement>,
}

impl InfrastructureLayer {
    /// Open the layer at `source` from `store`.
    pub fn open(
        kind: InfrastructureKind,
        source: &Path,
        store: &dyn GeoStore,
    ) -> Result<Self, CoreError> {
        let table = store.open(source)?;
        Ok(Self::from_geo(kind, source, table))
    }

    /// Build a layer over an already opened geometry table.
    pub fn from_geo(kind: InfrastructureKind, source: &Path, mut table: GeoLayer) -> Self {
        let outage_column = ensure_outage_column(&mut table);
        let label = source
            .file_stem()
            .map_or_else(|| kind.name().to_owned(), |s| s.to_string_lossy().into_owned());
        let name_column = table.field_index(&["Name"]);

        let elements = table
            .shapes
            .iter()
            .enumerate()
            .map(|(index, shape)| {
                let name = name_column
                    .and_then(|column| table.attribute(index, column))
                    .and_then(AttributeValue::as_text)
                    .map_or_else(|| format!("{label}#{index}"), str::to_owned);
                let location = shape.first_position().unwrap_or_else(|| {
                    warn!(layer = label, index, "element has no geometry; it links no assets");
                    LatLon::new(f64::NAN, f64::NAN)
                });
                InfrastructureElement::new(name, location)
            })
            .collect::<Vec<_>>();

        info!(
            kind = %kind,
            source = %source.display(),
            elements = elements.len(),
            "Infrastructure layer loaded"
        );
        Self {
            kind,
            source: source.to_path_buf(),
            table,
            outage_column,
            elements,
        }
    }

    /// Network kind.
    pub const fn kind(&self) -> InfrastructureKind {
        self.kind
    }

    /// Path the layer was opened from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// The backing geometry table, including the outage column.
    pub const fn table(&self) -> &GeoLayer {
        &self.table
    }

    /// Index of the outage column in the table.
    pub const fn outage_column(&self) -> usize {
        self.outage_column
    }

    /// Elements in record order.
    pub fn elements(&self) -> &[InfrastructureElement] {
        &self.elements
    }

    /// Elements in record order, mutably.
    pub fn elements_mut(&mut self) -> &mut [InfrastructureElement] {
        &mut self.elements
    }

    /// Names of removed elements, in record order.
    pub fn removed_names(&self) -> Vec<String> {
        self.elements
            .iter()
            .filter(|e| e.is_removed())
            .map(|e| e.name.clone())
            .collect()
    }

    /// Write `True` into the outage column of every removed element.
    pub fn mark(&mut self) -> usize {
        let column = self.outage_column;
        let mut marked = 0_usize;
        for (element, record) in self.elements.iter().zip(self.table.records.iter_mut()) {
            if !element.is_removed() {
                continue;
            }
            if let Some(cell) = record.get_mut(column) {
                *cell = AttributeValue::from("True");
                marked = marked.saturating_add(1);
            }
        }
        marked
    }

    /// Where [`save`](Self::save) writes: the source path with `suffix`
    /// appended.
    pub fn output_path(&self, suffix: &str) -> PathBuf {
        let mut name = OsString::from(self.source.as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    }

    /// Mark removed elements and write the layer to `<source><suffix>`.
    pub fn save(&mut self, store: &mut dyn GeoStore, suffix: &str) -> Result<PathBuf, CoreError> {
        let marked = self.mark();
        let output = self.output_path(suffix);
        store.save(&output, &self.table)?;
        info!(
            kind = %self.kind,
            output = %output.display(),
            removed = marked,
            "Infrastructure layer saved"
        );
        Ok(output)
    }

    /// Remove each element with probability one half. Returns the number
    /// of newly removed elements.
    pub fn randomly_trash<R: Rng>(&mut self, rng: &mut R) -> usize {
        let mut trashed = 0_usize;
        for element in &mut self.elements {
            if rng.random::<f64>() > TRASH_PROBABILITY && !element.is_removed() {
                element.remove();
                trashed = trashed.saturating_add(1);
            }
        }
        debug!(source = %self.source.display(), trashed, "Layer randomly trashed");
        trashed
    }
}

/// Find the outage column, appending a `False`-filled text column if absent.
/// Short records are padded so every record has a cell in that column.
fn ensure_outage_column(table: &mut GeoLayer) -> usize {
    let column = table.field_index(&OUTAGE_FIELDS).unwrap_or_else(|| {
        table
            .fields
            .push(FieldDescriptor::text(APPENDED_OUTAGE_FIELD, OUTAGE_FIELD_SIZE));
        table.fields.len().saturating_sub(1)
    });
    for record in &mut table.records {
        while record.len() <= column {
            record.push(AttributeValue::from("False"));
        }
    }
    column
}

/// All infrastructure layers of a scenario, keyed by source path.
#[derive(Debug, Clone, Default)]
pub struct InfrastructureList {
    entries: BTreeMap<PathBuf, InfrastructureLayer>,
}

impl InfrastructureList {
    /// Create an empty list.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Open the layer at `source` and add it, replacing any layer from the
    /// same path.
    pub fn append(
        &mut self,
        kind: InfrastructureKind,
        source: &Path,
        store: &dyn GeoStore,
    ) -> Result<usize, CoreError> {
        let layer = InfrastructureLayer::open(kind, source, store)?;
        let count = layer.elements().len();
        self.insert(layer);
        Ok(count)
    }

    /// Insert a layer under its source path.
    pub fn insert(&mut self, layer: InfrastructureLayer) {
        let key = layer.source().to_path_buf();
        if self.entries.insert(key.clone(), layer).is_some() {
            debug!(source = %key.display(), "infrastructure layer reloaded");
        }
    }

    /// Look up a layer by source path.
    pub fn get(&self, source: &Path) -> Option<&InfrastructureLayer> {
        self.entries.get(source)
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate layers in source order.
    pub fn iter(&self) -> impl Iterator<Item = &InfrastructureLayer> {
        self.entries.values()
    }

    /// Iterate layers mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut InfrastructureLayer> {
        self.entries.values_mut()
    }
}
