//! The stateful per-territory layer.
//!
//! A [`TerritoryProjectionSet`] owns one projection per territory together
//! with a [`TerritoryPlacement`] describing where and how large the
//! territory is drawn. Edits change placements (never accumulated state on
//! the projection itself) and drop the cached composite; [`build`] derives
//! every projection's scale, translate and clip extent from scratch and
//! rebuilds the composite.
//!
//! [`build`]: TerritoryProjectionSet::build

use std::rc::Rc;

use indexmap::IndexMap;
use log::{debug, info};

use inset_core::{
    geometry::{ClipExtent, GeoBounds, GeoPoint, ScreenPoint, ScreenRect},
    identifier::Id,
    projection::{ConfiguredProjection, FamilyKind, Projection, ProjectionFamily, Rotation},
};

use crate::{
    InsetError, clip_extent,
    composite::{CompositeProjection, CompositeProjectionBuilder, CompositeProjectionConfig, SubProjectionEntry},
    config::{EngineConfig, TerritoryConfig},
    export::{ExportedComposite, ExportedTerritory},
};

/// Where and how large a territory is drawn.
///
/// The effective scale is `base_scale × scale_multiplier` and the effective
/// translate is `map_center + translate_offset`; both are recomputed on
/// every build.
#[derive(Debug, Clone, PartialEq)]
pub struct TerritoryPlacement {
    base_scale: f64,
    scale_multiplier: f64,
    translate_offset: ScreenPoint,
    pixel_clip_extent: Option<[f64; 4]>,
    clip_extent: Option<ClipExtent>,
    bounds: Option<GeoBounds>,
}

impl TerritoryPlacement {
    pub fn base_scale(&self) -> f64 {
        self.base_scale
    }

    pub fn scale_multiplier(&self) -> f64 {
        self.scale_multiplier
    }

    pub fn translate_offset(&self) -> ScreenPoint {
        self.translate_offset
    }

    /// Returns the clip rectangle in pixel offsets, if placed explicitly.
    pub fn pixel_clip_extent(&self) -> Option<[f64; 4]> {
        self.pixel_clip_extent
    }

    /// Returns the clip extent applied by the last build.
    pub fn clip_extent(&self) -> Option<ClipExtent> {
        self.clip_extent
    }

    pub fn bounds(&self) -> Option<GeoBounds> {
        self.bounds
    }

    pub fn effective_scale(&self) -> f64 {
        self.base_scale * self.scale_multiplier
    }

    pub fn effective_translate(&self, map_center: ScreenPoint) -> ScreenPoint {
        map_center.add_point(self.translate_offset)
    }
}

/// A territory's declared multiplier, offset and clip, restored by
/// [`TerritoryProjectionSet::reset_placement`].
#[derive(Debug, Clone, Copy)]
struct DeclaredPlacement {
    scale_multiplier: f64,
    translate_offset: ScreenPoint,
    pixel_clip_extent: Option<[f64; 4]>,
}

/// One territory of a [`TerritoryProjectionSet`].
#[derive(Debug, Clone)]
pub struct Territory {
    id: Id,
    display_name: String,
    projection: Rc<ConfiguredProjection>,
    placement: TerritoryPlacement,
    declared: DeclaredPlacement,
    /// Parallels of the last conic family used, for switching back.
    parallels: Option<[f64; 2]>,
}

impl Territory {
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn projection(&self) -> &ConfiguredProjection {
        &self.projection
    }

    pub fn placement(&self) -> &TerritoryPlacement {
        &self.placement
    }

    pub fn bounds(&self) -> Option<GeoBounds> {
        self.placement.bounds
    }
}

/// The screen rectangle a territory currently occupies.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionBorder {
    territory_id: Id,
    display_name: String,
    screen_bounds: ScreenRect,
}

impl CompositionBorder {
    pub fn territory_id(&self) -> Id {
        self.territory_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn screen_bounds(&self) -> ScreenRect {
        self.screen_bounds
    }
}

#[derive(Debug)]
struct BuiltComposite {
    width: f64,
    height: f64,
    composite: CompositeProjection,
}

/// Territories, their projections and placements, and the cached composite.
///
/// # Examples
///
/// ```
/// # use inset::config::TerritoryConfig;
/// # use inset::territory::TerritoryProjectionSet;
/// # use inset_core::geometry::{GeoBounds, GeoPoint};
/// # use inset_core::projection::Projection;
/// let mainland = TerritoryConfig::new("mainland", GeoPoint::new(2.5, 46.0))
///     .with_bounds(GeoBounds::new(-5.0, 41.0, 10.0, 51.0).unwrap());
/// let remote = TerritoryConfig::new("remote", GeoPoint::new(-61.0, 14.5))
///     .with_bounds(GeoBounds::new(-62.0, 14.0, -60.0, 15.0).unwrap())
///     .with_translate_offset([-400.0, 180.0]);
///
/// let mut set = TerritoryProjectionSet::initialize(&[mainland, remote], 2700.0).unwrap();
/// let composite = set.build(960.0, 500.0, false).unwrap();
///
/// assert!(composite.project(GeoPoint::new(2.0, 47.0)).is_some());
/// assert!(composite.project(GeoPoint::new(100.0, 0.0)).is_none());
/// ```
#[derive(Debug)]
pub struct TerritoryProjectionSet {
    territories: IndexMap<Id, Territory>,
    reference_scale: f64,
    engine: EngineConfig,
    built: Option<BuiltComposite>,
}

impl TerritoryProjectionSet {
    /// Creates one projection per territory, centred on the territory.
    ///
    /// Cylindrical and conic families are rotated by `-center_lon`;
    /// azimuthal families by `(-center_lon, -center_lat)`. The base scale of
    /// every territory is `reference_scale`; the first territory always gets
    /// a multiplier of 1.0.
    ///
    /// # Errors
    ///
    /// Returns [`InsetError::EmptyComposite`] for an empty list,
    /// [`InsetError::DuplicateEntry`] for a repeated id,
    /// [`InsetError::Config`] for a non-positive scale or multiplier, and
    /// [`InsetError::Projection`] when a center cannot be projected.
    pub fn initialize(territories: &[TerritoryConfig], reference_scale: f64) -> Result<Self, InsetError> {
        if territories.is_empty() {
            return Err(InsetError::EmptyComposite);
        }
        check_scale("reference scale", reference_scale)?;

        let mut map = IndexMap::with_capacity(territories.len());
        for (index, config) in territories.iter().enumerate() {
            let territory = Self::create_territory(config, index == 0, reference_scale)?;
            if map.insert(config.id(), territory).is_some() {
                return Err(InsetError::DuplicateEntry(config.id()));
            }
        }

        info!(territories_count = map.len(), reference_scale; "Territory projection set initialized");

        Ok(Self {
            territories: map,
            reference_scale,
            engine: EngineConfig::default(),
            built: None,
        })
    }

    /// Restores a set from an [`ExportedComposite`].
    ///
    /// Families, parallels, centers, rotations, multipliers, offsets, clip
    /// placements and bounds are taken as exported, so that exporting the
    /// restored set yields the same snapshot. The first territory's
    /// multiplier is forced to 1.0 as in [`initialize`](Self::initialize).
    ///
    /// # Errors
    ///
    /// Same conditions as [`initialize`](Self::initialize).
    pub fn from_export(exported: &ExportedComposite) -> Result<Self, InsetError> {
        if exported.territories().is_empty() {
            return Err(InsetError::EmptyComposite);
        }
        let reference_scale = exported.reference_scale();
        check_scale("reference scale", reference_scale)?;

        let mut map = IndexMap::with_capacity(exported.territories().len());
        for (index, item) in exported.territories().iter().enumerate() {
            let scale_multiplier = declared_multiplier(item.id(), item.scale_multiplier(), index == 0)?;
            let family = ProjectionFamily::from_kind(item.family(), item.parallels(), item.center());
            let projection = ConfiguredProjection::new(family)
                .with_rotation(item.rotation())?
                .with_center(item.center())?
                .with_scale(reference_scale * scale_multiplier);
            let [dx, dy] = item.translate_offset();
            let declared = DeclaredPlacement {
                scale_multiplier,
                translate_offset: ScreenPoint::new(dx, dy),
                pixel_clip_extent: item.pixel_clip_extent(),
            };
            let territory = Territory {
                id: item.id(),
                display_name: item.display_name().to_string(),
                projection: Rc::new(projection),
                placement: TerritoryPlacement {
                    base_scale: reference_scale,
                    scale_multiplier: declared.scale_multiplier,
                    translate_offset: declared.translate_offset,
                    pixel_clip_extent: declared.pixel_clip_extent,
                    clip_extent: None,
                    bounds: item.bounds(),
                },
                declared,
                parallels: item.parallels(),
            };
            if map.insert(item.id(), territory).is_some() {
                return Err(InsetError::DuplicateEntry(item.id()));
            }
        }

        info!(territories_count = map.len(), reference_scale; "Territory projection set restored");

        Ok(Self {
            territories: map,
            reference_scale,
            engine: EngineConfig::default(),
            built: None,
        })
    }

    /// Uses `engine` for clip insets, invert tolerance, validation and
    /// debug logging.
    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self.invalidate();
        self
    }

    fn create_territory(config: &TerritoryConfig, primary: bool, reference_scale: f64) -> Result<Territory, InsetError> {
        let center = config.center();
        let family = ProjectionFamily::from_kind(config.family(), config.parallels(), center);
        let rotation = if family.is_azimuthal() {
            Rotation::new(-center.lon(), -center.lat(), 0.0)
        } else {
            Rotation::new(-center.lon(), 0.0, 0.0)
        };

        let scale_multiplier = declared_multiplier(config.id(), config.scale_multiplier(), primary)?;

        let projection = ConfiguredProjection::new(family)
            .with_rotation(rotation)?
            .with_center(center)?
            .with_scale(reference_scale * scale_multiplier);

        let [dx, dy] = config.translate_offset();
        let declared = DeclaredPlacement {
            scale_multiplier,
            translate_offset: ScreenPoint::new(dx, dy),
            pixel_clip_extent: config.pixel_clip_extent(),
        };

        debug!(
            territory_id:% = config.id(),
            family:% = family.kind(),
            scale_multiplier;
            "Created territory projection"
        );

        Ok(Territory {
            id: config.id(),
            display_name: config.display_name(),
            projection: Rc::new(projection),
            placement: TerritoryPlacement {
                base_scale: reference_scale,
                scale_multiplier,
                translate_offset: declared.translate_offset,
                pixel_clip_extent: declared.pixel_clip_extent,
                clip_extent: None,
                bounds: config.bounds(),
            },
            declared,
            parallels: family.parallels(),
        })
    }

    /// Returns the territory ids in declaration order.
    pub fn territory_ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.territories.keys().copied()
    }

    /// Returns the territories in declaration order.
    pub fn territories(&self) -> impl Iterator<Item = &Territory> {
        self.territories.values()
    }

    pub fn territory(&self, id: Id) -> Option<&Territory> {
        self.territories.get(&id)
    }

    pub fn placement(&self, id: Id) -> Option<&TerritoryPlacement> {
        self.territory(id).map(Territory::placement)
    }

    pub fn projection(&self, id: Id) -> Option<&ConfiguredProjection> {
        self.territory(id).map(Territory::projection)
    }

    /// Returns the id of the first declared territory.
    pub fn primary(&self) -> Id {
        // `initialize` and `from_export` reject empty lists
        self.territories
            .first()
            .map(|(id, _)| *id)
            .unwrap_or_else(|| Id::new(""))
    }

    pub fn reference_scale(&self) -> f64 {
        self.reference_scale
    }

    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    /// Returns true if a composite is cached.
    pub fn is_built(&self) -> bool {
        self.built.is_some()
    }

    fn invalidate(&mut self) {
        if self.built.take().is_some() {
            debug!("Composite projection invalidated");
        }
    }

    /// Drops the cached composite and returns the territory for mutation.
    fn territory_mut(&mut self, id: Id) -> Result<&mut Territory, InsetError> {
        self.invalidate();
        self.territories.get_mut(&id).ok_or(InsetError::UnknownTerritory(id))
    }

    /// Switches a territory to another family.
    ///
    /// Scale, center, rotation, translate, clip extent and precision carry
    /// over so the territory stays in place. Conic families reuse the
    /// territory's last parallels, or two degrees either side of its center
    /// latitude.
    ///
    /// # Errors
    ///
    /// Returns [`InsetError::UnknownTerritory`] for an unknown id and
    /// [`InsetError::Projection`] if the new family cannot project the
    /// territory's center. The territory is unchanged on error.
    pub fn change_projection_family(&mut self, id: Id, kind: FamilyKind) -> Result<(), InsetError> {
        let territory = self.territory_mut(id)?;
        let center = territory.projection.center().unwrap_or_default();
        let family = ProjectionFamily::from_kind(kind, territory.parallels, center);

        Rc::make_mut(&mut territory.projection).set_family(family)?;
        if let Some(parallels) = family.parallels() {
            territory.parallels = Some(parallels);
        }

        debug!(territory_id:% = id, family:% = kind; "Projection family changed");
        Ok(())
    }

    /// Like [`change_projection_family`](Self::change_projection_family),
    /// with the family given by name.
    ///
    /// # Errors
    ///
    /// Returns [`InsetError::UnknownFamily`] for an unrecognised name.
    pub fn change_projection_family_named(&mut self, id: Id, name: &str) -> Result<(), InsetError> {
        let kind: FamilyKind = name.parse()?;
        self.change_projection_family(id, kind)
    }

    /// Sets the pixel offset of a territory from the map center.
    ///
    /// # Errors
    ///
    /// Returns [`InsetError::UnknownTerritory`] for an unknown id and
    /// [`InsetError::Config`] for a non-finite offset.
    pub fn set_translation_offset(&mut self, id: Id, [dx, dy]: [f64; 2]) -> Result<(), InsetError> {
        if !dx.is_finite() || !dy.is_finite() {
            return Err(InsetError::Config(format!(
                "translate offset [{dx}, {dy}] must be finite"
            )));
        }
        let territory = self.territory_mut(id)?;
        territory.placement.translate_offset = ScreenPoint::new(dx, dy);
        debug!(territory_id:% = id, dx, dy; "Translate offset changed");
        Ok(())
    }

    /// Sets the artistic scale multiplier of a territory.
    ///
    /// # Errors
    ///
    /// Returns [`InsetError::UnknownTerritory`] for an unknown id and
    /// [`InsetError::Config`] for a non-positive multiplier.
    pub fn set_scale_multiplier(&mut self, id: Id, multiplier: f64) -> Result<(), InsetError> {
        check_scale("scale multiplier", multiplier)?;
        let territory = self.territory_mut(id)?;
        territory.placement.scale_multiplier = multiplier;
        debug!(territory_id:% = id, multiplier; "Scale multiplier changed");
        Ok(())
    }

    /// Places a territory's clip rectangle in pixel offsets `[x1, y1, x2, y2]`
    /// around its screen position, or returns to the bounds-derived clip with
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns [`InsetError::UnknownTerritory`] for an unknown id and
    /// [`InsetError::Config`] for non-finite offsets.
    pub fn set_pixel_clip_extent(&mut self, id: Id, offsets: Option<[f64; 4]>) -> Result<(), InsetError> {
        if offsets.is_some_and(|offsets| !offsets.iter().all(|value| value.is_finite())) {
            return Err(InsetError::Config(format!(
                "pixel clip extent {offsets:?} must be finite"
            )));
        }
        let territory = self.territory_mut(id)?;
        territory.placement.pixel_clip_extent = offsets;
        debug!(territory_id:% = id, offsets:?; "Pixel clip extent changed");
        Ok(())
    }

    /// Restores a territory's declared multiplier, offset and clip placement.
    ///
    /// # Errors
    ///
    /// Returns [`InsetError::UnknownTerritory`] for an unknown id.
    pub fn reset_placement(&mut self, id: Id) -> Result<(), InsetError> {
        let territory = self.territory_mut(id)?;
        territory.placement.scale_multiplier = territory.declared.scale_multiplier;
        territory.placement.translate_offset = territory.declared.translate_offset;
        territory.placement.pixel_clip_extent = territory.declared.pixel_clip_extent;
        debug!(territory_id:% = id; "Placement reset");
        Ok(())
    }

    /// Returns the composite projection for a `width × height` map.
    ///
    /// The composite is cached per size. On rebuild every projection gets
    /// its effective scale and translate, then a clip extent: the pixel clip
    /// placement if one is set, otherwise the projected geographic bounds.
    /// A territory whose bounds do not project is left unclipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the composite fails validation.
    pub fn build(&mut self, width: f64, height: f64, force_rebuild: bool) -> Result<&CompositeProjection, InsetError> {
        let fresh = !force_rebuild
            && self
                .built
                .as_ref()
                .is_some_and(|built| built.width == width && built.height == height);
        if !fresh {
            self.built = None;
        }

        let built = match self.built.take() {
            Some(built) => built,
            None => BuiltComposite {
                width,
                height,
                composite: self.rebuild(width, height)?,
            },
        };
        Ok(&self.built.insert(built).composite)
    }

    fn rebuild(&mut self, width: f64, height: f64) -> Result<CompositeProjection, InsetError> {
        let map_center = ScreenPoint::new(width / 2.0, height / 2.0);
        let epsilon = self.engine.clip_epsilon();

        for territory in self.territories.values_mut() {
            let placement = &mut territory.placement;
            let translate = placement.effective_translate(map_center);
            let projection = Rc::make_mut(&mut territory.projection);
            projection.set_scale(placement.effective_scale());
            projection.set_translate(translate);

            let clip = match (placement.pixel_clip_extent, placement.bounds) {
                (Some(offsets), _) => Some(clip_extent::from_pixel_offsets(translate, offsets, epsilon)),
                (None, Some(bounds)) => {
                    let clip = clip_extent::from_geo_bounds(&*projection, bounds, epsilon);
                    if clip.is_none() {
                        debug!(territory_id:% = territory.id; "Bounds do not project, leaving territory unclipped");
                    }
                    clip
                }
                (None, None) => None,
            };
            projection.set_clip_extent(clip)?;
            placement.clip_extent = clip;

            debug!(
                territory_id:% = territory.id,
                scale = projection.scale(),
                x = translate.x(),
                y = translate.y(),
                clip:? = clip.map(ClipExtent::to_pairs);
                "Territory placed"
            );
        }

        let entries = self
            .territories
            .values()
            .map(|territory| {
                let projection: Rc<dyn Projection> = territory.projection.clone();
                let entry = SubProjectionEntry::new(territory.id, territory.display_name.clone(), projection);
                match territory.placement.bounds {
                    Some(bounds) => entry.with_bounds(bounds),
                    None => entry,
                }
            })
            .collect();

        let composite =
            CompositeProjectionBuilder::new(CompositeProjectionConfig::new(entries).with_engine(&self.engine)).build()?;
        info!(width, height; "Territory composite rebuilt");
        Ok(composite)
    }

    /// Returns the screen rectangle of every non-primary bounded territory
    /// for a `width × height` map, as currently placed.
    ///
    /// Territories whose bounds do not fully project are omitted.
    pub fn composition_borders(&self, width: f64, height: f64) -> Vec<CompositionBorder> {
        let map_center = ScreenPoint::new(width / 2.0, height / 2.0);
        let epsilon = self.engine.clip_epsilon();

        self.territories
            .values()
            .skip(1)
            .filter_map(|territory| {
                let bounds = territory.placement.bounds?;
                let placed = territory
                    .projection()
                    .clone()
                    .with_scale(territory.placement.effective_scale())
                    .with_translate(territory.placement.effective_translate(map_center));

                let corners = [
                    bounds.north_west(epsilon),
                    GeoPoint::new(bounds.max_lon() - epsilon, bounds.max_lat() - epsilon),
                    bounds.south_east(epsilon),
                    GeoPoint::new(bounds.min_lon() + epsilon, bounds.min_lat() + epsilon),
                ];
                let mut projected = corners.into_iter().map(|corner| placed.project(corner));
                let first = projected.next()??;
                let screen_bounds = projected.try_fold(ScreenRect::from_corners(first, first), |rect, point| {
                    point.map(|point| rect.union_point(point))
                })?;

                Some(CompositionBorder {
                    territory_id: territory.id,
                    display_name: territory.display_name.clone(),
                    screen_bounds,
                })
            })
            .collect()
    }

    /// Returns the territory drawn at `point` on a `width × height` map.
    ///
    /// # Errors
    ///
    /// Returns an error if the composite cannot be built.
    pub fn territory_at(&mut self, width: f64, height: f64, point: ScreenPoint) -> Result<Option<Id>, InsetError> {
        let composite = self.build(width, height, false)?;
        Ok(composite.invert_with_entry(point).map(|hit| hit.entry_id()))
    }

    /// Snapshots every territory's family, center, rotation, effective
    /// scale and placement.
    pub fn export_config(&self) -> ExportedComposite {
        let territories = self
            .territories
            .values()
            .map(|territory| {
                let projection = territory.projection();
                let placement = territory.placement();
                ExportedTerritory::new(
                    territory.id,
                    territory.display_name.clone(),
                    projection.family().kind(),
                    projection.parallels(),
                    projection.center().unwrap_or_default(),
                    projection.rotation().unwrap_or_default(),
                    placement.effective_scale(),
                    placement.scale_multiplier,
                    [placement.translate_offset.x(), placement.translate_offset.y()],
                    placement.pixel_clip_extent,
                    placement.bounds,
                )
            })
            .collect();
        ExportedComposite::new(self.reference_scale, territories)
    }
}

/// The primary territory is the scale reference, so its multiplier is 1.0
/// whatever was declared.
fn declared_multiplier(id: Id, scale_multiplier: f64, primary: bool) -> Result<f64, InsetError> {
    if !primary {
        check_scale("scale multiplier", scale_multiplier)?;
        return Ok(scale_multiplier);
    }
    if scale_multiplier != 1.0 {
        debug!(territory_id:% = id, scale_multiplier; "Ignoring scale multiplier of the primary territory");
    }
    Ok(1.0)
}

fn check_scale(what: &str, value: f64) -> Result<(), InsetError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(InsetError::Config(format!("{what} must be a positive number, got {value}")))
    }
}
