//! Core-Domänentypen: Entities, Gleisbereiche, lineare Referenzierung, Flatten/Nest,
//! Gleis-Cache und Spatial-Index.

pub mod entity;
pub mod error;
pub mod flatten;
/// Linear-Referencing-Engine
///
/// - `LinearTrack`: deklarierte Distanz ↔ Koordinate, Schnitte, Projektion
/// - `nearest_point_on_any_of`: Snapping über mehrere Kandidaten
pub mod linear_ref;
pub mod spatial;
pub mod track_cache;
pub mod track_range;

pub use entity::{
    Entity, EntityId, Geometry, GeometryKind, ObjectType, GEO_KEY, LENGTH_KEY, NEW_ENTITY_ID,
};
pub use error::EntityError;
pub use flatten::{flatten, flatten_schema, nest, FlatMap, FLAT_SEPARATOR};
pub use linear_ref::{
    nearest_point_on_any_of, Degenerate, LinearTrack, NearestPoint, TrackProjection, TrackShape,
};
pub use spatial::{EndpointIndex, EndpointMatch, TrackEndpoint};
pub use track_cache::{
    CacheUpdate, CachedTrack, DriftCheck, RequestId, TrackCache, TrackCacheEntry,
};
pub use track_range::{
    ApplicableDirection, MarkerSign, RangeEnd, SignSide, TrackRange, MARKER_SIGNS_KEY,
    TRACK_RANGES_KEY,
};
