//! Capabilities the presentation layer implements for the core.
//!
//! The core stores one view handle per station and calls it when the
//! station changes. It never knows how (or on which thread) the view
//! renders; implementations must hand work off to their own context.

use std::time::Duration;

use glam::DVec2;

use crate::enums::StationType;

/// Per-entity view handle.
pub trait EntityView: Send + Sync {
    fn set_position(&self, position: DVec2);
    fn add_passenger(&self, wanted: StationType);
    fn remove_passenger(&self, wanted: StationType);
    /// Start the overcrowding countdown animation.
    fn warn(&self, grace: Duration);
    fn un_warn(&self);
    /// The station was upgraded.
    fn make_bigger(&self);
}

/// Creates station views on behalf of the core.
pub trait StationViewFactory: Send + Sync {
    fn create_station_view(&self, station_type: StationType) -> Box<dyn EntityView>;
}

/// View that renders nothing. Used by headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullView;

impl EntityView for NullView {
    fn set_position(&self, _position: DVec2) {}
    fn add_passenger(&self, _wanted: StationType) {}
    fn remove_passenger(&self, _wanted: StationType) {}
    fn warn(&self, _grace: Duration) {}
    fn un_warn(&self) {}
    fn make_bigger(&self) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullViewFactory;

impl StationViewFactory for NullViewFactory {
    fn create_station_view(&self, _station_type: StationType) -> Box<dyn EntityView> {
        Box::new(NullView)
    }
}
