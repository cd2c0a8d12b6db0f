pub mod widget;

pub use widget::{GuideMapExt, GuideMapStyle, GuideMapView};
