#![cfg_attr(not(test), no_std)]

mod fmt;

pub mod fusion;
pub mod heading;
pub mod marker;
pub mod rotation;
pub mod screen;
pub mod sensor;

pub use fusion::OrientationFusion;
pub use heading::Heading;
pub use marker::{marker_position, MarkerOffset, ViewSize};
pub use rotation::{Orientation, RotationMatrix};
pub use screen::{ActiveScreen, CompassScreen, DialView, TouchAction, TouchEvent};
pub use sensor::{
    SensorAccuracy, SensorDelay, SensorEvent, SensorHub, SensorKind, SensorReading, SensorSample,
};
