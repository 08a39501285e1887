use heapless::Vec;
use nalgebra::Point2;

use crate::{
    fusion::OrientationFusion,
    heading::Heading,
    marker::{marker_position, MarkerOffset, ViewSize},
    sensor::{SensorDelay, SensorEvent, SensorHub, SensorKind},
};

/// What the screen draws into: a rotatable dial image and a marker view
/// positioned in the dial's parent.
pub trait DialView {
    fn dial_size(&self) -> ViewSize;
    fn marker_size(&self) -> ViewSize;
    fn set_dial_rotation(&mut self, rotation: f32);
    fn show_marker(&mut self);
    /// `position` is the marker's top-left corner
    fn move_marker(&mut self, position: Point2<f32>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TouchAction {
    Down,
    Move,
    Up,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchEvent {
    pub action: TouchAction,
    /// In dial coordinates
    pub position: Point2<f32>,
}

impl TouchEvent {
    pub fn new(action: TouchAction, x: f32, y: f32) -> Self {
        Self {
            action,
            position: Point2::new(x, y),
        }
    }
}

pub struct CompassScreen<V: DialView> {
    view: V,
    fusion: OrientationFusion,
    heading: Option<Heading>,
    dial_rotation: f32,
    marker: Option<MarkerOffset>,
    listening: bool,
}

impl<V: DialView> CompassScreen<V> {
    pub fn new(view: V) -> Self {
        Self {
            view,
            fusion: OrientationFusion::new(),
            heading: None,
            dial_rotation: 0.0,
            marker: None,
            listening: false,
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn into_view(self) -> V {
        self.view
    }

    pub fn heading(&self) -> Option<Heading> {
        self.heading
    }

    pub fn dial_rotation(&self) -> f32 {
        self.dial_rotation
    }

    pub fn marker_offset(&self) -> Option<&MarkerOffset> {
        self.marker.as_ref()
    }

    pub fn is_marker_visible(&self) -> bool {
        self.marker.is_some()
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Subscribes to the accelerometer and magnetometer at the UI rate.
    /// See [`CompassScreen::resume_with_delay`].
    pub fn resume<'a, H: SensorHub>(
        &'a mut self,
        hub: &'a mut H,
    ) -> Result<ActiveScreen<'a, V, H>, H::Error> {
        self.resume_with_delay(hub, SensorDelay::Ui)
    }

    /// Subscribes to the accelerometer and magnetometer, skipping whichever
    /// the device doesn't have. The subscription lasts as long as the
    /// returned [`ActiveScreen`]; if a registration fails, anything already
    /// registered is released before the error is returned.
    pub fn resume_with_delay<'a, H: SensorHub>(
        &'a mut self,
        hub: &'a mut H,
        delay: SensorDelay,
    ) -> Result<ActiveScreen<'a, V, H>, H::Error> {
        self.listening = true;
        let mut active = ActiveScreen {
            screen: self,
            hub,
            registered: Vec::new(),
        };

        for kind in SensorKind::ALL {
            if !active.hub.has_sensor(kind) {
                log_warn!("no {} on this device", kind.name());
                continue;
            }
            active.hub.register(kind, delay)?;
            active.registered.push(kind).ok();
            log_debug!("registered {}", kind.name());
        }

        Ok(active)
    }

    fn handle_sensor_event(&mut self, event: &SensorEvent) -> bool {
        if !self.listening {
            log_trace!("sensors are off, dropping event");
            return false;
        }

        let sample = match event {
            SensorEvent::Sample(sample) => sample,
            SensorEvent::AccuracyChanged { .. } => return false,
        };

        let Some(orientation) = self.fusion.feed(sample) else {
            return false;
        };

        let heading = Heading::from_orientation(&orientation);
        self.heading = Some(heading);
        self.dial_rotation = heading.dial_rotation();
        self.view.set_dial_rotation(self.dial_rotation);
        self.update_marker_position();
        true
    }

    fn handle_touch(&mut self, event: &TouchEvent) -> bool {
        if event.action == TouchAction::Down {
            let offset = MarkerOffset::capture(event.position, self.view.dial_size());
            log_debug!("marker placed at offset ({}, {})", offset.dx(), offset.dy());

            self.marker = Some(offset);
            self.view.show_marker();
            self.update_marker_position();
        }
        true
    }

    fn update_marker_position(&mut self) {
        if let Some(offset) = &self.marker {
            let position = marker_position(
                self.dial_rotation,
                offset,
                self.view.dial_size(),
                self.view.marker_size(),
            );
            self.view.move_marker(position);
        }
    }
}

/// A resumed screen. Holds the sensor subscription and releases it when
/// dropped.
pub struct ActiveScreen<'a, V: DialView, H: SensorHub> {
    screen: &'a mut CompassScreen<V>,
    hub: &'a mut H,
    registered: Vec<SensorKind, 2>,
}

impl<'a, V: DialView, H: SensorHub> ActiveScreen<'a, V, H> {
    /// Returns whether the view was updated
    pub fn on_sensor_event(&mut self, event: &SensorEvent) -> bool {
        self.screen.handle_sensor_event(event)
    }

    /// Every touch on the dial is consumed; only a press places the marker.
    pub fn on_touch(&mut self, event: &TouchEvent) -> bool {
        self.screen.handle_touch(event)
    }

    /// The "off" button. Sensors stay off until the screen is paused and
    /// resumed again.
    pub fn stop_sensors(&mut self) {
        log_info!("sensors stopped");
        self.release();
    }

    pub fn registered_sensors(&self) -> &[SensorKind] {
        &self.registered
    }

    pub fn screen(&self) -> &CompassScreen<V> {
        self.screen
    }

    pub fn hub(&self) -> &H {
        self.hub
    }

    pub fn hub_mut(&mut self) -> &mut H {
        self.hub
    }

    pub fn pause(self) {}

    fn release(&mut self) {
        self.hub.unregister_all();
        self.registered.clear();
        self.screen.listening = false;
    }
}

impl<'a, V: DialView, H: SensorHub> Drop for ActiveScreen<'a, V, H> {
    fn drop(&mut self) {
        self.release();
    }
}
