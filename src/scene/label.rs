//! User text floating under the orbiting planet.
//!
//! The label itself only knows what text it shows and where it is. Turning the text into a
//! mesh needs the font, which loads in the background, so a submission becomes a pending
//! request that the event loop picks up with [`FloatingLabel::take_request`] and answers with
//! [`FloatingLabel::show`] once the mesh is on the GPU.

use cgmath::{InnerSpace, Quaternion, Rad, Rotation3, Vector3};

use crate::{
    data_structures::{instance::Instance, scene_graph::DrawItem},
    resources::{material::MaterialKey, mesh::MeshKey},
};

/// How far below the planet centre the label floats.
pub const DROP: f32 = 15.0;

#[derive(Clone, Debug, Default)]
pub struct FloatingLabel {
    shown: Option<String>,
    requested: Option<String>,
    transform: Instance,
}

impl FloatingLabel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts `text` unless it is blank. Returns whether a new label was requested.
    pub fn submit(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            log::debug!("ignoring blank label text");
            return false;
        }
        self.requested = Some(text.to_string());
        true
    }

    pub fn has_request(&self) -> bool {
        self.requested.is_some()
    }

    /// The latest accepted text that still needs a mesh.
    pub fn take_request(&mut self) -> Option<String> {
        self.requested.take()
    }

    /// Marks `text` as built; it replaces whatever was shown before.
    pub fn show(&mut self, text: String) {
        self.shown = Some(text);
    }

    /// Takes the label out of the scene, e.g. when its text had no printable glyphs.
    pub fn hide(&mut self) {
        self.shown = None;
    }

    pub fn text(&self) -> Option<&str> {
        self.shown.as_deref()
    }

    pub fn transform(&self) -> &Instance {
        &self.transform
    }

    /// Places the label under `planet` and turns its front (+z) toward `eye`.
    pub fn track(&mut self, planet: Vector3<f32>, eye: Vector3<f32>) {
        let position = planet - Vector3::new(0.0, DROP, 0.0);
        self.transform.position = position;
        self.transform.rotation = facing(eye - position);
    }

    pub fn draw_item(&self) -> Option<DrawItem> {
        self.shown.as_ref().map(|_| DrawItem {
            mesh: MeshKey::Label,
            material: MaterialKey::Label,
            transform: self.transform,
        })
    }
}

/// Rotation taking +z onto `direction`, with no roll.
fn facing(direction: Vector3<f32>) -> Quaternion<f32> {
    if direction.magnitude2() < f32::EPSILON {
        return Quaternion::from_angle_y(Rad(0.0));
    }
    let yaw = direction.x.atan2(direction.z);
    let horizontal = (direction.x * direction.x + direction.z * direction.z).sqrt();
    let pitch = -direction.y.atan2(horizontal);
    Quaternion::from_angle_y(Rad(yaw)) * Quaternion::from_angle_x(Rad(pitch))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_ignored() {
        let mut label = FloatingLabel::new();
        assert!(!label.submit(""));
        assert!(!label.submit("   \t\n"));
        assert!(label.take_request().is_none());
        assert!(label.draw_item().is_none());
    }

    #[test]
    fn latest_submission_wins() {
        let mut label = FloatingLabel::new();
        assert!(label.submit("  hello "));
        assert!(label.submit("world"));
        assert!(label.has_request());
        assert_eq!(label.take_request().as_deref(), Some("world"));
        assert!(label.take_request().is_none());

        label.show("world".to_string());
        label.show("again".to_string());
        assert_eq!(label.text(), Some("again"));
        assert_eq!(label.draw_item().map(|d| d.mesh), Some(MeshKey::Label));
    }

    #[test]
    fn hidden_label_draws_nothing() {
        let mut label = FloatingLabel::new();
        label.show("carrot".to_string());
        assert!(label.draw_item().is_some());
        label.hide();
        assert_eq!(label.text(), None);
        assert!(label.draw_item().is_none());
    }

    #[test]
    fn hangs_below_the_planet_and_faces_the_eye() {
        let mut label = FloatingLabel::new();
        let planet = Vector3::new(80.0, -40.0, -20.0);
        let eye = Vector3::new(40.0, 20.0, 100.0);
        label.track(planet, eye);
        let t = label.transform();
        assert!((t.position - Vector3::new(80.0, -55.0, -20.0)).magnitude() < 1e-5);
        let front = t.rotation * Vector3::unit_z();
        let wanted = (eye - t.position).normalize();
        assert!((front - wanted).magnitude() < 1e-4);
        // no roll: the label's x axis stays horizontal
        assert!((t.rotation * Vector3::unit_x()).y.abs() < 1e-5);
    }
}
