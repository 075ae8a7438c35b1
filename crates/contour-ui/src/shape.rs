use contour_engine::coords::Size;
use contour_engine::node::{NodeParams, ShadowParams};
use contour_engine::paint::Rgba;
use contour_engine::raster::ShapeType;
use contour_engine::util::{quantize_u16, quantize_u16_clamped, unquantize_u16};

// ── notifications ─────────────────────────────────────────────────────────

/// A property whose stored value changed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PropertyChange {
    Shape,
    Radius,
    Color,
    DropShadowSize,
    DropShadowDistance,
    DropShadowAngle,
    DropShadowColor,
    InnerShadowSize,
    InnerShadowDistance,
    InnerShadowAngle,
    InnerShadowColor,
    FrameThickness,
    FrameSpace,
    FrameColor,
    Size,
    DevicePixelRatio,
}

/// Which child nodes the item currently wants drawn.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Visibility {
    pub drop_shadow: bool,
    pub fill_center: bool,
    pub fill_corners: bool,
    pub frame_edges: bool,
    pub frame_corners: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct Shadow {
    size: u16,
    distance: u16,
    angle: u16,
    color: Rgba,
}

impl Shadow {
    const NONE: Shadow = Shadow { size: 0, distance: 0, angle: 0, color: Rgba::BLACK };

    fn params(&self) -> ShadowParams {
        ShadowParams {
            size: unquantize(self.size),
            angle: unquantize(self.angle),
            distance: unquantize(self.distance),
            color: self.color,
        }
    }
}

#[inline]
fn quantize(value: f32) -> u16 {
    quantize_u16(value as f64)
}

#[inline]
fn unquantize(value: u16) -> f32 {
    unquantize_u16(value) as f32
}

/// Angles wrap into `[0, 360)` before quantization; non-finite angles become 0.
fn quantize_angle(degrees: f32) -> u16 {
    let degrees = degrees as f64;
    let wrapped = if degrees.is_finite() { degrees.rem_euclid(360.0) } else { 0.0 };
    let angle = quantize_u16_clamped(wrapped.min(360.0));
    // Values just below 360 quantize onto it.
    if unquantize_u16(angle) >= 360.0 { 0 } else { angle }
}

// ── item ──────────────────────────────────────────────────────────────────

/// A rounded shape item: fill, frame, and drop and inner shadows.
///
/// Setters clamp and quantize, compare against the stored value and, only
/// when it changed, refresh the child visibility, request a repaint and
/// queue a [`PropertyChange`]. GPU resources are never touched here; the
/// paint node built by [`Shape::update_paint_node`] acquires
/// textures during the frame's preprocessing.
///
/// Lengths are stored as 16-bit fixed point over `[0, 4096]`, angles over
/// `[0, 360)`.
///
/// # Example
/// ```rust,ignore
/// let mut shape = Shape::new();
/// shape.set_size(Size::new(120.0, 48.0));
/// shape.set_radius(12.0);
/// shape.set_color(Rgba::new(40, 90, 200, 255));
/// shape.set_drop_shadow_size(8.0);
/// shape.set_drop_shadow_color(Rgba::new(0, 0, 0, 96));
/// ```
#[derive(Debug, Clone)]
pub struct Shape {
    shape: ShapeType,
    radius: u16,
    color: Rgba,
    drop_shadow: Shadow,
    inner_shadow: Shadow,
    frame_thickness: u16,
    frame_space: u16,
    frame_color: Rgba,
    size: Size,
    device_pixel_ratio: f32,

    visibility: Visibility,
    needs_repaint: bool,
    changes: Vec<PropertyChange>,
}

impl Default for Shape {
    fn default() -> Self {
        Self::new()
    }
}

impl Shape {
    pub fn new() -> Self {
        Self {
            shape: ShapeType::Squircle,
            radius: 0,
            // Transparent so the fill nodes are not created until needed.
            color: Rgba::new(255, 255, 255, 0),
            drop_shadow: Shadow::NONE,
            inner_shadow: Shadow::NONE,
            frame_thickness: 0,
            frame_space: 0,
            frame_color: Rgba::WHITE,
            size: Size::default(),
            device_pixel_ratio: 1.0,
            visibility: Visibility::default(),
            needs_repaint: false,
            changes: Vec::new(),
        }
    }

    fn changed(&mut self, change: PropertyChange) {
        self.refresh_visibility();
        self.needs_repaint = true;
        // One entry per property, so an undrained queue stays bounded.
        if !self.changes.contains(&change) {
            self.changes.push(change);
        }
    }

    fn refresh_visibility(&mut self) {
        let fill_center = self.color.is_visible();
        let frame_edges = self.frame_thickness > 0 && self.frame_color.is_visible();
        self.visibility = Visibility {
            drop_shadow: self.drop_shadow.size > 0 && self.drop_shadow.color.is_visible(),
            fill_center,
            fill_corners: fill_center && self.radius > 0,
            frame_edges,
            frame_corners: frame_edges && self.radius > 0,
        };
    }

    // ── shape ─────────────────────────────────────────────────────────────

    #[inline]
    pub fn shape(&self) -> ShapeType {
        self.shape
    }

    pub fn set_shape(&mut self, shape: ShapeType) {
        if self.shape != shape {
            self.shape = shape;
            self.changed(PropertyChange::Shape);
        }
    }

    pub fn radius(&self) -> f32 {
        unquantize(self.radius)
    }

    pub fn set_radius(&mut self, radius: f32) {
        let radius = quantize(radius);
        if self.radius != radius {
            self.radius = radius;
            self.changed(PropertyChange::Radius);
        }
    }

    #[inline]
    pub fn color(&self) -> Rgba {
        self.color
    }

    pub fn set_color(&mut self, color: Rgba) {
        if self.color != color {
            self.color = color;
            self.changed(PropertyChange::Color);
        }
    }

    // ── drop shadow ───────────────────────────────────────────────────────

    pub fn drop_shadow_size(&self) -> f32 {
        unquantize(self.drop_shadow.size)
    }

    pub fn set_drop_shadow_size(&mut self, size: f32) {
        let size = quantize(size);
        if self.drop_shadow.size != size {
            self.drop_shadow.size = size;
            self.changed(PropertyChange::DropShadowSize);
        }
    }

    pub fn drop_shadow_distance(&self) -> f32 {
        unquantize(self.drop_shadow.distance)
    }

    pub fn set_drop_shadow_distance(&mut self, distance: f32) {
        let distance = quantize(distance);
        if self.drop_shadow.distance != distance {
            self.drop_shadow.distance = distance;
            self.changed(PropertyChange::DropShadowDistance);
        }
    }

    pub fn drop_shadow_angle(&self) -> f32 {
        unquantize(self.drop_shadow.angle)
    }

    pub fn set_drop_shadow_angle(&mut self, degrees: f32) {
        let angle = quantize_angle(degrees);
        if self.drop_shadow.angle != angle {
            self.drop_shadow.angle = angle;
            self.changed(PropertyChange::DropShadowAngle);
        }
    }

    #[inline]
    pub fn drop_shadow_color(&self) -> Rgba {
        self.drop_shadow.color
    }

    pub fn set_drop_shadow_color(&mut self, color: Rgba) {
        if self.drop_shadow.color != color {
            self.drop_shadow.color = color;
            self.changed(PropertyChange::DropShadowColor);
        }
    }

    // ── inner shadow ──────────────────────────────────────────────────────

    pub fn inner_shadow_size(&self) -> f32 {
        unquantize(self.inner_shadow.size)
    }

    pub fn set_inner_shadow_size(&mut self, size: f32) {
        let size = quantize(size);
        if self.inner_shadow.size != size {
            self.inner_shadow.size = size;
            self.changed(PropertyChange::InnerShadowSize);
        }
    }

    pub fn inner_shadow_distance(&self) -> f32 {
        unquantize(self.inner_shadow.distance)
    }

    pub fn set_inner_shadow_distance(&mut self, distance: f32) {
        let distance = quantize(distance);
        if self.inner_shadow.distance != distance {
            self.inner_shadow.distance = distance;
            self.changed(PropertyChange::InnerShadowDistance);
        }
    }

    pub fn inner_shadow_angle(&self) -> f32 {
        unquantize(self.inner_shadow.angle)
    }

    pub fn set_inner_shadow_angle(&mut self, degrees: f32) {
        let angle = quantize_angle(degrees);
        if self.inner_shadow.angle != angle {
            self.inner_shadow.angle = angle;
            self.changed(PropertyChange::InnerShadowAngle);
        }
    }

    #[inline]
    pub fn inner_shadow_color(&self) -> Rgba {
        self.inner_shadow.color
    }

    pub fn set_inner_shadow_color(&mut self, color: Rgba) {
        if self.inner_shadow.color != color {
            self.inner_shadow.color = color;
            self.changed(PropertyChange::InnerShadowColor);
        }
    }

    // ── frame ─────────────────────────────────────────────────────────────

    pub fn frame_thickness(&self) -> f32 {
        unquantize(self.frame_thickness)
    }

    pub fn set_frame_thickness(&mut self, thickness: f32) {
        let thickness = quantize(thickness);
        if self.frame_thickness != thickness {
            self.frame_thickness = thickness;
            self.changed(PropertyChange::FrameThickness);
        }
    }

    pub fn frame_space(&self) -> f32 {
        unquantize(self.frame_space)
    }

    /// Stored and notified; the frame geometry does not use it.
    pub fn set_frame_space(&mut self, space: f32) {
        let space = quantize(space);
        if self.frame_space != space {
            self.frame_space = space;
            self.changed(PropertyChange::FrameSpace);
        }
    }

    #[inline]
    pub fn frame_color(&self) -> Rgba {
        self.frame_color
    }

    pub fn set_frame_color(&mut self, color: Rgba) {
        if self.frame_color != color {
            self.frame_color = color;
            self.changed(PropertyChange::FrameColor);
        }
    }

    // ── item ──────────────────────────────────────────────────────────────

    #[inline]
    pub fn size(&self) -> Size {
        self.size
    }

    pub fn set_size(&mut self, size: Size) {
        if self.size != size {
            self.size = size;
            self.changed(PropertyChange::Size);
        }
    }

    #[inline]
    pub fn device_pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio
    }

    /// Non-finite or non-positive ratios are ignored.
    pub fn set_device_pixel_ratio(&mut self, ratio: f32) {
        if !(ratio.is_finite() && ratio > 0.0) {
            log::warn!("ignoring device pixel ratio {ratio}");
            return;
        }
        if self.device_pixel_ratio != ratio {
            self.device_pixel_ratio = ratio;
            self.changed(PropertyChange::DevicePixelRatio);
        }
    }

    // ── state ─────────────────────────────────────────────────────────────

    #[inline]
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// `true` after a property change until the next paint node update.
    #[inline]
    pub fn needs_repaint(&self) -> bool {
        self.needs_repaint
    }

    pub(crate) fn clear_repaint(&mut self) {
        self.needs_repaint = false;
    }

    /// Drains queued notifications in order of each property's first change
    /// since the last drain. A property appears at most once.
    pub fn take_changes(&mut self) -> Vec<PropertyChange> {
        std::mem::take(&mut self.changes)
    }

    pub(crate) fn node_params(&self) -> NodeParams {
        NodeParams { device_pixel_ratio: self.device_pixel_ratio }
    }

    pub(crate) fn drop_shadow_params(&self) -> ShadowParams {
        self.drop_shadow.params()
    }

    pub(crate) fn inner_shadow_params(&self) -> ShadowParams {
        self.inner_shadow.params()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── quantization ──────────────────────────────────────────────────────

    #[test]
    fn defaults() {
        let shape = Shape::new();
        assert_eq!(shape.shape(), ShapeType::Squircle);
        assert_eq!(shape.radius(), 0.0);
        assert_eq!(shape.color(), Rgba::new(255, 255, 255, 0));
        assert_eq!(shape.drop_shadow_color(), Rgba::BLACK);
        assert_eq!(shape.inner_shadow_color(), Rgba::BLACK);
        assert_eq!(shape.frame_color(), Rgba::WHITE);
        assert_eq!(shape.visibility(), Visibility::default());
        assert!(!shape.needs_repaint());
    }

    #[test]
    fn lengths_are_clamped_into_range() {
        let mut shape = Shape::new();
        shape.set_radius(-5.0);
        assert_eq!(shape.radius(), 0.0);
        assert!(shape.take_changes().is_empty());

        shape.set_radius(1.0e6);
        assert_eq!(shape.radius(), 4096.0);
        shape.set_frame_thickness(f32::NAN);
        assert_eq!(shape.frame_thickness(), 0.0);
    }

    #[test]
    fn whole_pixel_values_round_trip() {
        let mut shape = Shape::new();
        for r in [1.0, 12.0, 50.0, 128.0] {
            shape.set_radius(r);
            assert_eq!(shape.radius().floor(), r);
        }
    }

    #[test]
    fn angles_wrap() {
        let mut shape = Shape::new();
        shape.set_drop_shadow_angle(450.0);
        assert!((shape.drop_shadow_angle() - 90.0).abs() < 0.1);
        shape.set_inner_shadow_angle(-90.0);
        assert!((shape.inner_shadow_angle() - 270.0).abs() < 0.1);
        shape.set_drop_shadow_angle(-1.0e-9);
        assert!(shape.drop_shadow_angle() < 0.1);
        shape.set_drop_shadow_angle(f32::INFINITY);
        assert_eq!(shape.drop_shadow_angle(), 0.0);
    }

    // ── notifications ─────────────────────────────────────────────────────

    #[test]
    fn only_changes_notify() {
        let mut shape = Shape::new();
        shape.set_radius(10.0);
        shape.set_radius(10.0);
        // Same quantized value.
        shape.set_radius(10.00001);
        shape.set_color(Rgba::WHITE);
        shape.set_shape(ShapeType::Circle);
        shape.set_shape(ShapeType::Circle);
        assert!(shape.needs_repaint());
        assert_eq!(
            shape.take_changes(),
            vec![PropertyChange::Radius, PropertyChange::Color, PropertyChange::Shape]
        );
        assert!(shape.take_changes().is_empty());
    }

    #[test]
    fn repeated_changes_queue_once() {
        let mut shape = Shape::new();
        for i in 1..1000 {
            shape.set_drop_shadow_angle(i as f32);
            shape.set_radius((i % 7) as f32 + 1.0);
        }
        assert_eq!(
            shape.take_changes(),
            vec![PropertyChange::DropShadowAngle, PropertyChange::Radius]
        );
        assert!((shape.drop_shadow_angle() - 279.0).abs() < 0.1);

        shape.set_radius(50.0);
        assert_eq!(shape.take_changes(), vec![PropertyChange::Radius]);
    }

    #[test]
    fn invalid_device_pixel_ratio_is_ignored() {
        let mut shape = Shape::new();
        shape.set_device_pixel_ratio(0.0);
        shape.set_device_pixel_ratio(f32::NAN);
        assert_eq!(shape.device_pixel_ratio(), 1.0);
        shape.set_device_pixel_ratio(2.0);
        assert_eq!(shape.take_changes(), vec![PropertyChange::DevicePixelRatio]);
    }

    // ── visibility ────────────────────────────────────────────────────────

    #[test]
    fn fill_visibility_follows_color_and_radius() {
        let mut shape = Shape::new();
        shape.set_radius(8.0);
        assert!(!shape.visibility().fill_center);

        shape.set_color(Rgba::WHITE);
        let v = shape.visibility();
        assert!(v.fill_center && v.fill_corners);

        shape.set_radius(0.0);
        let v = shape.visibility();
        assert!(v.fill_center && !v.fill_corners);
    }

    #[test]
    fn frame_visibility_needs_thickness_and_color() {
        let mut shape = Shape::new();
        shape.set_radius(8.0);
        shape.set_frame_thickness(2.0);
        let v = shape.visibility();
        assert!(v.frame_edges && v.frame_corners);

        shape.set_frame_color(Rgba::TRANSPARENT);
        let v = shape.visibility();
        assert!(!v.frame_edges && !v.frame_corners);
    }

    #[test]
    fn drop_shadow_visibility_clears_with_transparent_color() {
        let mut shape = Shape::new();
        shape.set_drop_shadow_size(6.0);
        assert!(shape.visibility().drop_shadow);
        shape.set_drop_shadow_color(Rgba::TRANSPARENT);
        assert!(!shape.visibility().drop_shadow);
        shape.set_drop_shadow_color(Rgba::BLACK);
        shape.set_drop_shadow_size(0.0);
        assert!(!shape.visibility().drop_shadow);
    }

    #[test]
    fn frame_space_notifies_without_visibility_change() {
        let mut shape = Shape::new();
        shape.set_frame_space(3.0);
        assert!((shape.frame_space() - 3.0).abs() < 1e-3);
        assert_eq!(shape.visibility(), Visibility::default());
        assert_eq!(shape.take_changes(), vec![PropertyChange::FrameSpace]);
    }
}
