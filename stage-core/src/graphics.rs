//! Vector drawables.
//!
//! A [`Graphics`] records drawing calls into a [`ShapeData`] buffer and keeps
//! two bounding boxes up to date as it goes:
//!
//! ```text
//!   line bounds  ┌──────────────────────┐  ▲ top/left stroke inflation
//!                │ fill bounds          │
//!                │ ┌──────────────────┐ │
//!                │ │    geometry      │ │
//!                │ └──────────────────┘ │
//!                └──────────────────────┘  ▼ bottom/right stroke inflation
//! ```
//!
//! Drawing methods take pixel coordinates and store twips. Bounds are only
//! extended when a segment is actually drawn, so a trailing `move_to` never
//! grows them.

use kurbo::Point;
use serde::{Deserialize, Serialize};

use crate::bounds::{to_twips, Bounds, SENTINEL};
use crate::geometry::{
    cubic_bezier_extremes, quadratic_bezier_extreme, ray_fully_crosses_cubic_curve,
    ray_fully_crosses_curve, ray_intersects_line, RootFinderConfig,
};
use crate::resource::BitmapData;
use crate::shape::{BitmapStyle, Gradient, GradientStop, LineStyle, PathCommand, PathSegment, ShapeData};
use crate::style::{
    CapsStyle, GradientType, InterpolationMethod, JointStyle, LineScaleMode, SpreadMethod,
};
use crate::transform::Matrix;
use crate::{CoreError, CoreResult, ObjectId};

/// Arguments of a gradient fill or stroke.
///
/// Absent `kind`, `colors`, `alphas` or `ratios` are contract violations.
/// Mismatched lengths or out-of-range ratios are not; they fall back to
/// opaque white.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientSpec<'a> {
    /// Gradient type name, `"linear"` or `"radial"`.
    pub kind: Option<&'a str>,
    /// `0xRRGGBB` colors.
    pub colors: Option<&'a [u32]>,
    /// Alphas in `[0, 1]`.
    pub alphas: Option<&'a [f64]>,
    /// Stop positions in `[0, 255]`.
    pub ratios: Option<&'a [f64]>,
    /// Gradient box transform; identity when unset.
    pub matrix: Option<Matrix>,
    /// Spread method name; `"pad"` when unset or unknown.
    pub spread_method: Option<&'a str>,
    /// Interpolation method name; `"rgb"` when unset or unknown.
    pub interpolation_method: Option<&'a str>,
    /// Focal point in `[-1, 1]`.
    pub focal_point_ratio: f64,
}

impl<'a> GradientSpec<'a> {
    /// A gradient with default matrix, spread, interpolation and focal point.
    #[must_use]
    pub const fn new(kind: &'a str, colors: &'a [u32], alphas: &'a [f64], ratios: &'a [f64]) -> Self {
        Self {
            kind: Some(kind),
            colors: Some(colors),
            alphas: Some(alphas),
            ratios: Some(ratios),
            matrix: None,
            spread_method: None,
            interpolation_method: None,
            focal_point_ratio: 0.0,
        }
    }
}

/// Arguments of a solid stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeSpec<'a> {
    /// Thickness in pixels; NaN ends the stroke.
    pub thickness: f64,
    /// `0xRRGGBB` color.
    pub color: u32,
    /// Alpha in `[0, 1]`.
    pub alpha: f64,
    /// Snap to whole pixels.
    pub pixel_hinting: bool,
    /// Scale mode name; `"normal"` when unset or unknown.
    pub scale_mode: Option<&'a str>,
    /// Caps name; `"round"` when unset or unknown.
    pub caps: Option<&'a str>,
    /// Joints name; `"round"` when unset or unknown.
    pub joints: Option<&'a str>,
    /// Miter limit, clamped to `0..=255`.
    pub miter_limit: f64,
}

impl StrokeSpec<'_> {
    /// A black opaque stroke with default styles.
    #[must_use]
    pub const fn new(thickness: f64) -> Self {
        Self {
            thickness,
            color: 0,
            alpha: 1.0,
            pixel_hinting: false,
            scale_mode: None,
            caps: None,
            joints: None,
            miter_limit: 3.0,
        }
    }
}

/// Pre-parsed shape data for a drawable built from a symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeSymbol {
    /// Path commands.
    pub shape: ShapeData,
    /// Bitmaps referenced by texture index.
    pub textures: Vec<ObjectId>,
    /// The shape contains fills.
    pub has_fills: bool,
    /// The shape contains strokes.
    pub has_lines: bool,
    /// Precomputed fill bounds.
    pub fill_bounds: Option<Bounds>,
    /// Precomputed line bounds; required when `has_lines` is set.
    pub line_bounds: Option<Bounds>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GradientTarget {
    Fill,
    Line,
}

/// A vector drawable.
#[derive(Debug, Clone, PartialEq)]
pub struct Graphics {
    id: ObjectId,
    shape: ShapeData,
    textures: Vec<ObjectId>,
    has_fills: bool,
    has_lines: bool,
    fill_bounds: Bounds,
    line_bounds: Bounds,
    last_x: i32,
    last_y: i32,
    bounds_include_last_coordinates: bool,
    top_left_stroke_width: i32,
    bottom_right_stroke_width: i32,
    line_thickness: f64,
    owner: Option<ObjectId>,
    dirty: bool,
}

impl Graphics {
    /// Create an empty drawable. New drawables are dirty.
    #[must_use]
    pub fn new(id: ObjectId) -> Self {
        Self {
            id,
            shape: ShapeData::new(),
            textures: Vec::new(),
            has_fills: false,
            has_lines: false,
            fill_bounds: Bounds::EMPTY,
            line_bounds: Bounds::EMPTY,
            last_x: 0,
            last_y: 0,
            bounds_include_last_coordinates: false,
            top_left_stroke_width: 0,
            bottom_right_stroke_width: 0,
            line_thickness: 0.0,
            owner: None,
            dirty: true,
        }
    }

    /// Create a drawable from symbol data.
    ///
    /// # Errors
    ///
    /// Returns an error if the path buffer is malformed.
    pub fn from_shape(id: ObjectId, symbol: ShapeSymbol) -> CoreResult<Self> {
        symbol.shape.validate()?;
        let mut graphics = Self::new(id);
        graphics.shape = symbol.shape;
        graphics.textures = symbol.textures;
        graphics.has_fills = symbol.has_fills;
        graphics.has_lines = symbol.has_lines;
        if let Some(fill_bounds) = symbol.fill_bounds {
            debug_assert_eq!(symbol.has_lines, symbol.line_bounds.is_some());
            graphics.fill_bounds = fill_bounds;
            graphics.line_bounds = if symbol.has_lines {
                symbol.line_bounds.unwrap_or(fill_bounds)
            } else {
                fill_bounds
            };
        }
        Ok(graphics)
    }

    /// Identity.
    #[must_use]
    pub const fn id(&self) -> ObjectId {
        self.id
    }

    /// The recorded path.
    #[must_use]
    pub fn shape(&self) -> &ShapeData {
        &self.shape
    }

    /// Bitmaps referenced by bitmap fills and strokes, by texture index.
    #[must_use]
    pub fn textures(&self) -> &[ObjectId] {
        &self.textures
    }

    /// Whether any fill was started.
    #[must_use]
    pub const fn has_fills(&self) -> bool {
        self.has_fills
    }

    /// Whether any stroke was started.
    #[must_use]
    pub const fn has_lines(&self) -> bool {
        self.has_lines
    }

    /// Bounds of the geometry alone.
    #[must_use]
    pub const fn fill_bounds(&self) -> Bounds {
        self.fill_bounds
    }

    /// Bounds of the geometry inflated by stroke widths.
    #[must_use]
    pub const fn line_bounds(&self) -> Bounds {
        self.line_bounds
    }

    /// Line bounds when `include_strokes`, otherwise fill bounds.
    #[must_use]
    pub const fn content_bounds(&self, include_strokes: bool) -> Bounds {
        if include_strokes {
            self.line_bounds
        } else {
            self.fill_bounds
        }
    }

    /// Current stroke inflation as `(top/left, bottom/right)` in twips.
    #[must_use]
    pub const fn stroke_widths(&self) -> (i32, i32) {
        (self.top_left_stroke_width, self.bottom_right_stroke_width)
    }

    /// Current pen position in twips.
    #[must_use]
    pub const fn pen(&self) -> (i32, i32) {
        (self.last_x, self.last_y)
    }

    /// The node this drawable belongs to.
    #[must_use]
    pub const fn owner(&self) -> Option<ObjectId> {
        self.owner
    }

    /// Attach the drawable to its node. The owner is assigned once.
    pub fn set_owner(&mut self, owner: ObjectId) {
        debug_assert!(
            self.owner.is_none() || self.owner == Some(owner),
            "graphics {} already owned by {:?}",
            self.id,
            self.owner
        );
        self.owner = Some(owner);
    }

    /// Whether the drawable changed since it was last sent.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark the drawable changed.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Mark the drawable sent.
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Drop all drawing. Does nothing when already empty.
    pub fn clear(&mut self) {
        if self.shape.is_empty() {
            return;
        }
        self.shape.clear();
        self.textures.clear();
        self.fill_bounds.set_to_sentinels();
        self.line_bounds.set_to_sentinels();
        self.last_x = 0;
        self.last_y = 0;
        self.bounds_include_last_coordinates = false;
        self.dirty = true;
    }

    /// Start a solid fill. `alpha` is clamped to `[0, 1]`.
    pub fn begin_fill(&mut self, color: u32, alpha: f64) {
        self.shape.begin_fill(pack_color(color, alpha));
        self.has_fills = true;
        self.dirty = true;
    }

    /// Start a gradient fill.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NullArgument`] for a missing required argument and
    /// [`CoreError::InvalidEnum`] for an unknown gradient type.
    pub fn begin_gradient_fill(&mut self, spec: &GradientSpec<'_>) -> CoreResult<()> {
        self.write_gradient_style(GradientTarget::Fill, spec)?;
        self.has_fills = true;
        Ok(())
    }

    /// Start a bitmap fill.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NullArgument`] when `bitmap` is absent.
    pub fn begin_bitmap_fill(
        &mut self,
        bitmap: Option<&BitmapData>,
        matrix: Option<Matrix>,
        repeat: bool,
        smooth: bool,
    ) -> CoreResult<()> {
        let style = self.bitmap_style(bitmap, matrix, repeat, smooth)?;
        self.shape.begin_bitmap_fill(style);
        self.has_fills = true;
        self.dirty = true;
        Ok(())
    }

    /// End the current fill.
    pub fn end_fill(&mut self) {
        self.shape.end_fill();
        self.dirty = true;
    }

    /// Start a solid stroke.
    ///
    /// A NaN thickness ends the current stroke instead. The stroke width only
    /// affects bounds extended afterwards.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Clamped to 0..=255 first
    pub fn line_style(&mut self, spec: &StrokeSpec<'_>) {
        self.dirty = true;
        if spec.thickness.is_nan() {
            self.set_stroke_width(0);
            self.shape.end_line();
            return;
        }
        let thickness = spec.thickness.round().clamp(0.0, 255.0) as u8;
        self.line_thickness = f64::from(thickness);
        self.set_stroke_width(i32::from(thickness) * 20);

        let miter_limit = if spec.miter_limit.is_nan() {
            0
        } else {
            spec.miter_limit.clamp(0.0, 255.0) as u8
        };
        self.shape.line_style(LineStyle {
            thickness,
            color: pack_color(spec.color, spec.alpha),
            pixel_hinting: spec.pixel_hinting,
            scale_mode: LineScaleMode::parse_or_default(spec.scale_mode),
            caps: CapsStyle::parse_or_default(spec.caps),
            joints: JointStyle::parse_or_default(spec.joints),
            miter_limit,
        });
        self.has_lines = true;
    }

    /// Apply a gradient to the current stroke.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NullArgument`] for a missing required argument and
    /// [`CoreError::InvalidEnum`] for an unknown gradient type.
    pub fn line_gradient_style(&mut self, spec: &GradientSpec<'_>) -> CoreResult<()> {
        self.write_gradient_style(GradientTarget::Line, spec)
    }

    /// Apply a bitmap to the current stroke.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NullArgument`] when `bitmap` is absent.
    pub fn line_bitmap_style(
        &mut self,
        bitmap: Option<&BitmapData>,
        matrix: Option<Matrix>,
        repeat: bool,
        smooth: bool,
    ) -> CoreResult<()> {
        let style = self.bitmap_style(bitmap, matrix, repeat, smooth)?;
        self.shape.line_bitmap_style(style);
        self.dirty = true;
        Ok(())
    }

    /// Draw an axis-aligned rectangle, starting and ending at its top-left
    /// corner.
    pub fn draw_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let x1 = to_twips(x);
        let y1 = to_twips(y);
        let x2 = x1 + to_twips(width);
        let y2 = y1 + to_twips(height);

        if x1 != self.last_x || y1 != self.last_y {
            self.shape.move_to(x1, y1);
            self.last_x = x1;
            self.last_y = y1;
            self.bounds_include_last_coordinates = false;
        }
        self.shape.line_to(x2, y1);
        self.shape.line_to(x2, y2);
        self.shape.line_to(x1, y2);
        self.shape.line_to(x1, y1);

        self.extend_bounds_by_point(x2, y2);
        self.apply_last_coordinates(x1, y1);
        self.dirty = true;
    }

    /// Draw a rectangle with elliptical corners.
    ///
    /// Degenerates to [`draw_rect`](Self::draw_rect) when either ellipse
    /// dimension is zero, and to a circle or ellipse when the corners meet.
    #[allow(clippy::float_cmp)] // Radii are compared after truncation to whole pixels
    pub fn draw_round_rect(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        ellipse_width: f64,
        ellipse_height: f64,
    ) {
        if is_zero_or_nan(ellipse_width) || is_zero_or_nan(ellipse_height) {
            self.draw_rect(x, y, width, height);
            return;
        }

        let half_width = width / 2.0;
        let half_height = height / 2.0;
        let radius_x = (ellipse_width / 2.0).trunc().min(half_width);
        let radius_y = (ellipse_height / 2.0).trunc().min(half_height);
        if half_width == radius_x && half_height == radius_y {
            if radius_x == radius_y {
                self.draw_circle(x + radius_x, y + radius_y, radius_x);
            } else {
                self.draw_ellipse(x, y, radius_x * 2.0, radius_y * 2.0);
            }
            return;
        }

        //    A-----B
        //  H         C
        //  G         D
        //    F-----E
        //
        // Starts and ends at D.
        let right = x + width;
        let bottom = y + height;
        let xlw = x + radius_x;
        let xrw = right - radius_x;
        let ytw = y + radius_y;
        let ybw = bottom - radius_y;
        self.move_to(right, ybw);
        self.curve_to(right, bottom, xrw, bottom);
        self.line_to(xlw, bottom);
        self.curve_to(x, bottom, x, ybw);
        self.line_to(x, ytw);
        self.curve_to(x, y, xlw, y);
        self.line_to(xrw, y);
        self.curve_to(right, y, right, ytw);
        self.line_to(right, ybw);
    }

    /// Draw a rectangle with an independent radius per corner.
    #[allow(clippy::too_many_arguments)]
    #[allow(clippy::cast_possible_truncation)] // Whole-pixel test only
    pub fn draw_round_rect_complex(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        top_left_radius: f64,
        top_right_radius: f64,
        bottom_left_radius: f64,
        bottom_right_radius: f64,
    ) {
        let any_radius = [
            top_left_radius,
            top_right_radius,
            bottom_left_radius,
            bottom_right_radius,
        ]
        .iter()
        .any(|&r| r as i32 != 0);
        if !any_radius {
            self.draw_rect(x, y, width, height);
            return;
        }

        let right = x + width;
        let bottom = y + height;
        self.move_to(right, bottom - bottom_right_radius);
        self.curve_to(right, bottom, right - bottom_right_radius, bottom);
        self.line_to(x + bottom_left_radius, bottom);
        self.curve_to(x, bottom, x, bottom - bottom_left_radius);
        self.line_to(x, y + top_left_radius);
        self.curve_to(x, y, x + top_left_radius, y);
        self.line_to(right - top_right_radius, y);
        self.curve_to(right, y, right, y + top_right_radius);
        self.line_to(right, bottom - bottom_right_radius);
    }

    /// Draw a circle centered on `(x, y)`.
    pub fn draw_circle(&mut self, x: f64, y: f64, radius: f64) {
        self.draw_ellipse(x - radius, y - radius, radius * 2.0, radius * 2.0);
    }

    /// Draw an ellipse inscribed in the given box, as four cubic arcs
    /// starting at its rightmost point.
    pub fn draw_ellipse(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let rx = width / 2.0;
        let ry = height / 2.0;
        let center_x = x + rx;
        let center_y = y + ry;
        let kappa = 4.0 / 3.0 * (std::f64::consts::FRAC_PI_2 / 4.0).tan();

        let mut current_x = center_x + rx;
        let mut current_y = center_y;
        self.move_to(current_x, current_y);
        let mut angle = 0.0_f64;
        let (mut u, mut v) = (1.0_f64, 0.0_f64);
        for _ in 0..4 {
            let end_angle = angle + std::f64::consts::FRAC_PI_2;
            let cp1x = current_x - v * kappa * rx;
            let cp1y = current_y + u * kappa * ry;
            u = end_angle.cos();
            v = end_angle.sin();
            current_x = center_x + u * rx;
            current_y = center_y + v * ry;
            let cp2x = current_x + v * kappa * rx;
            let cp2y = current_y - u * kappa * ry;
            self.cubic_curve_to(cp1x, cp1y, cp2x, cp2y, current_x, current_y);
            angle = end_angle;
        }
    }

    /// Move the pen without drawing. Bounds are not extended.
    pub fn move_to(&mut self, x: f64, y: f64) {
        let x = to_twips(x);
        let y = to_twips(y);
        self.shape.move_to(x, y);
        self.last_x = x;
        self.last_y = y;
        self.bounds_include_last_coordinates = false;
        self.dirty = true;
    }

    /// Draw a straight segment from the pen.
    pub fn line_to(&mut self, x: f64, y: f64) {
        let x = to_twips(x);
        let y = to_twips(y);
        self.shape.line_to(x, y);
        self.apply_last_coordinates(x, y);
        self.dirty = true;
    }

    /// Draw a quadratic curve from the pen.
    #[allow(clippy::cast_possible_truncation)] // Extremes lie between twip coordinates
    pub fn curve_to(&mut self, control_x: f64, control_y: f64, anchor_x: f64, anchor_y: f64) {
        let control_x = to_twips(control_x);
        let control_y = to_twips(control_y);
        let anchor_x = to_twips(anchor_x);
        let anchor_y = to_twips(anchor_y);
        self.shape.curve_to(control_x, control_y, anchor_x, anchor_y);

        if control_x < self.last_x || control_x > anchor_x {
            let extreme = quadratic_bezier_extreme(
                f64::from(self.last_x),
                f64::from(control_x),
                f64::from(anchor_x),
            );
            self.extend_bounds_by_x(extreme as i32);
        }
        if control_y < self.last_y || control_y > anchor_y {
            let extreme = quadratic_bezier_extreme(
                f64::from(self.last_y),
                f64::from(control_y),
                f64::from(anchor_y),
            );
            self.extend_bounds_by_y(extreme as i32);
        }
        self.apply_last_coordinates(anchor_x, anchor_y);
        self.dirty = true;
    }

    /// Draw a cubic curve from the pen.
    #[allow(clippy::cast_possible_truncation)] // Extremes lie between twip coordinates
    pub fn cubic_curve_to(
        &mut self,
        control_x1: f64,
        control_y1: f64,
        control_x2: f64,
        control_y2: f64,
        anchor_x: f64,
        anchor_y: f64,
    ) {
        let control_x1 = to_twips(control_x1);
        let control_y1 = to_twips(control_y1);
        let control_x2 = to_twips(control_x2);
        let control_y2 = to_twips(control_y2);
        let anchor_x = to_twips(anchor_x);
        let anchor_y = to_twips(anchor_y);
        self.shape.cubic_curve_to(
            control_x1, control_y1, control_x2, control_y2, anchor_x, anchor_y,
        );

        let from_x = self.last_x;
        let from_y = self.last_y;
        if control_x1 < from_x || control_x2 < from_x || control_x1 > anchor_x || control_x2 > anchor_x {
            let extremes = cubic_bezier_extremes(
                f64::from(from_x),
                f64::from(control_x1),
                f64::from(control_x2),
                f64::from(anchor_x),
            );
            for extreme in extremes {
                self.extend_bounds_by_x(extreme as i32);
            }
        }
        if control_y1 < from_y || control_y2 < from_y || control_y1 > anchor_y || control_y2 > anchor_y {
            let extremes = cubic_bezier_extremes(
                f64::from(from_y),
                f64::from(control_y1),
                f64::from(control_y2),
                f64::from(anchor_y),
            );
            for extreme in extremes {
                self.extend_bounds_by_y(extreme as i32);
            }
        }
        self.apply_last_coordinates(anchor_x, anchor_y);
        self.dirty = true;
    }

    /// Replace this drawable's content with a copy of `source`'s.
    pub fn copy_from(&mut self, source: &Self) {
        self.shape = source.shape.clone();
        self.textures = source.textures.clone();
        self.has_fills = source.has_fills;
        self.has_lines = source.has_lines;
        self.fill_bounds = source.fill_bounds;
        self.line_bounds = source.line_bounds;
        self.last_x = source.last_x;
        self.last_y = source.last_y;
        self.bounds_include_last_coordinates = source.bounds_include_last_coordinates;
        self.dirty = true;
    }

    /// Whether the pixel point lies inside the drawable's fills.
    ///
    /// With `include_lines`, the stroke-inflated bounds of a stroked drawable
    /// are used to reject points early; strokes themselves are never hit.
    #[must_use]
    pub fn contains_point(&self, x: f64, y: f64, include_lines: bool) -> bool {
        self.contains_point_with(x, y, include_lines, &RootFinderConfig::default())
    }

    /// [`contains_point`](Self::contains_point) with explicit root finder
    /// tuning.
    #[must_use]
    pub fn contains_point_with(
        &self,
        x: f64,
        y: f64,
        include_lines: bool,
        config: &RootFinderConfig,
    ) -> bool {
        let x = to_twips(x);
        let y = to_twips(y);
        let check_lines = include_lines && self.has_lines;
        let bounds = if check_lines {
            &self.line_bounds
        } else {
            &self.fill_bounds
        };
        if !bounds.contains(x, y) {
            return false;
        }
        self.has_fills && self.fill_contains_point(f64::from(x), f64::from(y), config)
    }

    /// Even-odd ray cast over the filled parts of the path, in twips.
    fn fill_contains_point(&self, x: f64, y: f64, config: &RootFinderConfig) -> bool {
        let mut from = Point::ZERO;
        let mut form_start = Point::ZERO;
        let mut form_open = false;
        let mut fill_active = false;
        let mut inside = false;

        for segment in self.shape.segments() {
            match segment {
                PathSegment::MoveTo(to) => {
                    if form_open && fill_active && ray_intersects_line(x, y, from, form_start) {
                        inside = !inside;
                    }
                    form_open = true;
                    form_start = to;
                    from = to;
                }
                PathSegment::LineTo(to) => {
                    if fill_active && ray_intersects_line(x, y, from, to) {
                        inside = !inside;
                    }
                    from = to;
                }
                PathSegment::CurveTo { cp, to } => {
                    if fill_active && ray_fully_crosses_curve(x, y, from, cp, to) {
                        inside = !inside;
                    }
                    from = to;
                }
                PathSegment::CubicCurveTo { cp, cp2, to } => {
                    if fill_active && ray_fully_crosses_cubic_curve(x, y, from, cp, cp2, to, config) {
                        inside = !inside;
                    }
                    from = to;
                }
                PathSegment::Style(command, _) if command.is_fill_change() => {
                    if form_open && fill_active && ray_intersects_line(x, y, from, form_start) {
                        inside = !inside;
                    }
                    // The next form starts at the next move.
                    fill_active = command != PathCommand::EndFill;
                    form_open = false;
                }
                PathSegment::Style(..) => {}
            }
        }
        if form_open && fill_active && ray_intersects_line(x, y, from, form_start) {
            inside = !inside;
        }
        inside
    }

    /// Set the stroke inflation from a width in twips.
    ///
    /// Widths 1 and 3 are biased toward the bottom/right.
    fn set_stroke_width(&mut self, width: i32) {
        let (top_left, bottom_right) = match width {
            1 => (0, 1),
            3 => (1, 2),
            _ => {
                let half = (width + 1) / 2;
                (half, half)
            }
        };
        self.top_left_stroke_width = top_left;
        self.bottom_right_stroke_width = bottom_right;
    }

    fn write_gradient_style(
        &mut self,
        target: GradientTarget,
        spec: &GradientSpec<'_>,
    ) -> CoreResult<()> {
        let kind = spec.kind.ok_or(CoreError::NullArgument("type"))?;
        let kind = GradientType::from_name(kind).ok_or(CoreError::InvalidEnum("type"))?;
        let colors = spec.colors.ok_or(CoreError::NullArgument("colors"))?;
        let alphas = spec.alphas.ok_or(CoreError::NullArgument("alphas"))?;
        let ratios = spec.ratios.ok_or(CoreError::NullArgument("ratios"))?;

        let Some(stops) = GradientStop::from_records(colors, alphas, ratios) else {
            tracing::debug!(
                "Invalid gradient records on graphics {}, using solid white",
                self.id
            );
            match target {
                GradientTarget::Fill => self.begin_fill(0x00ff_ffff, 1.0),
                GradientTarget::Line => self.line_style(&StrokeSpec {
                    color: 0x00ff_ffff,
                    ..StrokeSpec::new(self.line_thickness)
                }),
            }
            return Ok(());
        };

        let gradient = Gradient {
            kind,
            stops,
            matrix: spec.matrix.unwrap_or(Matrix::IDENTITY),
            spread: SpreadMethod::parse_or_default(spec.spread_method),
            interpolation: InterpolationMethod::parse_or_default(spec.interpolation_method),
            focal_point: focal_point_byte(spec.focal_point_ratio),
        };
        match target {
            GradientTarget::Fill => self.shape.begin_gradient_fill(gradient),
            GradientTarget::Line => self.shape.line_gradient_style(gradient),
        }
        self.dirty = true;
        Ok(())
    }

    fn bitmap_style(
        &mut self,
        bitmap: Option<&BitmapData>,
        matrix: Option<Matrix>,
        repeat: bool,
        smooth: bool,
    ) -> CoreResult<BitmapStyle> {
        let bitmap = bitmap.ok_or(CoreError::NullArgument("bitmap"))?;
        let texture_index = match self.textures.iter().position(|&id| id == bitmap.id()) {
            Some(index) => index,
            None => {
                self.textures.push(bitmap.id());
                self.textures.len() - 1
            }
        };
        Ok(BitmapStyle {
            texture_index,
            matrix: matrix.unwrap_or(Matrix::IDENTITY),
            repeat,
            smooth,
        })
    }

    fn extend_bounds_by_point(&mut self, x: i32, y: i32) {
        self.extend_bounds_by_x(x);
        self.extend_bounds_by_y(y);
    }

    fn extend_bounds_by_x(&mut self, x: i32) {
        self.fill_bounds.extend_by_x(x);
        let bounds = &mut self.line_bounds;
        if bounds.x_min == SENTINEL {
            bounds.x_min = x - self.top_left_stroke_width;
            bounds.x_max = x + self.bottom_right_stroke_width;
        } else {
            bounds.x_min = bounds.x_min.min(x - self.top_left_stroke_width);
            bounds.x_max = bounds.x_max.max(x + self.bottom_right_stroke_width);
        }
    }

    fn extend_bounds_by_y(&mut self, y: i32) {
        self.fill_bounds.extend_by_y(y);
        let bounds = &mut self.line_bounds;
        if bounds.y_min == SENTINEL {
            bounds.y_min = y - self.top_left_stroke_width;
            bounds.y_max = y + self.bottom_right_stroke_width;
        } else {
            bounds.y_min = bounds.y_min.min(y - self.top_left_stroke_width);
            bounds.y_max = bounds.y_max.max(y + self.bottom_right_stroke_width);
        }
    }

    /// Flush the deferred pen position into the bounds, then record the new
    /// end point.
    fn apply_last_coordinates(&mut self, x: i32, y: i32) {
        if !self.bounds_include_last_coordinates {
            self.extend_bounds_by_point(self.last_x, self.last_y);
        }
        self.bounds_include_last_coordinates = true;
        self.last_x = x;
        self.last_y = y;
        self.extend_bounds_by_point(x, y);
    }
}

/// Pack `0xRRGGBB` and an alpha in `[0, 1]` into `0xRRGGBBAA`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Alpha is clamped to 0..=255
fn pack_color(color: u32, alpha: f64) -> u32 {
    let alpha = if alpha.is_nan() {
        0
    } else {
        (alpha.clamp(0.0, 1.0) * 255.0).round() as u32
    };
    ((color & 0x00ff_ffff) << 8) | alpha
}

#[allow(clippy::cast_possible_truncation)] // |ratio / 2 * 255| < 128
fn focal_point_byte(ratio: f64) -> i8 {
    if ratio.is_nan() {
        return 0;
    }
    (ratio.clamp(-1.0, 1.0) / 2.0 * 255.0) as i8
}

#[allow(clippy::float_cmp)]
fn is_zero_or_nan(value: f64) -> bool {
    value == 0.0 || value.is_nan()
}
