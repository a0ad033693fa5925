//! Path command buffer.
//!
//! ```text
//!   commands:     MoveTo  BeginSolidFill  LineTo  CurveTo      EndFill
//!   coordinates:  x y                     x y     cx cy x y
//!   styles:               SolidFill
//! ```
//!
//! Every command consumes a fixed number of coordinates and at most one style
//! record. A buffer is well formed when its commands consume exactly the
//! coordinates and styles it holds.

use kurbo::{Affine, Point};
use serde::{Deserialize, Serialize};

use crate::style::{
    CapsStyle, GradientType, InterpolationMethod, JointStyle, LineScaleMode, SpreadMethod,
};
use crate::{CoreError, CoreResult};

/// A path buffer command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PathCommand {
    /// Start a solid fill.
    BeginSolidFill = 1,
    /// Start a gradient fill.
    BeginGradientFill = 2,
    /// Start a bitmap fill.
    BeginBitmapFill = 3,
    /// End the current fill.
    EndFill = 4,
    /// Start a solid stroke.
    LineStyleSolid = 5,
    /// Start a gradient stroke.
    LineStyleGradient = 6,
    /// Start a bitmap stroke.
    LineStyleBitmap = 7,
    /// End the current stroke.
    LineEnd = 8,
    /// Move the pen.
    MoveTo = 9,
    /// Straight segment.
    LineTo = 10,
    /// Quadratic curve.
    CurveTo = 11,
    /// Cubic curve.
    CubicCurveTo = 12,
}

impl PathCommand {
    /// Number of coordinates the command consumes.
    #[must_use]
    pub const fn coordinate_count(self) -> usize {
        match self {
            Self::MoveTo | Self::LineTo => 2,
            Self::CurveTo => 4,
            Self::CubicCurveTo => 6,
            _ => 0,
        }
    }

    /// Whether the command consumes a style record.
    #[must_use]
    pub const fn has_style(self) -> bool {
        matches!(
            self,
            Self::BeginSolidFill
                | Self::BeginGradientFill
                | Self::BeginBitmapFill
                | Self::LineStyleSolid
                | Self::LineStyleGradient
                | Self::LineStyleBitmap
        )
    }

    /// Whether the command starts or ends a fill.
    #[must_use]
    pub const fn is_fill_change(self) -> bool {
        matches!(
            self,
            Self::BeginSolidFill | Self::BeginGradientFill | Self::BeginBitmapFill | Self::EndFill
        )
    }
}

/// One color stop of a gradient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradientStop {
    /// Color and alpha packed as `0xRRGGBBAA`.
    pub color: u32,
    /// Position of the stop along the gradient, 0..=255.
    pub ratio: u8,
}

impl GradientStop {
    /// Build stops from parallel color, alpha and ratio sequences.
    ///
    /// Returns `None` when the sequences differ in length or a ratio lies
    /// outside `[0, 255]`; the record is then invalid as a whole.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Values are range checked
    pub fn from_records(colors: &[u32], alphas: &[f64], ratios: &[f64]) -> Option<Vec<Self>> {
        if colors.len() != alphas.len() || colors.len() != ratios.len() {
            return None;
        }
        colors
            .iter()
            .zip(alphas)
            .zip(ratios)
            .map(|((&color, &alpha), &ratio)| {
                if !(0.0..=255.0).contains(&ratio) {
                    return None;
                }
                let alpha = (alpha.clamp(0.0, 1.0) * 255.0) as u32;
                Some(Self {
                    color: ((color << 8) & 0xffff_ff00) | alpha,
                    ratio: ratio as u8,
                })
            })
            .collect()
    }
}

/// A gradient fill or stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    /// Linear or radial.
    pub kind: GradientType,
    /// Color stops in order.
    pub stops: Vec<GradientStop>,
    /// Gradient box transform.
    pub matrix: Affine,
    /// Spread beyond the ends.
    pub spread: SpreadMethod,
    /// Interpolation color space.
    pub interpolation: InterpolationMethod,
    /// Focal point, `-1..=1` scaled into a signed byte.
    pub focal_point: i8,
}

/// A bitmap fill or stroke.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BitmapStyle {
    /// Index into the owning drawable's texture list.
    pub texture_index: usize,
    /// Bitmap transform.
    pub matrix: Affine,
    /// Tile the bitmap.
    pub repeat: bool,
    /// Smooth when scaled.
    pub smooth: bool,
}

/// A solid stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineStyle {
    /// Thickness in whole pixels, 0..=255.
    pub thickness: u8,
    /// Color and alpha packed as `0xRRGGBBAA`.
    pub color: u32,
    /// Snap the stroke to whole pixels.
    pub pixel_hinting: bool,
    /// Scaling behavior.
    pub scale_mode: LineScaleMode,
    /// End caps.
    pub caps: CapsStyle,
    /// Joints.
    pub joints: JointStyle,
    /// Miter limit, 0..=255.
    pub miter_limit: u8,
}

/// Payload of a style command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StyleRecord {
    /// Solid fill with packed `0xRRGGBBAA` color.
    SolidFill {
        /// Packed color.
        color: u32,
    },
    /// Gradient fill.
    GradientFill(Gradient),
    /// Bitmap fill.
    BitmapFill(BitmapStyle),
    /// Solid stroke.
    SolidLine(LineStyle),
    /// Gradient stroke.
    GradientLine(Gradient),
    /// Bitmap stroke.
    BitmapLine(BitmapStyle),
}

/// Append-only buffer of path commands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeData {
    commands: Vec<PathCommand>,
    coordinates: Vec<i32>,
    styles: Vec<StyleRecord>,
}

impl ShapeData {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a buffer from its parts, checking that it is well formed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedPath`] or [`CoreError::MalformedStyles`]
    /// if the commands do not consume exactly the given coordinates and styles.
    pub fn from_parts(
        commands: Vec<PathCommand>,
        coordinates: Vec<i32>,
        styles: Vec<StyleRecord>,
    ) -> CoreResult<Self> {
        let shape = Self {
            commands,
            coordinates,
            styles,
        };
        shape.validate()?;
        Ok(shape)
    }

    /// Check that the commands consume exactly the buffered coordinates and
    /// style records.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedPath`] or [`CoreError::MalformedStyles`].
    pub fn validate(&self) -> CoreResult<()> {
        let consumed: usize = self.commands.iter().map(|c| c.coordinate_count()).sum();
        if consumed != self.coordinates.len() {
            return Err(CoreError::MalformedPath {
                consumed,
                available: self.coordinates.len(),
            });
        }
        let styles = self.commands.iter().filter(|c| c.has_style()).count();
        if styles != self.styles.len() {
            return Err(CoreError::MalformedStyles {
                consumed: styles,
                available: self.styles.len(),
            });
        }
        Ok(())
    }

    /// Whether no commands have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Drop every command, coordinate and style.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.coordinates.clear();
        self.styles.clear();
    }

    /// Recorded commands.
    #[must_use]
    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    /// Flat coordinate buffer in twips.
    #[must_use]
    pub fn coordinates(&self) -> &[i32] {
        &self.coordinates
    }

    /// Style records in command order.
    #[must_use]
    pub fn styles(&self) -> &[StyleRecord] {
        &self.styles
    }

    /// Record a pen move.
    pub fn move_to(&mut self, x: i32, y: i32) {
        self.commands.push(PathCommand::MoveTo);
        self.coordinates.extend_from_slice(&[x, y]);
    }

    /// Record a straight segment.
    pub fn line_to(&mut self, x: i32, y: i32) {
        self.commands.push(PathCommand::LineTo);
        self.coordinates.extend_from_slice(&[x, y]);
    }

    /// Record a quadratic curve.
    pub fn curve_to(&mut self, control_x: i32, control_y: i32, anchor_x: i32, anchor_y: i32) {
        self.commands.push(PathCommand::CurveTo);
        self.coordinates
            .extend_from_slice(&[control_x, control_y, anchor_x, anchor_y]);
    }

    /// Record a cubic curve.
    #[allow(clippy::too_many_arguments)]
    pub fn cubic_curve_to(
        &mut self,
        control_x1: i32,
        control_y1: i32,
        control_x2: i32,
        control_y2: i32,
        anchor_x: i32,
        anchor_y: i32,
    ) {
        self.commands.push(PathCommand::CubicCurveTo);
        self.coordinates.extend_from_slice(&[
            control_x1, control_y1, control_x2, control_y2, anchor_x, anchor_y,
        ]);
    }

    /// Start a solid fill with a packed `0xRRGGBBAA` color.
    pub fn begin_fill(&mut self, color: u32) {
        self.push_style(PathCommand::BeginSolidFill, StyleRecord::SolidFill { color });
    }

    /// Start a gradient fill.
    pub fn begin_gradient_fill(&mut self, gradient: Gradient) {
        self.push_style(PathCommand::BeginGradientFill, StyleRecord::GradientFill(gradient));
    }

    /// Start a bitmap fill.
    pub fn begin_bitmap_fill(&mut self, style: BitmapStyle) {
        self.push_style(PathCommand::BeginBitmapFill, StyleRecord::BitmapFill(style));
    }

    /// End the current fill.
    pub fn end_fill(&mut self) {
        self.commands.push(PathCommand::EndFill);
    }

    /// Start a solid stroke.
    pub fn line_style(&mut self, style: LineStyle) {
        self.push_style(PathCommand::LineStyleSolid, StyleRecord::SolidLine(style));
    }

    /// Start a gradient stroke.
    pub fn line_gradient_style(&mut self, gradient: Gradient) {
        self.push_style(PathCommand::LineStyleGradient, StyleRecord::GradientLine(gradient));
    }

    /// Start a bitmap stroke.
    pub fn line_bitmap_style(&mut self, style: BitmapStyle) {
        self.push_style(PathCommand::LineStyleBitmap, StyleRecord::BitmapLine(style));
    }

    /// End the current stroke.
    pub fn end_line(&mut self) {
        self.commands.push(PathCommand::LineEnd);
    }

    fn push_style(&mut self, command: PathCommand, record: StyleRecord) {
        self.commands.push(command);
        self.styles.push(record);
    }

    /// Walk the buffer as decoded segments.
    ///
    /// On a malformed buffer the walk stops at the first command whose
    /// operands are missing; debug builds assert instead.
    #[must_use]
    pub fn segments(&self) -> Segments<'_> {
        Segments {
            shape: self,
            command: 0,
            coordinate: 0,
            style: 0,
        }
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string(self).map_err(CoreError::Serialization)
    }

    /// Deserialize from JSON and validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or the buffer is malformed.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let shape: Self = serde_json::from_str(json)?;
        shape.validate()?;
        Ok(shape)
    }
}

/// A decoded path command with its operands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment<'a> {
    /// Pen move.
    MoveTo(Point),
    /// Straight segment to the point.
    LineTo(Point),
    /// Quadratic curve.
    CurveTo {
        /// Control point.
        cp: Point,
        /// Anchor point.
        to: Point,
    },
    /// Cubic curve.
    CubicCurveTo {
        /// First control point.
        cp: Point,
        /// Second control point.
        cp2: Point,
        /// Anchor point.
        to: Point,
    },
    /// Style change; the record is absent for `EndFill` and `LineEnd`.
    Style(PathCommand, Option<&'a StyleRecord>),
}

/// Iterator returned by [`ShapeData::segments`].
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    shape: &'a ShapeData,
    command: usize,
    coordinate: usize,
    style: usize,
}

impl<'a> Iterator for Segments<'a> {
    type Item = PathSegment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let command = *self.shape.commands.get(self.command)?;
        self.command += 1;

        let count = command.coordinate_count();
        let Some(operands) = self
            .shape
            .coordinates
            .get(self.coordinate..self.coordinate + count)
        else {
            debug_assert!(false, "path command {command:?} is missing its coordinates");
            return None;
        };
        self.coordinate += count;
        let point = |i: usize| Point::new(f64::from(operands[i]), f64::from(operands[i + 1]));

        Some(match command {
            PathCommand::MoveTo => PathSegment::MoveTo(point(0)),
            PathCommand::LineTo => PathSegment::LineTo(point(0)),
            PathCommand::CurveTo => PathSegment::CurveTo {
                cp: point(0),
                to: point(2),
            },
            PathCommand::CubicCurveTo => PathSegment::CubicCurveTo {
                cp: point(0),
                cp2: point(2),
                to: point(4),
            },
            other => {
                let record = if other.has_style() {
                    let record = self.shape.styles.get(self.style);
                    debug_assert!(record.is_some(), "style command {other:?} has no record");
                    self.style += 1;
                    record
                } else {
                    None
                };
                PathSegment::Style(other, record)
            }
        })
    }
}
