//! String-selected style enumerations.
//!
//! Drawing calls name styles with strings (`"pad"`, `"round"`, ...). Each
//! enumeration parses its names into `Option<Self>`; callers that must never
//! fail use [`parse_or_default`](SpreadMethod::parse_or_default), which maps
//! an unknown or absent name to the documented default. The numeric codes
//! are the values written to the wire.

macro_rules! selector_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident (default $default:ident) {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $value:literal => $text:literal,
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $name {
            /// Parse a selector name; `None` if it is not recognized.
            #[must_use]
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($text => Some(Self::$variant),)+
                    _ => None,
                }
            }

            /// Parse a selector name, substituting the default when the name
            /// is absent or unrecognized.
            #[must_use]
            pub fn parse_or_default(name: Option<&str>) -> Self {
                name.and_then(Self::from_name).unwrap_or_default()
            }

            /// Parse a wire code.
            #[must_use]
            pub fn from_number(value: i32) -> Option<Self> {
                match value {
                    $($value => Some(Self::$variant),)+
                    _ => None,
                }
            }

            /// The selector name.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }

            /// The wire code.
            #[must_use]
            pub const fn to_number(self) -> i32 {
                match self {
                    $(Self::$variant => $value,)+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

pub(crate) use selector_enum;

selector_enum! {
    /// Gradient geometry.
    pub enum GradientType (default Linear) {
        /// Linear gradient.
        Linear = 0x10 => "linear",
        /// Radial gradient.
        Radial = 0x12 => "radial",
    }
}

selector_enum! {
    /// How a gradient fills space beyond its ends.
    pub enum SpreadMethod (default Pad) {
        /// Extend the end colors.
        Pad = 0 => "pad",
        /// Mirror the gradient.
        Reflect = 1 => "reflect",
        /// Repeat the gradient.
        Repeat = 2 => "repeat",
    }
}

selector_enum! {
    /// Color space used to interpolate gradient stops.
    pub enum InterpolationMethod (default Rgb) {
        /// Interpolate in sRGB.
        Rgb = 0 => "rgb",
        /// Interpolate in linear RGB.
        LinearRgb = 1 => "linearRGB",
    }
}

selector_enum! {
    /// Which transform axes scale a stroke.
    pub enum LineScaleMode (default Normal) {
        /// Never scale the stroke.
        None = 0 => "none",
        /// Always scale the stroke.
        Normal = 1 => "normal",
        /// Scale only vertically.
        Vertical = 2 => "vertical",
        /// Scale only horizontally.
        Horizontal = 3 => "horizontal",
    }
}

selector_enum! {
    /// Stroke end caps.
    pub enum CapsStyle (default Round) {
        /// Rounded caps.
        Round = 0 => "round",
        /// No caps.
        None = 1 => "none",
        /// Square caps.
        Square = 2 => "square",
    }
}

selector_enum! {
    /// Stroke joints.
    pub enum JointStyle (default Round) {
        /// Rounded joints.
        Round = 0 => "round",
        /// Beveled joints.
        Bevel = 1 => "bevel",
        /// Mitered joints.
        Miter = 2 => "miter",
    }
}

selector_enum! {
    /// Fill rule for self-intersecting paths.
    pub enum WindingRule (default EvenOdd) {
        /// Even-odd rule.
        EvenOdd = 0 => "evenOdd",
        /// Non-zero rule.
        NonZero = 1 => "nonZero",
    }
}

selector_enum! {
    /// Compositing mode of a node.
    pub enum BlendMode (default Normal) {
        /// Plain source-over.
        Normal = 1 => "normal",
        /// Composite as an isolated group.
        Layer = 2 => "layer",
        /// Multiply.
        Multiply = 3 => "multiply",
        /// Screen.
        Screen = 4 => "screen",
        /// Lighten.
        Lighten = 5 => "lighten",
        /// Darken.
        Darken = 6 => "darken",
        /// Difference.
        Difference = 7 => "difference",
        /// Add.
        Add = 8 => "add",
        /// Subtract.
        Subtract = 9 => "subtract",
        /// Invert.
        Invert = 10 => "invert",
        /// Apply alpha to the parent layer.
        Alpha = 11 => "alpha",
        /// Erase the parent layer.
        Erase = 12 => "erase",
        /// Overlay.
        Overlay = 13 => "overlay",
        /// Hard light.
        HardLight = 14 => "hardlight",
    }
}

selector_enum! {
    /// Pixel snapping of bitmap nodes.
    pub enum PixelSnapping (default Auto) {
        /// Never snap.
        Never = 0 => "never",
        /// Always snap.
        Always = 1 => "always",
        /// Snap when untransformed.
        Auto = 2 => "auto",
    }
}

selector_enum! {
    /// Paragraph alignment of a text run.
    pub enum TextFormatAlign (default Left) {
        /// Left aligned.
        Left = 0 => "left",
        /// Centered.
        Center = 1 => "center",
        /// Right aligned.
        Right = 2 => "right",
        /// Justified.
        Justify = 3 => "justify",
        /// Aligned to the start edge.
        Start = 4 => "start",
        /// Aligned to the end edge.
        End = 5 => "end",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names_parse() {
        assert_eq!(SpreadMethod::from_name("reflect"), Some(SpreadMethod::Reflect));
        assert_eq!(InterpolationMethod::from_name("linearRGB"), Some(InterpolationMethod::LinearRgb));
        assert_eq!(GradientType::from_name("radial").map(GradientType::to_number), Some(0x12));
        assert_eq!(BlendMode::from_name("hardlight"), Some(BlendMode::HardLight));
    }

    #[test]
    fn test_unknown_names_fall_back() {
        assert_eq!(SpreadMethod::from_name("sideways"), None);
        assert_eq!(SpreadMethod::parse_or_default(Some("sideways")), SpreadMethod::Pad);
        assert_eq!(CapsStyle::parse_or_default(None), CapsStyle::Round);
        assert_eq!(JointStyle::parse_or_default(Some("")), JointStyle::Round);
        assert_eq!(LineScaleMode::parse_or_default(Some("NORMAL")), LineScaleMode::Normal);
        assert_eq!(WindingRule::parse_or_default(Some("bogus")), WindingRule::EvenOdd);
    }

    #[test]
    fn test_wire_codes_round_trip() {
        for mode in [BlendMode::Normal, BlendMode::Erase, BlendMode::HardLight] {
            assert_eq!(BlendMode::from_number(mode.to_number()), Some(mode));
        }
        assert_eq!(PixelSnapping::Auto.to_number(), 2);
        assert_eq!(PixelSnapping::from_number(9), None);
    }
}
