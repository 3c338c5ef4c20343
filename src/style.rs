//! Style types and enums for canvas operations.

use crate::color::PremulColor;
use crate::gradient::Gradient;
use crate::pattern::Pattern;

/// Which of the two drawing styles an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleTarget {
    /// The style used by fill operations and fill_text.
    Fill,
    /// The style used by stroke operations and stroke_text.
    Stroke,
}

/// Paint source for fill and stroke operations.
#[derive(Debug, Clone)]
pub(crate) enum Paint {
    /// Solid color.
    Color(PremulColor),
    /// Linear gradient.
    LinearGradient(Gradient),
    /// Radial gradient.
    RadialGradient(Gradient),
    /// Bitmap pattern.
    Pattern(Pattern),
}

impl Default for Paint {
    fn default() -> Self {
        // Default is opaque black
        Paint::Color(PremulColor::from_srgb(0.0, 0.0, 0.0, 1.0))
    }
}

/// Line cap style for stroke operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    /// Flat edge at the endpoint.
    #[default]
    Butt,
    /// Square edge extending past the endpoint by half the line width.
    Square,
    /// Rounded edge extending past the endpoint.
    Circle,
}

/// Line join style for stroke operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    /// Sharp corner, subject to the miter limit.
    #[default]
    Miter,
    /// Beveled corner.
    Bevel,
    /// Rounded corner.
    Rounded,
}

/// Pattern repetition mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Repetition {
    /// Repeat in both directions (default).
    #[default]
    Repeat,
    /// Repeat only horizontally.
    RepeatX,
    /// Repeat only vertically.
    RepeatY,
    /// No repetition (single instance).
    NoRepeat,
}

/// Porter-Duff composite operation (plus lighter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeOperation {
    /// Source where it overlaps the destination, destination elsewhere.
    SourceAtop,
    /// Source only; the destination is discarded.
    SourceCopy,
    /// Source where the destination exists.
    SourceIn,
    /// Source where the destination does not exist.
    SourceOut,
    /// Source over destination (default).
    #[default]
    SourceOver,
    /// Destination where it overlaps the source, source elsewhere.
    DestinationAtop,
    /// Destination where the source exists.
    DestinationIn,
    /// Destination where the source does not exist.
    DestinationOut,
    /// Destination over source.
    DestinationOver,
    /// Source or destination where they do not overlap.
    ExclusiveOr,
    /// Sum of source and destination, clamped.
    Lighter,
}

impl CompositeOperation {
    /// Whether the operator can clear destination pixels that the source
    /// does not cover, forcing the compositor to visit the whole canvas.
    pub(crate) fn clears_outside_source(self) -> bool {
        matches!(
            self,
            CompositeOperation::SourceIn
                | CompositeOperation::SourceOut
                | CompositeOperation::SourceCopy
                | CompositeOperation::DestinationIn
                | CompositeOperation::DestinationAtop
        )
    }
}

/// Horizontal text alignment relative to the anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    /// Text extends rightward from the anchor.
    Leftward,
    /// Text extends leftward from the anchor.
    Rightward,
    /// Text is centered on the anchor.
    Center,
    /// Alias for leftward in this library's LTR model (default).
    #[default]
    Start,
    /// Alias for rightward in this library's LTR model.
    Ending,
}

/// Vertical text baseline relative to the anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextBaseline {
    /// The alphabetic baseline (default).
    #[default]
    Alphabetic,
    /// Top of the em square.
    Top,
    /// Middle of the em square.
    Middle,
    /// Bottom of the em square.
    Bottom,
    /// Hanging baseline.
    Hanging,
    /// Ideographic baseline.
    Ideographic,
}
