use std::sync::Arc;

use crate::geometry::{Matrix, Subpath};
use crate::gradient::GradientDescriptor;
use crate::style::{Decoration, Decorations, FillRule, LineCap, LineJoin, TextAnchor};
use crate::types::{Color, Point};

#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid {
        color: Color,
        opacity: f32,
    },
    Gradient {
        gradient: GradientDescriptor,
        opacity: f32,
    },
}

impl Paint {
    pub fn opacity(&self) -> f32 {
        match self {
            Paint::Solid { opacity, .. } | Paint::Gradient { opacity, .. } => *opacity,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub paint: Paint,
    pub rule: FillRule,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub paint: Paint,
    pub width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
    pub dash_array: Vec<f32>,
    pub dash_offset: f32,
}

// Geometry is in the element's local space; `transform` maps it to the output.
#[derive(Debug, Clone, PartialEq)]
pub struct PathCommand {
    pub subpaths: Vec<Subpath>,
    pub fill: Option<Fill>,
    pub stroke: Option<Stroke>,
    pub transform: Matrix,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub families: Vec<String>,
    pub size: f32,
    pub weight: u16,
    pub bold: bool,
    pub italic: bool,
}

// One decoration stroke, placed relative to the baseline (positive is below).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecorationLine {
    pub decoration: Decoration,
    pub offset: f32,
    pub thickness: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextCommand {
    pub content: String,
    pub position: Point,
    pub font: FontSpec,
    pub fill: Option<Paint>,
    pub anchor: TextAnchor,
    pub decorations: Decorations,
    pub decoration_lines: Vec<DecorationLine>,
    pub transform: Matrix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn mime(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageCommand {
    pub data: Arc<[u8]>,
    pub format: ImageFormat,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub transform: Matrix,
}

// Emitted in paint order: later commands draw over earlier ones.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Path(PathCommand),
    Text(TextCommand),
    Image(ImageCommand),
}

impl DrawCommand {
    pub fn kind(&self) -> &'static str {
        match self {
            DrawCommand::Path(_) => "path",
            DrawCommand::Text(_) => "text",
            DrawCommand::Image(_) => "image",
        }
    }

    pub fn transform(&self) -> Matrix {
        match self {
            DrawCommand::Path(cmd) => cmd.transform,
            DrawCommand::Text(cmd) => cmd.transform,
            DrawCommand::Image(cmd) => cmd.transform,
        }
    }
}
