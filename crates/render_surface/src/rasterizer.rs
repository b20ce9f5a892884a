//! Rasterization of mounted subtrees
//!
//! The [`Rasterizer`] trait is the "render subtree to pixel buffer"
//! capability. [`BlockRasterizer`] is a small block-flow implementation:
//! elements stack vertically inside their parent's content box, blocks and
//! images fill the content width, and everything is composited over an opaque
//! background at a supersampling scale.

use image::imageops::{self, FilterType};
use image::{Pixel, RgbaImage};
use std::borrow::Cow;

use crate::{
    decode_data_url, Color, DocumentTree, Element, ElementContent, Length, NodeId, RenderError,
    Result, CSS_PX_PER_MM,
};

/// Largest raster side in pixels
pub const MAX_SURFACE_SIDE: u32 = 32_767;

/// Largest raster area in pixels
pub const MAX_SURFACE_AREA: u64 = 268_435_456;

/// Output pixel size for a CSS size at `scale`, within the raster limits
fn surface_size(css_width: f32, css_height: f32, scale: f32) -> Result<(u32, u32)> {
    let width = (f64::from(css_width) * f64::from(scale)).ceil().max(0.0);
    let height = (f64::from(css_height) * f64::from(scale)).ceil().max(0.0);
    if width == 0.0 || height == 0.0 {
        return Err(RenderError::EmptySurface {
            width: width.min(f64::from(u32::MAX)) as u32,
            height: height.min(f64::from(u32::MAX)) as u32,
        });
    }

    let too_large = || RenderError::SurfaceTooLarge {
        width: width as u64,
        height: height as u64,
    };
    let max_side = f64::from(MAX_SURFACE_SIDE);
    if !(width <= max_side && height <= max_side) {
        return Err(too_large());
    }
    let (width, height) = (width as u32, height as u32);
    let area = u64::from(width)
        .checked_mul(u64::from(height))
        .ok_or_else(too_large)?;
    if area > MAX_SURFACE_AREA {
        return Err(too_large());
    }
    Ok((width, height))
}

/// Options for a single rasterization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    /// Output pixels per CSS pixel
    pub scale: f32,
    /// Opaque color painted before any content
    pub background: Color,
    /// Capture width in CSS pixels (defaults to the element's width)
    pub width: Option<u32>,
    /// Capture height in CSS pixels (defaults to the element's height)
    pub height: Option<u32>,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            background: Color::WHITE,
            width: None,
            height: None,
        }
    }
}

/// Renders a mounted subtree into pixels
pub trait Rasterizer {
    /// Full content size of a mounted node in CSS pixels
    fn scroll_size(&self, tree: &DocumentTree, node: NodeId) -> Result<(u32, u32)>;

    /// Rasterize a mounted node
    fn rasterize(
        &self,
        tree: &DocumentTree,
        node: NodeId,
        options: &RasterOptions,
    ) -> Result<RgbaImage>;
}

/// Block-flow rasterizer for element trees
#[derive(Debug, Clone, Copy)]
pub struct BlockRasterizer {
    /// Width available to a root element with `auto` width, in CSS pixels
    viewport_width: f32,
}

impl BlockRasterizer {
    pub fn new(viewport_width: f32) -> Self {
        Self { viewport_width }
    }

    fn element<'t>(&self, tree: &'t DocumentTree, node: NodeId) -> Result<&'t Element> {
        tree.get(node)
            .ok_or_else(|| RenderError::NodeNotMounted(node.to_string()))
    }

    fn layout<'a>(&self, root: &'a Element) -> Result<DisplayList<'a>> {
        let mut list = DisplayList::default();
        let frame = Frame {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        };
        let (width, height) = layout_element(root, self.viewport_width, frame, &mut list.ops)?;
        list.width = width;
        list.height = height;
        Ok(list)
    }
}

impl Default for BlockRasterizer {
    /// A viewport as wide as an A4 page
    fn default() -> Self {
        Self::new(210.0 * CSS_PX_PER_MM)
    }
}

impl Rasterizer for BlockRasterizer {
    fn scroll_size(&self, tree: &DocumentTree, node: NodeId) -> Result<(u32, u32)> {
        let list = self.layout(self.element(tree, node)?)?;
        Ok((list.width.ceil() as u32, list.height.ceil() as u32))
    }

    fn rasterize(
        &self,
        tree: &DocumentTree,
        node: NodeId,
        options: &RasterOptions,
    ) -> Result<RgbaImage> {
        if !(options.scale.is_finite() && options.scale > 0.0) {
            return Err(RenderError::InvalidLayout(format!(
                "raster scale must be positive, got {}",
                options.scale
            )));
        }

        let list = self.layout(self.element(tree, node)?)?;
        let css_width = options.width.map_or(list.width, |w| w as f32);
        let css_height = options.height.map_or(list.height, |h| h as f32);
        let (width, height) = surface_size(css_width, css_height, options.scale)?;

        let mut background = options.background;
        background.a = 255;
        let mut canvas = RgbaImage::from_pixel(width, height, background.to_rgba());
        for op in &list.ops {
            op.paint(&mut canvas, options.scale);
        }

        tracing::debug!(
            "Rasterized {} ops into {}x{} px at scale {}",
            list.ops.len(),
            width,
            height,
            options.scale
        );
        Ok(canvas)
    }
}

/// A rectangle in CSS pixels relative to the rasterized root
#[derive(Debug, Clone, Copy, PartialEq)]
struct PxRect {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

/// Maps element-local coordinates to root coordinates
#[derive(Debug, Clone, Copy)]
struct Frame {
    x: f32,
    y: f32,
    zoom: f32,
}

impl Frame {
    fn rect(&self, x: f32, y: f32, width: f32, height: f32) -> PxRect {
        PxRect {
            x: self.x + x * self.zoom,
            y: self.y + y * self.zoom,
            width: width * self.zoom,
            height: height * self.zoom,
        }
    }

    fn offset(&self, dx: f32, dy: f32) -> Frame {
        Frame {
            x: self.x + dx * self.zoom,
            y: self.y + dy * self.zoom,
            zoom: self.zoom,
        }
    }
}

#[derive(Debug)]
enum PaintOp<'a> {
    Fill { rect: PxRect, color: Color },
    Image { rect: PxRect, pixels: Cow<'a, RgbaImage> },
}

impl PaintOp<'_> {
    fn paint(&self, canvas: &mut RgbaImage, scale: f32) {
        match self {
            PaintOp::Fill { rect, color } => fill_rect(canvas, rect, *color, scale),
            PaintOp::Image { rect, pixels } => draw_image(canvas, rect, pixels, scale),
        }
    }
}

#[derive(Debug, Default)]
struct DisplayList<'a> {
    width: f32,
    height: f32,
    ops: Vec<PaintOp<'a>>,
}

const SHADOW_OFFSET: f32 = 4.0;
const SHADOW_COLOR: Color = Color::rgba(0, 0, 0, 40);

/// Lay out `element` at `frame` and append its paint ops.
///
/// Returns the element's border-box size in its own (untransformed)
/// coordinates. Transforms only affect painting, never the flow.
fn layout_element<'a>(
    element: &'a Element,
    available: f32,
    frame: Frame,
    ops: &mut Vec<PaintOp<'a>>,
) -> Result<(f32, f32)> {
    let style = &element.style;
    let mut width = style.width.resolve(available).unwrap_or(available);
    if let Some(max) = style.max_width.and_then(|m| m.resolve(available)) {
        width = width.min(max);
    }
    let width = width.max(0.0);

    let scale = style.transform_scale();
    let frame = Frame {
        zoom: frame.zoom * scale,
        ..frame
    };

    // Shadow and background need the final height; patched below.
    let shadow_slot = style.box_shadow.as_ref().map(|_| {
        ops.push(PaintOp::Fill {
            rect: frame.rect(0.0, 0.0, 0.0, 0.0),
            color: SHADOW_COLOR,
        });
        ops.len() - 1
    });
    let background_slot = style.background.map(|color| {
        ops.push(PaintOp::Fill {
            rect: frame.rect(0.0, 0.0, 0.0, 0.0),
            color,
        });
        ops.len() - 1
    });

    let padding = style.padding.max(0.0);
    let inner = (width - 2.0 * padding).max(0.0);
    let mut cursor = padding;

    match &element.content {
        ElementContent::Empty => {}
        ElementContent::Block { height, color } => {
            let h = height.resolve(inner).unwrap_or(0.0).max(0.0);
            ops.push(PaintOp::Fill {
                rect: frame.rect(padding, cursor, inner, h),
                color: *color,
            });
            cursor += h;
        }
        ElementContent::Image { data_url } => {
            let pixels = decode_data_url(data_url)?;
            cursor += push_image(ops, frame, padding, cursor, inner, Cow::Owned(pixels));
        }
        ElementContent::Raster(pixels) => {
            cursor += push_image(ops, frame, padding, cursor, inner, Cow::Borrowed(pixels));
        }
    }

    for child in &element.children {
        let margin = child.style.margin.max(0.0);
        cursor += margin;
        let child_frame = frame.offset(padding + margin, cursor);
        let child_available = (inner - 2.0 * margin).max(0.0);
        let (_, child_height) = layout_element(child, child_available, child_frame, ops)?;
        cursor += child_height + margin;
    }

    let mut height = cursor + padding;
    if let Some(min) = style.min_height.and_then(|m: Length| m.resolve(inner)) {
        height = height.max(min);
    }

    if let Some(slot) = shadow_slot {
        ops[slot] = PaintOp::Fill {
            rect: frame.rect(SHADOW_OFFSET, SHADOW_OFFSET, width, height),
            color: SHADOW_COLOR,
        };
    }
    if let Some(slot) = background_slot {
        if let PaintOp::Fill { rect, .. } = &mut ops[slot] {
            *rect = frame.rect(0.0, 0.0, width, height);
        }
    }

    Ok((width, height))
}

/// Queue an image scaled to the content width; returns the height it takes
fn push_image<'a>(
    ops: &mut Vec<PaintOp<'a>>,
    frame: Frame,
    x: f32,
    y: f32,
    width: f32,
    pixels: Cow<'a, RgbaImage>,
) -> f32 {
    if pixels.width() == 0 {
        return 0.0;
    }
    let height = pixels.height() as f32 * width / pixels.width() as f32;
    ops.push(PaintOp::Image {
        rect: frame.rect(x, y, width, height),
        pixels,
    });
    height
}

/// Pixel span of a scaled rect, clamped to the canvas
fn pixel_span(rect: &PxRect, scale: f32, canvas: &RgbaImage) -> (u32, u32, u32, u32) {
    let clamp = |v: f32, max: u32| (v.round().max(0.0) as u32).min(max);
    let x0 = clamp(rect.x * scale, canvas.width());
    let y0 = clamp(rect.y * scale, canvas.height());
    let x1 = clamp((rect.x + rect.width) * scale, canvas.width());
    let y1 = clamp((rect.y + rect.height) * scale, canvas.height());
    (x0, y0, x1, y1)
}

fn fill_rect(canvas: &mut RgbaImage, rect: &PxRect, color: Color, scale: f32) {
    if color.a == 0 {
        return;
    }
    let (x0, y0, x1, y1) = pixel_span(rect, scale, canvas);
    let pixel = color.to_rgba();
    for y in y0..y1 {
        for x in x0..x1 {
            canvas.get_pixel_mut(x, y).blend(&pixel);
        }
    }
}

fn draw_image(canvas: &mut RgbaImage, rect: &PxRect, pixels: &RgbaImage, scale: f32) {
    let target_width = (rect.width * scale).round() as u32;
    let target_height = (rect.height * scale).round() as u32;
    if target_width == 0 || target_height == 0 {
        return;
    }

    let x = (rect.x * scale).round() as i64;
    let y = (rect.y * scale).round() as i64;
    if pixels.dimensions() == (target_width, target_height) {
        imageops::overlay(canvas, pixels, x, y);
    } else {
        let resized = imageops::resize(pixels, target_width, target_height, FilterType::Triangle);
        imageops::overlay(canvas, &resized, x, y);
    }
}
