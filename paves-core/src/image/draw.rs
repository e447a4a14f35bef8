//! Boxes and highlights on page images
//!
//! [`draw_boxes`] outlines objects with optional label tags, [`mark`]
//! blends translucent highlights over the page. Both take anything
//! [`Boxable`] and render the page of the first object unless an image
//! is supplied.

use super::color::{Color, ColorMaker, Colors};
use super::font5x7;
use super::show;
use crate::annotation::Annotation;
use crate::content::{
    ContentObject, GlyphObject, ImageObject, PathObject, TextObject, XObjectObject,
};
use crate::document::Document;
use crate::error::{PavesError, Result};
use crate::geometry::Rect;
use crate::miner::{LTItem, LTTextBox, LTTextLine};
use crate::structure::Element;
use crate::tables::TableObject;
use crate::text::WordObject;
use image::{GenericImage, GrayImage, Luma, Rgb, RgbImage};

/// Something with a box that can be drawn on a page
pub trait Boxable {
    /// Box in the document's coordinate space, `None` if it has none
    fn bbox(&self) -> Option<Rect>;

    /// Default label, also used to pick a colour
    fn label(&self) -> String;

    /// Page the object belongs to, if it knows
    fn page_index(&self) -> Option<usize> {
        None
    }
}

impl<T: Boxable + ?Sized> Boxable for &T {
    fn bbox(&self) -> Option<Rect> {
        (**self).bbox()
    }

    fn label(&self) -> String {
        (**self).label()
    }

    fn page_index(&self) -> Option<usize> {
        (**self).page_index()
    }
}

impl Boxable for Rect {
    fn bbox(&self) -> Option<Rect> {
        Some(*self)
    }

    fn label(&self) -> String {
        self.to_string()
    }
}

/// Boxes of objects without content are meaningless
fn content_box(bbox: Rect) -> Option<Rect> {
    (!bbox.is_none()).then_some(bbox)
}

impl Boxable for ContentObject {
    fn bbox(&self) -> Option<Rect> {
        content_box(ContentObject::bbox(self))
    }

    fn label(&self) -> String {
        self.object_type().to_string()
    }

    fn page_index(&self) -> Option<usize> {
        Some(ContentObject::page_index(self))
    }
}

impl Boxable for TextObject {
    fn bbox(&self) -> Option<Rect> {
        content_box(TextObject::bbox(self))
    }

    fn label(&self) -> String {
        "text".to_string()
    }

    fn page_index(&self) -> Option<usize> {
        Some(self.state.page_index)
    }
}

impl Boxable for PathObject {
    fn bbox(&self) -> Option<Rect> {
        content_box(PathObject::bbox(self))
    }

    fn label(&self) -> String {
        "path".to_string()
    }

    fn page_index(&self) -> Option<usize> {
        Some(self.state.page_index)
    }
}

impl Boxable for ImageObject {
    fn bbox(&self) -> Option<Rect> {
        Some(ImageObject::bbox(self))
    }

    fn label(&self) -> String {
        "image".to_string()
    }

    fn page_index(&self) -> Option<usize> {
        Some(self.state.page_index)
    }
}

impl Boxable for XObjectObject {
    fn bbox(&self) -> Option<Rect> {
        content_box(XObjectObject::bbox(self))
    }

    fn label(&self) -> String {
        "xobject".to_string()
    }

    fn page_index(&self) -> Option<usize> {
        Some(self.state.page_index)
    }
}

impl Boxable for GlyphObject {
    fn bbox(&self) -> Option<Rect> {
        Some(self.bbox)
    }

    fn label(&self) -> String {
        "glyph".to_string()
    }

    fn page_index(&self) -> Option<usize> {
        Some(self.page_index)
    }
}

impl Boxable for WordObject {
    fn bbox(&self) -> Option<Rect> {
        content_box(WordObject::bbox(self))
    }

    fn label(&self) -> String {
        "word".to_string()
    }

    fn page_index(&self) -> Option<usize> {
        Some(self.page_index)
    }
}

impl Boxable for Annotation {
    fn bbox(&self) -> Option<Rect> {
        Some(Annotation::bbox(self))
    }

    fn label(&self) -> String {
        self.subtype.clone()
    }

    fn page_index(&self) -> Option<usize> {
        Some(self.page_index)
    }
}

impl Boxable for Element {
    fn bbox(&self) -> Option<Rect> {
        self.bbox
    }

    fn label(&self) -> String {
        self.element_type.clone()
    }

    fn page_index(&self) -> Option<usize> {
        self.page_index
    }
}

impl Boxable for TableObject {
    fn bbox(&self) -> Option<Rect> {
        Some(self.bbox)
    }

    fn label(&self) -> String {
        "table".to_string()
    }

    fn page_index(&self) -> Option<usize> {
        Some(self.page_index)
    }
}

impl Boxable for LTItem {
    fn bbox(&self) -> Option<Rect> {
        LTItem::bbox(self)
    }

    fn label(&self) -> String {
        self.class_name().to_string()
    }
}

impl Boxable for LTTextBox {
    fn bbox(&self) -> Option<Rect> {
        Some(self.bbox)
    }

    fn label(&self) -> String {
        self.class_name().to_string()
    }
}

impl Boxable for LTTextLine {
    fn bbox(&self) -> Option<Rect> {
        Some(self.bbox)
    }

    fn label(&self) -> String {
        self.class_name().to_string()
    }
}

/// Options for [`draw_boxes`]
#[derive(Debug, Clone)]
pub struct BoxOptions {
    pub color: Colors,
    pub label: bool,
    pub label_color: Color,
    /// Label height in points
    pub label_size: f64,
    /// Padding around labels in points
    pub label_margin: f64,
    pub label_fill: bool,
    pub dpi: u32,
    /// Draw on this image instead of rendering a page
    pub image: Option<RgbImage>,
    /// Render this page instead of the first object's
    pub page: Option<usize>,
}

impl Default for BoxOptions {
    fn default() -> Self {
        Self {
            color: Colors::default(),
            label: true,
            label_color: Color::from("white"),
            label_size: 9.0,
            label_margin: 1.0,
            label_fill: true,
            dpi: 72,
            image: None,
            page: None,
        }
    }
}

/// Options for [`mark`]
#[derive(Debug, Clone)]
pub struct MarkOptions {
    pub color: Colors,
    /// Share of the page that shows through a highlight
    pub transparency: f64,
    pub label: bool,
    pub label_color: Color,
    pub label_size: f64,
    pub label_margin: f64,
    pub outline: bool,
    pub dpi: u32,
    pub image: Option<RgbImage>,
    pub page: Option<usize>,
}

impl Default for MarkOptions {
    fn default() -> Self {
        Self {
            color: Colors::default(),
            transparency: 0.75,
            label: false,
            label_color: Color::from("white"),
            label_size: 9.0,
            label_margin: 1.0,
            outline: false,
            dpi: 72,
            image: None,
            page: None,
        }
    }
}

/// Pixel rectangle, inclusive of both corners
#[derive(Debug, Clone, Copy, PartialEq)]
struct PixelBox {
    left: i64,
    top: i64,
    right: i64,
    bottom: i64,
}

impl PixelBox {
    fn from_rect(rect: &Rect, scale: f64) -> Self {
        Self {
            left: (rect.x0 * scale).round() as i64,
            top: (rect.y0 * scale).round() as i64,
            right: (rect.x1 * scale).round() as i64,
            bottom: (rect.y1 * scale).round() as i64,
        }
    }

    /// Tag sitting on top of the box for a label of the given size
    fn label_tag(&self, text_size: (u32, u32), margin: i64) -> Self {
        Self {
            left: self.left,
            top: self.top - i64::from(text_size.1) - margin * 2,
            right: self.left + i64::from(text_size.0) + margin * 2,
            bottom: self.top,
        }
    }
}

fn put<I: GenericImage>(image: &mut I, x: i64, y: i64, pixel: I::Pixel) {
    let (width, height) = image.dimensions();
    if x >= 0 && y >= 0 && x < i64::from(width) && y < i64::from(height) {
        image.put_pixel(x as u32, y as u32, pixel);
    }
}

fn outline<I: GenericImage>(image: &mut I, b: PixelBox, pixel: I::Pixel) {
    for x in b.left..=b.right {
        put(image, x, b.top, pixel);
        put(image, x, b.bottom, pixel);
    }
    for y in b.top..=b.bottom {
        put(image, b.left, y, pixel);
        put(image, b.right, y, pixel);
    }
}

fn fill<I: GenericImage>(image: &mut I, b: PixelBox, pixel: I::Pixel) {
    let (width, height) = image.dimensions();
    let x0 = b.left.max(0);
    let x1 = b.right.min(i64::from(width) - 1);
    let y0 = b.top.max(0);
    let y1 = b.bottom.min(i64::from(height) - 1);
    for y in y0..=y1 {
        for x in x0..=x1 {
            image.put_pixel(x as u32, y as u32, pixel);
        }
    }
}

/// Where objects get drawn, rendered lazily from the first object
struct Canvas<'d> {
    doc: &'d Document,
    dpi: u32,
    page: Option<usize>,
    image: Option<RgbImage>,
    image_page: Option<usize>,
}

impl<'d> Canvas<'d> {
    fn new(doc: &'d Document, dpi: u32, page: Option<usize>, image: Option<RgbImage>) -> Self {
        Self {
            doc,
            dpi,
            page,
            image,
            image_page: None,
        }
    }

    /// Whether `obj` is on a different page than the one being drawn
    fn leaves_page(&self, obj: &impl Boxable) -> bool {
        match (self.image_page, obj.page_index()) {
            (Some(current), Some(page)) => current != page,
            _ => false,
        }
    }

    fn image_for(&mut self, obj: &impl Boxable) -> Result<&mut RgbImage> {
        if self.image.is_none() {
            let index = self.page.or_else(|| obj.page_index()).ok_or_else(|| {
                PavesError::InvalidArgument(
                    "Must explicitly specify page or image to show rectangles".to_string(),
                )
            })?;
            self.image = Some(show(self.doc.page(index)?, self.dpi)?);
            self.image_page = Some(index);
        }
        self.image.as_mut().ok_or_else(|| {
            PavesError::InvalidArgument("No image to draw on".to_string())
        })
    }
}

/// Outline `objs` on a page image.
///
/// Stops at the first object from another page than the first one.
/// Returns `None` when there is nothing to draw and no image was given.
pub fn draw_boxes<I>(doc: &Document, objs: I, opts: &BoxOptions) -> Result<Option<RgbImage>>
where
    I: IntoIterator,
    I::Item: Boxable,
{
    let scale = f64::from(opts.dpi) / 72.0;
    let text_scale = font5x7::scale_for(opts.label_size * scale);
    let margin = (opts.label_margin * scale).round() as i64;
    let label_color = opts.label_color.to_rgb()?;
    let mut maker = ColorMaker::new(opts.color.clone())?;
    let mut canvas = Canvas::new(doc, opts.dpi, opts.page, opts.image.clone());

    for obj in objs {
        if canvas.leaves_page(&obj) {
            break;
        }
        let image = canvas.image_for(&obj)?;
        let Some(bbox) = obj.bbox() else {
            continue;
        };
        let pixels = PixelBox::from_rect(&bbox, scale);
        let text = obj.label();
        let color = maker.color(&text);
        outline(image, pixels, color);
        if opts.label {
            let size = font5x7::text_size(&text, text_scale);
            let tag = pixels.label_tag(size, margin);
            if opts.label_fill {
                fill(image, tag, color);
            }
            outline(image, tag, color);
            let text_color = if opts.label_fill { label_color } else { color };
            font5x7::draw_text(
                image,
                tag.left + margin,
                tag.top + margin,
                &text,
                text_scale,
                text_color,
            );
        }
    }
    Ok(canvas.image)
}

/// Highlight `objs` on a page image.
///
/// Highlights are painted on an overlay which is blended with the
/// page, so overlapping objects do not darken each other.
pub fn mark<I>(doc: &Document, objs: I, opts: &MarkOptions) -> Result<Option<RgbImage>>
where
    I: IntoIterator,
    I::Item: Boxable,
{
    let scale = f64::from(opts.dpi) / 72.0;
    let text_scale = font5x7::scale_for(opts.label_size * scale);
    let margin = (opts.label_margin * scale).round() as i64;
    let alpha = (opts.transparency.clamp(0.0, 1.0) * 255.0) as u8;
    let label_color = opts.label_color.to_rgb()?;
    let black = Rgb([0, 0, 0]);
    let mut maker = ColorMaker::new(opts.color.clone())?;
    let mut canvas = Canvas::new(doc, opts.dpi, opts.page, opts.image.clone());
    let mut layers: Option<(RgbImage, GrayImage)> = None;

    for obj in objs {
        if canvas.leaves_page(&obj) {
            break;
        }
        let (width, height) = canvas.image_for(&obj)?.dimensions();
        let (overlay, mask) = layers.get_or_insert_with(|| {
            (
                RgbImage::new(width, height),
                GrayImage::from_pixel(width, height, Luma([255])),
            )
        });
        let Some(bbox) = obj.bbox() else {
            continue;
        };
        let pixels = PixelBox::from_rect(&bbox, scale);
        let text = obj.label();
        let color = maker.color(&text);
        fill(overlay, pixels, color);
        fill(mask, pixels, Luma([alpha]));
        if opts.outline {
            outline(overlay, pixels, black);
            outline(mask, pixels, Luma([0]));
        }
        if opts.label {
            let size = font5x7::text_size(&text, text_scale);
            let tag = pixels.label_tag(size, margin);
            fill(overlay, tag, color);
            fill(mask, tag, Luma([alpha]));
            let (x, y) = (tag.left + margin, tag.top + margin);
            if opts.outline {
                outline(overlay, tag, black);
                outline(mask, tag, Luma([0]));
                font5x7::draw_text(overlay, x, y, &text, text_scale, black);
                font5x7::draw_text(mask, x, y, &text, text_scale, Luma([0]));
            } else {
                font5x7::draw_text(overlay, x, y, &text, text_scale, label_color);
            }
        }
    }
    let Some(mut image) = canvas.image else {
        return Ok(None);
    };
    if let Some((overlay, mask)) = layers {
        composite(&mut image, &overlay, &mask);
    }
    Ok(Some(image))
}

/// Keep `image` where the mask is white and `overlay` where it is black.
fn composite(image: &mut RgbImage, overlay: &RgbImage, mask: &GrayImage) {
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let keep = u32::from(mask.get_pixel(x, y).0[0]);
        let over = overlay.get_pixel(x, y);
        for (channel, &top) in pixel.0.iter_mut().zip(over.0.iter()) {
            let blended = (u32::from(*channel) * keep + u32::from(top) * (255 - keep) + 127) / 255;
            *channel = blended as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn empty_doc() -> Document {
        let mut doc = lopdf::Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => lopdf::Object::Reference(pages_id),
        });
        doc.objects.insert(
            pages_id,
            lopdf::Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![lopdf::Object::Reference(page_id)],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => lopdf::Object::Reference(pages_id),
        });
        doc.trailer.set("Root", lopdf::Object::Reference(catalog_id));
        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        Document::from_bytes(buffer).unwrap()
    }

    fn white(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([255, 255, 255]))
    }

    #[test]
    fn test_boxes_on_given_image() {
        let doc = empty_doc();
        let opts = BoxOptions {
            color: Colors::Single("red".into()),
            label: false,
            image: Some(white(40, 40)),
            ..Default::default()
        };
        let rects = [Rect::new(10.0, 10.0, 20.0, 30.0)];
        let image = draw_boxes(&doc, rects.iter(), &opts).unwrap().unwrap();
        assert_eq!(image.get_pixel(10, 10), &Rgb([255, 0, 0]));
        assert_eq!(image.get_pixel(20, 30), &Rgb([255, 0, 0]));
        assert_eq!(image.get_pixel(15, 20), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_boxes_scale_with_dpi() {
        let doc = empty_doc();
        let opts = BoxOptions {
            color: Colors::Single("blue".into()),
            label: false,
            dpi: 144,
            image: Some(white(80, 80)),
            ..Default::default()
        };
        let image = draw_boxes(&doc, [Rect::new(5.0, 5.0, 10.0, 10.0)], &opts)
            .unwrap()
            .unwrap();
        assert_eq!(image.get_pixel(10, 10), &Rgb([0, 0, 255]));
        assert_eq!(image.get_pixel(20, 15), &Rgb([0, 0, 255]));
        assert_eq!(image.get_pixel(5, 5), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_filled_label_tag_above_box() {
        let doc = empty_doc();
        let opts = BoxOptions {
            color: Colors::Single("green".into()),
            image: Some(white(60, 60)),
            ..Default::default()
        };
        let image = draw_boxes(&doc, [Rect::new(10.0, 30.0, 50.0, 50.0)], &opts)
            .unwrap()
            .unwrap();
        // the tag spans 7 pixels of text plus a margin on each side
        assert_eq!(image.get_pixel(10, 21), &Rgb([0, 128, 0]));
        assert_eq!(image.get_pixel(10, 20), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_nothing_to_draw() {
        let doc = empty_doc();
        let none: [Rect; 0] = [];
        assert!(draw_boxes(&doc, none, &BoxOptions::default()).unwrap().is_none());
        assert!(mark(&doc, none, &MarkOptions::default()).unwrap().is_none());
    }

    #[test]
    fn test_rect_without_page_needs_a_page() {
        let doc = empty_doc();
        let err = draw_boxes(&doc, [Rect::new(0.0, 0.0, 1.0, 1.0)], &BoxOptions::default());
        assert!(matches!(err, Err(PavesError::InvalidArgument(_))));
    }

    #[test]
    fn test_stops_at_other_page() {
        let doc = empty_doc();
        let first = Element {
            element_type: "P".to_string(),
            role: "P".to_string(),
            page_index: Some(0),
            bbox: Some(Rect::new(0.0, 0.0, 1.0, 1.0)),
            title: None,
            alt: None,
            actual_text: None,
            kids: Vec::new(),
        };
        let second = Element {
            page_index: Some(1),
            ..first.clone()
        };
        // as if page 0 had been rendered for the first object
        let mut canvas = Canvas::new(&doc, 72, None, Some(white(10, 10)));
        canvas.image_page = Some(0);
        assert!(!canvas.leaves_page(&first));
        assert!(canvas.leaves_page(&second));
    }

    #[test]
    fn test_boxless_objects_are_skipped() {
        let doc = empty_doc();
        let element = Element {
            element_type: "Sect".to_string(),
            role: "Sect".to_string(),
            page_index: Some(0),
            bbox: None,
            title: None,
            alt: None,
            actual_text: None,
            kids: Vec::new(),
        };
        let opts = BoxOptions {
            image: Some(white(10, 10)),
            ..Default::default()
        };
        let image = draw_boxes(&doc, [&element], &opts).unwrap().unwrap();
        assert!(image.pixels().all(|p| *p == Rgb([255, 255, 255])));
    }

    #[test]
    fn test_mark_blends_highlight() {
        let doc = empty_doc();
        let opts = MarkOptions {
            color: Colors::Single("black".into()),
            transparency: 0.5,
            image: Some(white(20, 20)),
            ..Default::default()
        };
        let image = mark(&doc, [Rect::new(0.0, 0.0, 9.0, 9.0)], &opts)
            .unwrap()
            .unwrap();
        let inside = image.get_pixel(5, 5).0[0];
        assert!((126..=129).contains(&inside), "got {}", inside);
        assert_eq!(image.get_pixel(15, 15), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_mark_outline_is_opaque() {
        let doc = empty_doc();
        let opts = MarkOptions {
            color: Colors::Single("red".into()),
            outline: true,
            image: Some(white(20, 20)),
            ..Default::default()
        };
        let image = mark(&doc, [Rect::new(2.0, 2.0, 12.0, 12.0)], &opts)
            .unwrap()
            .unwrap();
        assert_eq!(image.get_pixel(2, 2), &Rgb([0, 0, 0]));
        let inside = image.get_pixel(7, 7);
        assert_eq!(inside.0[0], 255);
        assert!(inside.0[1] < 255);
    }
}
