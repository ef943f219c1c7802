use anyhow::anyhow;
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;
use tracing::{debug, info};

use crate::error::Result;
use crate::normalize::NormalizedImage;

/// Append-only PDF with one page per image.
///
/// The page tree object id is reserved up front; the tree itself, the
/// catalog and the trailer are only written by [`MangaDocument::write_to`].
pub struct MangaDocument {
    doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    margin: u32,
}

impl MangaDocument {
    pub fn new(margin: u32) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            page_ids: Vec::new(),
            margin,
        }
    }

    /// Adds a page of `image size + 2 * margin`, image centered inside the margin.
    /// The JPEG bytes move into the document without a copy.
    pub fn add_image_page(&mut self, image: NormalizedImage) {
        let page_width = image.width + 2 * self.margin;
        let page_height = image.height + 2 * self.margin;

        let mut xobject = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width as i64,
                "Height" => image.height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            image.jpeg,
        );
        // already DCT encoded
        xobject.allows_compression = false;
        let image_id = self.doc.add_object(xobject);

        let content = page_content(image.width, image.height, self.margin);
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, content));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                (page_width as i64).into(),
                (page_height as i64).into(),
            ],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    "Im0" => image_id,
                },
            },
        });
        self.page_ids.push(page_id);

        debug!(
            "Added page {} ({}x{})",
            self.page_ids.len(),
            page_width,
            page_height
        );
    }

    /// Writes the page tree and serializes the document into `writer`.
    pub fn write_to<W: Write>(mut self, writer: &mut W) -> Result<()> {
        let count = self.page_ids.len();
        let kids: Vec<Object> = self.page_ids.iter().copied().map(Object::Reference).collect();

        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count as i64,
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        info!("Finalizing PDF with {} total pages", count);

        self.doc
            .save_to(writer)
            .map_err(|e| anyhow!("Failed to serialize PDF: {}", e))?;
        Ok(())
    }
}

/// Content stream drawing `Im0` centered in the page, `margin` in from each edge.
fn page_content(width: u32, height: u32, margin: u32) -> Vec<u8> {
    let (x, y, w, h) = center_in_box(width, height, width, height, margin);
    format!("q\n{} 0 0 {} {} {} cm\n/Im0 Do\nQ\n", w, h, x, y).into_bytes()
}

/// Fits `width` x `height` into the box at (`inset`, `inset`) keeping the
/// aspect ratio, centered on both axes. Returns `(x, y, w, h)` in PDF units.
fn center_in_box(width: u32, height: u32, box_width: u32, box_height: u32, inset: u32) -> (f32, f32, f32, f32) {
    let scale = (box_width as f32 / width.max(1) as f32).min(box_height as f32 / height.max(1) as f32);
    let w = width as f32 * scale;
    let h = height as f32 * scale;
    let x = inset as f32 + (box_width as f32 - w) / 2.0;
    let y = inset as f32 + (box_height as f32 - h) / 2.0;
    (x, y, w, h)
}
