//! PDF ticket rendering onto a template
//!
//! Page 1 of the template receives a white patch covering the template's
//! placeholder QR, the invitee's QR image on top of it, and the code label
//! `#<code>` in white Helvetica. Existing page content is wrapped in
//! `q`/`Q` so it cannot leak graphics state into the overlay.

use std::fs;
use std::path::{Path, PathBuf};

use image::GrayImage;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::error::{CheckinError, CheckinResult};
use crate::settings::{Settings, TicketLayout};

use super::{qr, TicketRenderer};

const QR_XOBJECT: &str = "TgQr";
const LABEL_FONT: &str = "TgHelv";

/// Used when neither the page nor its parent declares a media box (A4)
const FALLBACK_PAGE_WIDTH: f32 = 595.0;

/// Renders tickets by overlaying a template PDF
#[derive(Debug, Clone)]
pub struct PdfTemplateRenderer {
    template: PathBuf,
    output_dir: PathBuf,
    layout: TicketLayout,
}

impl PdfTemplateRenderer {
    /// Create a renderer writing `<code>.pdf` files into `output_dir`
    #[must_use]
    pub fn new(template: PathBuf, output_dir: PathBuf, layout: TicketLayout) -> Self {
        Self {
            template,
            output_dir,
            layout,
        }
    }

    /// Create a renderer from configured paths and layout
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.template(), settings.output_dir(), settings.ticket)
    }

    /// Template this renderer reads
    #[must_use]
    pub fn template(&self) -> &Path {
        &self.template
    }

    fn load_template(&self) -> CheckinResult<Document> {
        if !self.template.is_file() {
            return Err(CheckinError::RenderFailure(format!(
                "Ticket template not found: {}",
                self.template.display()
            )));
        }
        Document::load(&self.template).map_err(|e| {
            CheckinError::RenderFailure(format!(
                "Cannot read ticket template {}: {e}",
                self.template.display()
            ))
        })
    }
}

impl TicketRenderer for PdfTemplateRenderer {
    fn render(&self, code: &str, _name: &str) -> CheckinResult<PathBuf> {
        let mut doc = self.load_template()?;
        let page_id = *doc.get_pages().values().next().ok_or_else(|| {
            CheckinError::RenderFailure(format!(
                "Ticket template has no pages: {}",
                self.template.display()
            ))
        })?;
        let qr_image = qr::render(code)?;

        overlay_ticket(&mut doc, page_id, &qr_image, code, &self.layout).map_err(|e| {
            CheckinError::RenderFailure(format!("Cannot draw ticket for '{code}': {e}"))
        })?;

        fs::create_dir_all(&self.output_dir).map_err(|e| CheckinError::io(&self.output_dir, &e))?;
        let output = self.output_dir.join(format!("{code}.pdf"));
        doc.save(&output).map_err(|e| {
            CheckinError::RenderFailure(format!("Cannot save ticket {}: {e}", output.display()))
        })?;

        tracing::info!(code, path = %output.display(), "Rendered ticket");
        Ok(output)
    }
}

/// Draw the QR image and code label onto the first page
fn overlay_ticket(
    doc: &mut Document,
    page_id: ObjectId,
    qr_image: &GrayImage,
    code: &str,
    layout: &TicketLayout,
) -> lopdf::Result<()> {
    let page_width = page_width(doc, page_id);

    let image_id = doc.add_object(image_xobject(qr_image));
    let font_id = doc.add_object(helvetica());
    add_page_resource(doc, page_id, b"XObject", QR_XOBJECT, image_id)?;
    add_page_resource(doc, page_id, b"Font", LABEL_FONT, font_id)?;

    let label = format!("#{code}");
    let overlay = Content {
        operations: overlay_operations(layout, page_width, &label),
    };
    let save_state = Content {
        operations: vec![Operation::new("q", vec![])],
    };

    let head_id = doc.add_object(Stream::new(Dictionary::new(), save_state.encode()?));
    let tail_id = doc.add_object(Stream::new(Dictionary::new(), overlay.encode()?));
    wrap_page_contents(doc, page_id, head_id, tail_id)
}

fn overlay_operations(layout: &TicketLayout, page_width: f32, label: &str) -> Vec<Operation> {
    let size = layout.qr_size;
    let x = layout.qr_margin_x;
    let y = layout.qr_margin_y;

    vec![
        // Close the template's state
        Operation::new("Q", vec![]),
        Operation::new("q", vec![]),
        // White patch over the placeholder
        Operation::new("rg", vec![real(1.0), real(1.0), real(1.0)]),
        Operation::new("re", vec![real(x), real(y), real(size), real(size)]),
        Operation::new("f", vec![]),
        // QR image scaled into the same square
        Operation::new(
            "cm",
            vec![real(size), real(0.0), real(0.0), real(size), real(x), real(y)],
        ),
        Operation::new("Do", vec![Object::Name(QR_XOBJECT.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
        // Code label
        Operation::new("BT", vec![]),
        Operation::new("rg", vec![real(1.0), real(1.0), real(1.0)]),
        Operation::new(
            "Tf",
            vec![
                Object::Name(LABEL_FONT.as_bytes().to_vec()),
                real(layout.font_size),
            ],
        ),
        Operation::new(
            "Td",
            vec![
                real(page_width - layout.text_margin_x),
                real(layout.text_margin_y),
            ],
        ),
        Operation::new(
            "Tj",
            vec![Object::String(win_ansi(label), StringFormat::Literal)],
        ),
        Operation::new("ET", vec![]),
    ]
}

/// Encode text for the label font's `WinAnsiEncoding`
///
/// Latin-1 maps byte for byte. The few WinAnsi glyphs outside Latin-1 get
/// their 0x80..0x9F slot, anything else becomes `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' | '\u{a0}'..='\u{ff}' => {
                u8::try_from(u32::from(c)).unwrap_or(b'?')
            }
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8a,
            '‹' => 0x8b,
            'Œ' => 0x8c,
            'Ž' => 0x8e,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9a,
            '›' => 0x9b,
            'œ' => 0x9c,
            'ž' => 0x9e,
            'Ÿ' => 0x9f,
            _ => b'?',
        })
        .collect()
}

fn real(value: f32) -> Object {
    Object::Real(value)
}

fn name(value: &str) -> Object {
    Object::Name(value.as_bytes().to_vec())
}

fn image_xobject(img: &GrayImage) -> Stream {
    let mut dict = Dictionary::new();
    dict.set("Type", name("XObject"));
    dict.set("Subtype", name("Image"));
    dict.set("Width", Object::Integer(i64::from(img.width())));
    dict.set("Height", Object::Integer(i64::from(img.height())));
    dict.set("ColorSpace", name("DeviceGray"));
    dict.set("BitsPerComponent", Object::Integer(8));
    Stream::new(dict, img.as_raw().clone())
}

fn helvetica() -> Dictionary {
    let mut dict = Dictionary::new();
    dict.set("Type", name("Font"));
    dict.set("Subtype", name("Type1"));
    dict.set("BaseFont", name("Helvetica"));
    dict.set("Encoding", name("WinAnsiEncoding"));
    dict
}

/// Width of the page's media box, looking at the parent node if the page
/// inherits it
fn page_width(doc: &Document, page_id: ObjectId) -> f32 {
    let media_box = |id: ObjectId| -> Option<f32> {
        let dict = doc.get_dictionary(id).ok()?;
        let rect = dict.get(b"MediaBox").ok()?;
        let rect = match rect {
            Object::Reference(r) => doc.get_object(*r).ok()?,
            other => other,
        };
        let values = rect.as_array().ok()?;
        let left = values.first()?.as_float().ok()?;
        let right = values.get(2)?.as_float().ok()?;
        Some(right - left)
    };

    media_box(page_id)
        .or_else(|| {
            let parent = doc
                .get_dictionary(page_id)
                .ok()?
                .get(b"Parent")
                .ok()?
                .as_reference()
                .ok()?;
            media_box(parent)
        })
        .unwrap_or(FALLBACK_PAGE_WIDTH)
}

/// Where a page's resource dictionary lives
enum ResourcesAt {
    Inline,
    Object(ObjectId),
}

/// Make sure the page has its own resource dictionary and say where it is
///
/// Inherited resources are copied onto the page so adding entries does not
/// hide the parent's.
fn page_resources(doc: &mut Document, page_id: ObjectId) -> lopdf::Result<ResourcesAt> {
    let page = doc.get_dictionary(page_id)?;
    match page.get(b"Resources") {
        Ok(Object::Reference(id)) => return Ok(ResourcesAt::Object(*id)),
        Ok(Object::Dictionary(_)) => return Ok(ResourcesAt::Inline),
        _ => {}
    }

    let inherited = page
        .get(b"Parent")
        .and_then(Object::as_reference)
        .ok()
        .and_then(|parent| doc.get_dictionary(parent).ok())
        .and_then(|parent| parent.get(b"Resources").ok())
        .and_then(|resources| match resources {
            Object::Reference(id) => doc.get_dictionary(*id).ok().cloned(),
            Object::Dictionary(dict) => Some(dict.clone()),
            _ => None,
        })
        .unwrap_or_else(Dictionary::new);

    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Resources", Object::Dictionary(inherited));
    Ok(ResourcesAt::Inline)
}

fn resources_mut<'a>(
    doc: &'a mut Document,
    page_id: ObjectId,
    location: &ResourcesAt,
) -> lopdf::Result<&'a mut Dictionary> {
    match location {
        ResourcesAt::Inline => doc
            .get_object_mut(page_id)?
            .as_dict_mut()?
            .get_mut(b"Resources")?
            .as_dict_mut(),
        ResourcesAt::Object(id) => doc.get_object_mut(*id)?.as_dict_mut(),
    }
}

fn add_page_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &[u8],
    key: &str,
    target: ObjectId,
) -> lopdf::Result<()> {
    let location = page_resources(doc, page_id)?;

    let category_ref = {
        let resources = resources_mut(doc, page_id, &location)?;
        match resources.get(category) {
            Ok(Object::Reference(id)) => Some(*id),
            Ok(Object::Dictionary(_)) => None,
            _ => {
                resources.set(category.to_vec(), Object::Dictionary(Dictionary::new()));
                None
            }
        }
    };

    let entries = match category_ref {
        Some(id) => doc.get_object_mut(id)?.as_dict_mut()?,
        None => resources_mut(doc, page_id, &location)?
            .get_mut(category)?
            .as_dict_mut()?,
    };
    entries.set(key, Object::Reference(target));
    Ok(())
}

/// Put `head` before and `tail` after the page's existing content streams
fn wrap_page_contents(
    doc: &mut Document,
    page_id: ObjectId,
    head: ObjectId,
    tail: ObjectId,
) -> lopdf::Result<()> {
    let existing: Vec<Object> = match doc.get_dictionary(page_id)?.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id)? {
            Object::Array(items) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    };

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(head));
    contents.extend(existing);
    contents.push(Object::Reference(tail));

    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Contents", Object::Array(contents));
    Ok(())
}
