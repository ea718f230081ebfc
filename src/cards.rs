//! Mic-card rendering — records → paginated PDF, one card per page.
//!
//! The document is built directly with `lopdf`: base-14 Helvetica fonts,
//! one image XObject per page, and hand-written content streams. Each A4
//! page carries the channel label (top right), the role name, the
//! performer name, the comments line, and the portrait centered in a 75 mm
//! bounding box with its aspect ratio preserved.
//!
//! The renderer is a pure consumer: record image bytes are embedded as-is
//! when they are already JPEG (`DCTDecode`), and transcoded to JPEG only
//! when the PDF imaging model leaves no other option (PNG/TIFF/WebP
//! sources). Record data is never altered.

use crate::pipeline::PlayerRecord;
use crate::portrait::encode_jpeg;
use image::ColorType;
use lopdf::{Dictionary, Document, Object, Stream, dictionary};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CardsError {
    #[error("failed to write card document: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to assemble card document: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("record image is not renderable: {0}")]
    Image(String),
}

const PT_PER_MM: f32 = 72.0 / 25.4;

// A4 portrait: 25 mm margins, 10 mm text rows, 75 mm portrait box.
const PAGE_WIDTH: f32 = 210.0 * PT_PER_MM;
const PAGE_HEIGHT: f32 = 297.0 * PT_PER_MM;
const MARGIN: f32 = 25.0 * PT_PER_MM;
const LINE_HEIGHT: f32 = 10.0 * PT_PER_MM;
const IMAGE_BOX: f32 = 75.0 * PT_PER_MM;

/// Render one page per record, in record order, to `writer`.
pub fn render_cards<W: Write>(records: &[PlayerRecord], writer: &mut W) -> Result<(), CardsError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut kids: Vec<Object> = Vec::with_capacity(records.len());
    for record in records {
        let card_image = prepare_image(&record.image)?;

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => card_image.width as i64,
                "Height" => card_image.height as i64,
                "ColorSpace" => if card_image.gray { "DeviceGray" } else { "DeviceRGB" },
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            card_image.data.clone(),
        ));
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            page_content(record, &card_image),
        ));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => regular_id, "F2" => bold_id },
                "XObject" => dictionary! { "Im0" => image_id },
            },
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc.save_to(writer)?;
    Ok(())
}

/// Render the card document into a file.
pub fn render_cards_file(records: &[PlayerRecord], path: &Path) -> Result<(), CardsError> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    render_cards(records, &mut writer)
}

/// Image bytes prepared for embedding: guaranteed JPEG, known dimensions.
struct CardImage {
    data: Vec<u8>,
    width: u32,
    height: u32,
    gray: bool,
}

fn prepare_image(bytes: &[u8]) -> Result<CardImage, CardsError> {
    let decoded = image::load_from_memory(bytes).map_err(|e| CardsError::Image(e.to_string()))?;
    let (width, height) = (decoded.width(), decoded.height());
    let gray = decoded.color() == ColorType::L8;

    let already_jpeg =
        image::guess_format(bytes).is_ok_and(|format| format == image::ImageFormat::Jpeg);
    let data = if already_jpeg {
        bytes.to_vec()
    } else {
        encode_jpeg(&decoded).map_err(|e| CardsError::Image(e.to_string()))?
    };

    Ok(CardImage {
        data,
        width,
        height,
        gray,
    })
}

enum Align {
    Center,
    Right,
}

/// Baseline y (PDF coordinates) for text row `row`, counted from the top.
fn baseline(row: usize) -> f32 {
    PAGE_HEIGHT - MARGIN - (row as f32 + 0.7) * LINE_HEIGHT
}

/// Scale `(width, height)` to fit inside a square box, preserving aspect.
fn fit_within_box(width: f32, height: f32, side: f32) -> (f32, f32) {
    let scale = (side / width).min(side / height);
    (width * scale, height * scale)
}

fn page_content(record: &PlayerRecord, image: &CardImage) -> Vec<u8> {
    let mut ops = Vec::new();

    let channel_line = format!("Channel {}", record.channel);
    text_op(&mut ops, &channel_line, "F2", &HELVETICA_BOLD_WIDTHS, 12.0, Align::Right, baseline(0));
    text_op(&mut ops, &record.role_name, "F2", &HELVETICA_BOLD_WIDTHS, 24.0, Align::Center, baseline(1));
    text_op(&mut ops, &record.name, "F1", &HELVETICA_WIDTHS, 12.0, Align::Center, baseline(2));
    text_op(&mut ops, &record.comments, "F1", &HELVETICA_WIDTHS, 12.0, Align::Center, baseline(3));

    let (draw_w, draw_h) = fit_within_box(image.width as f32, image.height as f32, IMAGE_BOX);
    let x = (PAGE_WIDTH - draw_w) / 2.0;
    let box_top = PAGE_HEIGHT - MARGIN - 4.0 * LINE_HEIGHT;
    let y = box_top - IMAGE_BOX + (IMAGE_BOX - draw_h) / 2.0;
    let _ = writeln!(ops, "q {draw_w:.2} 0 0 {draw_h:.2} {x:.2} {y:.2} cm /Im0 Do Q");

    ops
}

fn text_op(
    ops: &mut Vec<u8>,
    text: &str,
    font: &str,
    widths: &[u16; 95],
    size: f32,
    align: Align,
    y: f32,
) {
    if text.is_empty() {
        return;
    }
    let width = text_width(text, widths, size);
    let x = match align {
        Align::Center => (PAGE_WIDTH - width) / 2.0,
        Align::Right => PAGE_WIDTH - MARGIN - width,
    };
    let _ = write!(ops, "BT /{font} {size} Tf {x:.2} {y:.2} Td ");
    ops.extend_from_slice(&pdf_string(text));
    ops.extend_from_slice(b" Tj ET\n");
}

/// Measure a string in points using the AFM glyph widths.
///
/// Characters outside printable ASCII use the Helvetica default advance;
/// the error is a fraction of a glyph and only affects centering.
fn text_width(text: &str, widths: &[u16; 95], size: f32) -> f32 {
    let total: u32 = text
        .chars()
        .map(|c| match (c as u32).checked_sub(32) {
            Some(index) if index < 95 => u32::from(widths[index as usize]),
            _ => 556,
        })
        .sum();
    total as f32 * size / 1000.0
}

/// Escape a string as a PDF literal string in WinAnsi (approximated by
/// Latin-1; anything outside becomes `?`, control characters a space).
fn pdf_string(text: &str) -> Vec<u8> {
    let mut out = vec![b'('];
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(c as u8);
            }
            c if (c as u32) < 32 => out.push(b' '),
            c if (c as u32) < 127 => out.push(c as u8),
            c if (160..=255).contains(&(c as u32)) => out.push(c as u32 as u8),
            _ => out.push(b'?'),
        }
    }
    out.push(b')');
    out
}

/// AFM glyph widths (1/1000 em), Helvetica, chars 32..=126.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// AFM glyph widths (1/1000 em), Helvetica-Bold, chars 32..=126.
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];
