//! PDF serialization of laid out pages with lopdf.

use std::io::Write;

use chrono::{DateTime, Utc};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Object, Stream, StringFormat};

use super::layout::{Font, LayoutPage, PageElement};
use crate::error::{Error, Result};
use crate::model::Metadata;
use crate::render::PageLayout;

const PRODUCER: &str = concat!("docshift ", env!("CARGO_PKG_VERSION"));

/// Serialize pages into a complete PDF file.
pub fn write_pdf(pages: &[LayoutPage], metadata: &Metadata, layout: &PageLayout) -> Result<Vec<u8>> {
    let mut pdf = lopdf::Document::with_version("1.5");
    let pages_id = pdf.new_object_id();

    let mut fonts = Dictionary::new();
    for font in Font::ALL {
        let font_id = pdf.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(font.resource_name(), font_id);
    }
    let resources_id = pdf.add_object(dictionary! {
        "Font" => fonts,
    });

    let (width, height) = layout.size.dimensions();
    let media_box: Vec<Object> = vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(width.round() as i64),
        Object::Integer(height.round() as i64),
    ];

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let content = page_content(page).encode()?;
        let stream = if layout.compress {
            Stream::new(
                dictionary! { "Filter" => "FlateDecode" },
                deflate(&content)?,
            )
        } else {
            Stream::new(Dictionary::new(), content)
        };
        let content_id = pdf.add_object(stream);
        let page_id = pdf.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => media_box.clone(),
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    pdf.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = pdf.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    pdf.trailer.set("Root", catalog_id);

    let info_id = pdf.add_object(info_dictionary(metadata));
    pdf.trailer.set("Info", info_id);

    let mut buffer = Vec::new();
    pdf.save_to(&mut buffer)
        .map_err(|e| Error::Render(format!("failed to write PDF: {}", e)))?;
    log::debug!("wrote {} pages, {} bytes", pages.len(), buffer.len());
    Ok(buffer)
}

fn page_content(page: &LayoutPage) -> Content {
    let mut operations = Vec::new();
    for element in &page.elements {
        match element {
            PageElement::Text(line) => {
                for segment in line.segments.iter().filter(|s| !s.text.is_empty()) {
                    operations.push(Operation::new("BT", vec![]));
                    operations.push(Operation::new(
                        "Tf",
                        vec![
                            segment.font.resource_name().into(),
                            Object::Real(segment.size),
                        ],
                    ));
                    operations.push(Operation::new(
                        "Td",
                        vec![
                            Object::Integer(segment.x.round() as i64),
                            Object::Integer(line.baseline.round() as i64),
                        ],
                    ));
                    operations.push(Operation::new(
                        "Tj",
                        vec![Object::String(
                            encode_win_ansi(&segment.text),
                            StringFormat::Literal,
                        )],
                    ));
                    operations.push(Operation::new("ET", vec![]));
                }
            }
            PageElement::Rule { x1, x2, y } => {
                let y = Object::Integer(y.round() as i64);
                operations.push(Operation::new(
                    "m",
                    vec![Object::Integer(x1.round() as i64), y.clone()],
                ));
                operations.push(Operation::new(
                    "l",
                    vec![Object::Integer(x2.round() as i64), y],
                ));
                operations.push(Operation::new("S", vec![]));
            }
        }
    }
    Content { operations }
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .map_err(|e| Error::Render(format!("failed to compress content stream: {}", e)))
}

fn info_dictionary(metadata: &Metadata) -> Dictionary {
    let mut info = Dictionary::new();
    if let Some(title) = &metadata.title {
        info.set("Title", text_string(title));
    }
    info.set("Producer", text_string(PRODUCER));
    let created: DateTime<Utc> = metadata.created.unwrap_or_else(Utc::now);
    info.set(
        "CreationDate",
        Object::string_literal(created.format("D:%Y%m%d%H%M%SZ").to_string()),
    );
    info
}

/// A PDF text string: literal for ASCII, UTF-16BE with BOM otherwise.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Encode text for the standard fonts' WinAnsiEncoding. Characters outside
/// the code page become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u8,
            _ => match c {
                '\t' => b' ',
                '\u{20AC}' => 0x80,
                '\u{201A}' => 0x82,
                '\u{0192}' => 0x83,
                '\u{201E}' => 0x84,
                '\u{2026}' => 0x85,
                '\u{2020}' => 0x86,
                '\u{2021}' => 0x87,
                '\u{02C6}' => 0x88,
                '\u{2030}' => 0x89,
                '\u{0160}' => 0x8A,
                '\u{2039}' => 0x8B,
                '\u{0152}' => 0x8C,
                '\u{017D}' => 0x8E,
                '\u{2018}' => 0x91,
                '\u{2019}' => 0x92,
                '\u{201C}' => 0x93,
                '\u{201D}' => 0x94,
                '\u{2022}' => 0x95,
                '\u{2013}' => 0x96,
                '\u{2014}' => 0x97,
                '\u{02DC}' => 0x98,
                '\u{2122}' => 0x99,
                '\u{0161}' => 0x9A,
                '\u{203A}' => 0x9B,
                '\u{0153}' => 0x9C,
                '\u{017E}' => 0x9E,
                '\u{0178}' => 0x9F,
                _ => b'?',
            },
        })
        .collect()
}
