//! PDF fixtures for unit tests, generated with lopdf.

use lopdf::{dictionary, Document, Object, Stream};

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('(', "\\(").replace(')', "\\)")
}

fn finish(mut doc: Document, page_ids: Vec<lopdf::ObjectId>, pages_id: lopdf::ObjectId) -> Vec<u8> {
    let count = page_ids.len() as i64;
    let kids: Vec<Object> = page_ids.into_iter().map(Object::from).collect();
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

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// A text PDF with one page per entry; lines within an entry are split on `\n`.
/// Use ASCII text only: the standard Helvetica encoding is assumed.
pub(crate) fn text_pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let page_ids = pages
        .iter()
        .map(|text| {
            let mut content = String::from("BT /F1 12 Tf 72 720 Td 16 TL");
            for line in text.lines() {
                content.push_str(&format!(" ({}) Tj T*", escape(line)));
            }
            content.push_str(" ET");
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
            })
        })
        .collect();

    finish(doc, page_ids, pages_id)
}

/// A scanned-style PDF: each page is one uncompressed grayscale image of the given size.
pub(crate) fn image_pdf(sizes: &[(u32, u32)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let page_ids = sizes
        .iter()
        .map(|&(width, height)| {
            let pixels = vec![200u8; (width * height) as usize];
            let image_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width as i64,
                    "Height" => height as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                pixels,
            ));

            let content = format!("q {} 0 0 {} 0 0 cm /Im1 Do Q", width, height);
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), (width as i64).into(), (height as i64).into()],
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "XObject" => dictionary! { "Im1" => image_id },
                },
            })
        })
        .collect();

    finish(doc, page_ids, pages_id)
}
