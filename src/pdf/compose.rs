use lopdf::{dictionary, Document, Object, Stream};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{Result, MedleyError};

/// Compose the given images into one PDF, one page per image.
///
/// Every picture is decoded to RGB and embedded at its pixel dimensions
/// (one PDF unit per pixel, i.e. 72 dpi). Returns the page count.
pub fn images_to_pdf(image_paths: &[PathBuf], output: &Path) -> Result<usize> {
    if image_paths.is_empty() {
        return Err(MedleyError::Document(
            "No images to compose into a PDF".to_string(),
        ));
    }

    info!("Composing {} images into {}", image_paths.len(), output.display());

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::with_capacity(image_paths.len());

    for (index, path) in image_paths.iter().enumerate() {
        let image = image::open(path)?.to_rgb8();
        let (width, height) = image.dimensions();

        let xobject = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            image.into_raw(),
        );
        let image_id = doc.add_object(xobject);

        let name = format!("Im{}", index);
        let operations = format!("q\n{} 0 0 {} 0 0 cm\n/{} Do\nQ\n", width, height, name);
        let content_id = doc.add_object(Stream::new(dictionary! {}, operations.into_bytes()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![
                0.into(),
                0.into(),
                (width as i64).into(),
                (height as i64).into(),
            ],
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    name.as_str() => Object::Reference(image_id),
                },
            },
            "Contents" => Object::Reference(content_id),
        });
        kids.push(Object::Reference(page_id));
    }

    let page_count = kids.len();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", catalog_id);

    doc.compress();
    doc.save(output)?;

    info!("Created {} ({} pages)", output.display(), page_count);
    Ok(page_count)
}
