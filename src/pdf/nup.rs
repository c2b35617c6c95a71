use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::path::Path;
use tracing::info;

use crate::error::{Result, MedleyError};
use super::{media_box, resolved_resources};

/// Portrait A4 in PDF units.
pub const A4_WIDTH: f32 = 595.276;
pub const A4_HEIGHT: f32 = 841.89;

const SCALE: f32 = 0.5;

/// Lay out the source document two pages per portrait A4 sheet, first page
/// on the top half, second on the bottom. An odd trailing page sits alone
/// on top. Returns the output page count.
pub fn make_2up(input: &Path, output: &Path) -> Result<usize> {
    info!("Creating 2-up layout: {} -> {}", input.display(), output.display());

    let mut doc = Document::load(input)?;
    doc.decompress();

    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
    if page_ids.is_empty() {
        return Err(MedleyError::Document(format!(
            "{} has no pages",
            input.display()
        )));
    }

    // Each source page becomes a Form XObject carrying its own content and
    // resolved resources, so the new sheets can place it with a transform.
    let mut forms = Vec::with_capacity(page_ids.len());
    for page_id in page_ids {
        let content = doc.get_page_content(page_id)?;
        let bbox = media_box(&doc, page_id);
        let resources = resolved_resources(&doc, page_id);

        let form = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![
                    bbox[0].into(),
                    bbox[1].into(),
                    bbox[2].into(),
                    bbox[3].into(),
                ],
                "Resources" => resources,
            },
            content,
        );
        forms.push((doc.add_object(form), bbox));
    }

    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();

    for pair in forms.chunks(2) {
        let mut operations = String::new();
        let mut xobjects = Dictionary::new();

        for (slot, (form_id, bbox)) in pair.iter().enumerate() {
            let name = format!("P{}", slot);
            let ty = if slot == 0 { A4_HEIGHT / 2.0 } else { 0.0 };

            // Map the form's own origin to the slot position at half scale.
            operations.push_str(&format!(
                "q\n{} 0 0 {} {:.2} {:.2} cm\n/{} Do\nQ\n",
                SCALE,
                SCALE,
                -SCALE * bbox[0],
                ty - SCALE * bbox[1],
                name
            ));
            xobjects.set(name, Object::Reference(*form_id));
        }

        let content_id = doc.add_object(Stream::new(dictionary! {}, operations.into_bytes()));
        let sheet_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![
                0.into(),
                0.into(),
                A4_WIDTH.into(),
                A4_HEIGHT.into(),
            ],
            "Resources" => dictionary! { "XObject" => xobjects },
            "Contents" => Object::Reference(content_id),
        });
        kids.push(Object::Reference(sheet_id));
    }

    let sheet_count = kids.len();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => sheet_count as i64,
        }),
    );

    let root_id = doc.trailer.get(b"Root")?.as_reference()?;
    doc.get_dictionary_mut(root_id)?
        .set("Pages", Object::Reference(pages_id));

    // The replaced page tree is unreachable now; drop it instead of
    // serializing it into the output.
    doc.prune_objects();
    doc.compress();
    doc.save(output)?;

    info!("2-up layout written: {} sheets", sheet_count);
    Ok(sheet_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::compose::images_to_pdf;
    use image::RgbImage;
    use tempfile::tempdir;

    fn sample_pdf(dir: &Path, pages: usize) -> std::path::PathBuf {
        let mut images = Vec::new();
        for index in 0..pages {
            let path = dir.join(format!("{}.png", index));
            RgbImage::new(60, 80).save(&path).unwrap();
            images.push(path);
        }
        let pdf = dir.join("doc.pdf");
        images_to_pdf(&images, &pdf).unwrap();
        pdf
    }

    #[test]
    fn test_two_pages_per_sheet() {
        let dir = tempdir().unwrap();
        let pdf = sample_pdf(dir.path(), 4);
        let output = dir.path().join("doc_2up.pdf");

        assert_eq!(make_2up(&pdf, &output).unwrap(), 2);
        assert_eq!(Document::load(&output).unwrap().get_pages().len(), 2);
    }

    #[test]
    fn test_odd_trailing_page_gets_its_own_sheet() {
        let dir = tempdir().unwrap();
        let pdf = sample_pdf(dir.path(), 3);
        let output = dir.path().join("doc_2up.pdf");

        assert_eq!(make_2up(&pdf, &output).unwrap(), 2);
    }

    #[test]
    fn test_replaced_source_pages_are_dropped() {
        let dir = tempdir().unwrap();
        let pdf = sample_pdf(dir.path(), 4);
        let output = dir.path().join("doc_2up.pdf");
        make_2up(&pdf, &output).unwrap();

        // Only the new sheets may survive as Page objects; the source
        // pages were replaced and must not linger in the output.
        let doc = Document::load(&output).unwrap();
        let page_objects = doc
            .objects
            .values()
            .filter(|object| {
                object
                    .as_dict()
                    .ok()
                    .and_then(|dict| dict.get(b"Type").ok())
                    .and_then(|ty| ty.as_name().ok())
                    == Some(b"Page".as_slice())
            })
            .count();
        assert_eq!(page_objects, 2);
    }

    #[test]
    fn test_sheets_are_a4() {
        let dir = tempdir().unwrap();
        let pdf = sample_pdf(dir.path(), 2);
        let output = dir.path().join("doc_2up.pdf");
        make_2up(&pdf, &output).unwrap();

        let doc = Document::load(&output).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let bbox = media_box(&doc, page_id);
        assert!((bbox[2] - A4_WIDTH).abs() < 0.01);
        assert!((bbox[3] - A4_HEIGHT).abs() < 0.01);
    }
}
