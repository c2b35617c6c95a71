use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::path::Path;
use tracing::info;

use crate::error::Result;
use super::{media_box, resolved_resources};

/// Resource name under which the numbering font is registered on each page.
const FONT_RESOURCE: &str = "MdlyNum";

/// Approximate width of a Helvetica digit glyph, as a fraction of the font
/// size (556/1000 per the AFM metrics). Good enough to centre a number.
const DIGIT_WIDTH_FACTOR: f32 = 0.556;

#[derive(Debug, Clone, Copy)]
pub struct StampOptions {
    pub font_size: f32,
    pub margin: f32,
}

/// Stamp a centred bold page number near the bottom of every page,
/// rewriting the file in place. Returns the page count.
pub fn stamp_page_numbers(path: &Path, options: &StampOptions) -> Result<usize> {
    info!("Stamping page numbers onto {}", path.display());

    let mut doc = Document::load(path)?;
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });

    let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
    for (number, page_id) in &pages {
        let [x0, y0, x1, _] = media_box(&doc, *page_id);
        let text = number.to_string();

        let text_width = text.len() as f32 * options.font_size * DIGIT_WIDTH_FACTOR;
        let x = x0 + ((x1 - x0) - text_width) / 2.0;
        let y = y0 + options.margin;

        // The existing content is bracketed with q/Q so any transform it
        // leaves behind cannot displace the overlay.
        let push_id = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
        let overlay = format!(
            "Q\nq\nBT\n/{} {} Tf\n1 0 0 1 {:.2} {:.2} Tm\n({}) Tj\nET\nQ\n",
            FONT_RESOURCE, options.font_size, x, y, text
        );
        let overlay_id = doc.add_object(Stream::new(dictionary! {}, overlay.into_bytes()));

        attach_font(&mut doc, *page_id, font_id)?;
        bracket_content(&mut doc, *page_id, push_id, overlay_id)?;
    }

    doc.save(path)?;

    info!("Numbered {} pages in {}", pages.len(), path.display());
    Ok(pages.len())
}

/// Register the numbering font in the page's resource dictionary. The
/// effective resources are cloned onto the page first so inherited entries
/// stay visible to the original content.
fn attach_font(doc: &mut Document, page_id: ObjectId, font_id: ObjectId) -> Result<()> {
    let mut resources = resolved_resources(doc, page_id);

    let mut fonts = match resources.get(b"Font") {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        Ok(Object::Reference(id)) => doc
            .get_dictionary(*id)
            .map(|dict| dict.clone())
            .unwrap_or_else(|_| Dictionary::new()),
        _ => Dictionary::new(),
    };
    fonts.set(FONT_RESOURCE, Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    doc.get_dictionary_mut(page_id)?
        .set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// Rewrite the page's Contents to `[prefix, ...existing, suffix]`.
///
/// Contents may be a stream, an array, or an indirect reference to either;
/// a reference to an array must be spliced element-wise, since elements of
/// a Contents array have to resolve to streams.
fn bracket_content(
    doc: &mut Document,
    page_id: ObjectId,
    prefix_id: ObjectId,
    suffix_id: ObjectId,
) -> Result<()> {
    let existing = doc.get_dictionary(page_id)?.get(b"Contents").ok().cloned();

    let mut contents = vec![Object::Reference(prefix_id)];
    match existing {
        Some(Object::Reference(id)) => match doc.get_object(id) {
            Ok(Object::Array(elements)) => contents.extend(elements.iter().cloned()),
            _ => contents.push(Object::Reference(id)),
        },
        Some(Object::Array(elements)) => contents.extend(elements),
        _ => {}
    }
    contents.push(Object::Reference(suffix_id));

    doc.get_dictionary_mut(page_id)?
        .set("Contents", Object::Array(contents));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::compose::images_to_pdf;
    use image::RgbImage;
    use tempfile::tempdir;

    fn options() -> StampOptions {
        StampOptions {
            font_size: 28.0,
            margin: 50.0,
        }
    }

    fn sample_pdf(dir: &Path, pages: usize) -> std::path::PathBuf {
        let mut images = Vec::new();
        for index in 0..pages {
            let path = dir.join(format!("{}.png", index));
            RgbImage::new(100, 140).save(&path).unwrap();
            images.push(path);
        }
        let pdf = dir.join("doc.pdf");
        images_to_pdf(&images, &pdf).unwrap();
        pdf
    }

    #[test]
    fn test_stamp_keeps_page_count() {
        let dir = tempdir().unwrap();
        let pdf = sample_pdf(dir.path(), 3);

        let stamped = stamp_page_numbers(&pdf, &options()).unwrap();
        assert_eq!(stamped, 3);

        let doc = Document::load(&pdf).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn test_overlay_draws_the_page_number() {
        let dir = tempdir().unwrap();
        let pdf = sample_pdf(dir.path(), 2);
        stamp_page_numbers(&pdf, &options()).unwrap();

        let doc = Document::load(&pdf).unwrap();
        for (number, page_id) in doc.get_pages() {
            let content = doc.get_page_content(page_id).unwrap();
            let text = String::from_utf8_lossy(&content);
            assert!(text.contains(&format!("({}) Tj", number)));
            assert!(text.contains(FONT_RESOURCE));
        }
    }

    #[test]
    fn test_contents_reference_to_array_is_spliced() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("indirect.pdf");

        // A page whose Contents is an indirect reference to an array of
        // stream references, which is a legal shape some writers emit.
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(dictionary! {}, b"0 0 m\n".to_vec()));
        let array_id = doc.add_object(Object::Array(vec![Object::Reference(content_id)]));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), 100.into(), 140.into()],
            "Contents" => Object::Reference(array_id),
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(&path).unwrap();

        stamp_page_numbers(&path, &options()).unwrap();

        let stamped = Document::load(&path).unwrap();
        let page_id = *stamped.get_pages().values().next().unwrap();
        let contents = stamped
            .get_dictionary(page_id)
            .unwrap()
            .get(b"Contents")
            .unwrap();
        let Object::Array(elements) = contents else {
            panic!("expected a Contents array");
        };
        // Every element must resolve to a stream.
        for element in elements {
            let id = element.as_reference().unwrap();
            assert!(matches!(stamped.get_object(id), Ok(Object::Stream(_))));
        }

        let content = stamped.get_page_content(page_id).unwrap();
        assert!(String::from_utf8_lossy(&content).contains("(1) Tj"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = stamp_page_numbers(Path::new("/no/such.pdf"), &options());
        assert!(result.is_err());
    }
}
