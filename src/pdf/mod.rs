// PDF document tooling
//
// Three independent operations built on lopdf:
// - compose: turn a folder of images into a single PDF
// - stamp: overlay page numbers onto an existing PDF
// - nup: lay out two source pages per A4 sheet

pub mod compose;
pub mod nup;
pub mod stamp;

pub use compose::*;
pub use nup::*;
pub use stamp::*;

use lopdf::{Dictionary, Document, Object, ObjectId};

/// US Letter fallback when a page carries no MediaBox anywhere in its
/// ancestor chain.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

fn number_to_f32(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value),
        _ => None,
    }
}

/// Look up a page attribute directly or through the Pages ancestor chain.
fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = page_id;
    loop {
        let dict = doc.get_dictionary(current).ok()?;
        if let Ok(object) = dict.get(key) {
            return match object {
                Object::Reference(id) => doc.get_object(*id).ok().cloned(),
                other => Some(other.clone()),
            };
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => current = *parent,
            _ => return None,
        }
    }
}

/// Effective MediaBox of a page as `[x0, y0, x1, y1]`.
pub(crate) fn media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let Some(Object::Array(values)) = inherited_attribute(doc, page_id, b"MediaBox") else {
        return DEFAULT_MEDIA_BOX;
    };
    if values.len() != 4 {
        return DEFAULT_MEDIA_BOX;
    }

    let mut result = DEFAULT_MEDIA_BOX;
    for (slot, value) in values.iter().enumerate() {
        match number_to_f32(value) {
            Some(number) => result[slot] = number,
            None => return DEFAULT_MEDIA_BOX,
        }
    }
    result
}

/// Effective resource dictionary of a page, resolved to an owned clone.
/// Empty when the page declares none.
pub(crate) fn resolved_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    match inherited_attribute(doc, page_id, b"Resources") {
        Some(Object::Dictionary(dict)) => dict,
        _ => Dictionary::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn test_media_box_falls_back_to_letter() {
        let mut doc = Document::with_version("1.5");
        let page_id = doc.add_object(dictionary! { "Type" => "Page" });
        assert_eq!(media_box(&doc, page_id), DEFAULT_MEDIA_BOX);
    }

    #[test]
    fn test_media_box_is_inherited_from_parent() {
        let mut doc = Document::with_version("1.5");
        let parent_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "MediaBox" => vec![0.into(), 0.into(), 200.into(), 400.into()],
        });
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(parent_id),
        });

        assert_eq!(media_box(&doc, page_id), [0.0, 0.0, 200.0, 400.0]);
    }
}
