// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON export of a layer subtree.
//!
//! The export is meant for bug reports and test fixtures: it captures the
//! caller-set state of every layer (geometry, compositing inputs, and
//! interaction settings), not renderer-side resources or pixels.

use kurbo::{Point, Rect};
use serde_json::{Value, json};
use tableau_core::layer::{LayerId, LayerStore};

use crate::pretty::contents_label;

fn rect_json(r: Rect) -> Value {
    json!([r.x0, r.y0, r.x1, r.y1])
}

fn point_json(p: Point) -> Value {
    json!([p.x, p.y])
}

/// Exports `root` and its sublayers (in z-order) as a JSON value.
#[must_use]
pub fn to_json(store: &LayerStore, root: LayerId) -> Value {
    let mask = store.mask(root).map(|m| {
        json!({
            "width": m.width(),
            "height": m.height(),
            "threshold": m.threshold(),
        })
    });
    let sublayers: Vec<Value> = store.sublayers(root).map(|s| to_json(store, s)).collect();
    json!({
        "id": root.index(),
        "generation": root.generation(),
        "frame": rect_json(store.frame(root)),
        "anchor_point": point_json(store.anchor_point(root)),
        "transform": store.transform(root).to_cols_array_f32().to_vec(),
        "z_index": store.z_index(root),
        "opacity": store.opacity(root),
        "hidden": store.hidden(root),
        "opaque": store.opaque(root),
        "corner_radius": store.corner_radius(root),
        "contents": contents_label(store.contents(root)),
        "contents_source": store.contents_source(root),
        "content_rect": rect_json(store.content_rect(root)),
        "mask": mask,
        "filters": store.filters(root).len(),
        "user_interaction_enabled": store.user_interaction_enabled(root),
        "hit_test_mask_threshold": store.hit_test_mask_threshold(root),
        "sublayers": sublayers,
    })
}

/// Exports `root` as pretty-printed JSON text.
///
/// # Errors
///
/// Returns an error if a float in the tree is not finite.
pub fn to_json_string(store: &LayerStore, root: LayerId) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&to_json(store, root))
}

#[cfg(test)]
mod tests {
    use tableau_core::mask::Mask;

    use super::*;

    #[test]
    fn exports_nested_layers() {
        let mut store = LayerStore::new();
        let root = store.create_layer();
        let child = store.create_passthrough_layer();
        store.set_frame(root, Rect::new(0.0, 0.0, 200.0, 200.0));
        store.set_frame(child, Rect::new(0.0, 0.0, 50.0, 50.0));
        store.set_z_index(child, 1);
        store.set_corner_radius(child, 0.25);
        store.set_mask(root, Some(Mask::new(vec![0, 255], 2, 1).with_threshold(128)));
        store.add_sublayer(root, child);

        let json = to_json(&store, root);
        assert_eq!(json["id"], 0);
        assert_eq!(json["frame"], json!([0.0, 0.0, 200.0, 200.0]));
        assert_eq!(json["anchor_point"], json!([0.5, 0.5]));
        assert_eq!(json["contents"], "empty");
        assert_eq!(json["mask"]["threshold"], 128);
        assert_eq!(json["transform"].as_array().map(Vec::len), Some(16));

        let sub = &json["sublayers"][0];
        assert_eq!(sub["id"], 1);
        assert_eq!(sub["z_index"], 1);
        assert_eq!(sub["contents"], "passthrough");
        assert_eq!(sub["filters"], 1);
        assert_eq!(sub["mask"], Value::Null);
        assert_eq!(sub["sublayers"], json!([]));
    }

    #[test]
    fn pretty_string_is_parseable() {
        let mut store = LayerStore::new();
        let root = store.create_layer();
        let text = to_json_string(&store, root).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, to_json(&store, root));
    }
}
