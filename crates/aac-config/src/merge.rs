// SPDX-License-Identifier: MIT

//! Deep-merge semantics for layered configuration: dictionaries merge key by
//! key (later layer wins per-key), lists are replaced wholesale (spec §6).

use serde_json::Value;

pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(base_val) => deep_merge(base_val, overlay_val),
                    None => {
                        base_map.insert(key, overlay_val);
                    }
                }
            }
        }
        (base_slot, overlay_val) => {
            *base_slot = overlay_val;
        }
    }
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
