//! Deep merge of config trees.
//!
//! Sections are merged recursively, keys in the patch override keys in the
//! source. A leaf can replace a section and vice versa.

use crate::tree::{ConfigTree, ConfigValue};

/// Merge `patch` over `source`, returning a new tree.
///
/// Neither input is modified and the result shares nothing with them.
///
/// # Example
/// ```
/// use config_patcher::merge::merge;
/// use config_patcher::parser::parse;
///
/// let source = parse("[server]\nhost = localhost\nport = 8080\n");
/// let patch = parse("[server]\nport = 9000\n");
/// let merged = merge(&source, &patch);
/// // [server] host = localhost, port = 9000
/// # assert_eq!(merged, parse("[server]\nhost = localhost\nport = 9000\n"));
/// ```
pub fn merge(source: &ConfigTree, patch: &ConfigTree) -> ConfigTree {
    let mut merged = source.clone();
    merge_into(&mut merged, patch);
    merged
}

/// Merge `patch` into `base` in place.
pub fn merge_into(base: &mut ConfigTree, patch: &ConfigTree) {
    for (key, patch_value) in patch {
        match (base.get_mut(key), patch_value) {
            // Both are sections: merge recursively
            (Some(ConfigValue::Section(base_section)), ConfigValue::Section(patch_section)) => {
                merge_into(base_section, patch_section);
            }
            // Any other case: patch replaces base entirely
            _ => {
                base.insert(key.clone(), patch_value.clone());
            }
        }
    }
}

/// Merge several trees in order, later trees taking precedence.
pub fn merge_all<'a>(trees: impl IntoIterator<Item = &'a ConfigTree>) -> ConfigTree {
    trees.into_iter().fold(ConfigTree::new(), |mut acc, tree| {
        merge_into(&mut acc, tree);
        acc
    })
}
