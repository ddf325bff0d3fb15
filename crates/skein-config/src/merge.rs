/// Recursively deep-merge `overlay` into `base`.
///
/// - Tables merge recursively per-field.
/// - Scalars and arrays from the overlay **replace** the base value.
pub fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge(base_val, overlay_val);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
        },
    }
}

/// Set a dotted `path` inside `root`, creating intermediate tables.
///
/// A non-table value in the way is replaced by a table.
pub fn set_path(root: &mut toml::Value, path: &str, value: toml::Value) {
    let mut parts: Vec<&str> = path.split('.').collect();
    let Some(leaf) = parts.pop() else {
        return;
    };
    let mut cursor = root;
    for part in parts {
        if !cursor.is_table() {
            *cursor = toml::Value::Table(toml::map::Map::new());
        }
        cursor = match cursor {
            toml::Value::Table(table) => table
                .entry(part.to_owned())
                .or_insert(toml::Value::Table(toml::map::Map::new())),
            _ => return,
        };
    }
    if !cursor.is_table() {
        *cursor = toml::Value::Table(toml::map::Map::new());
    }
    if let toml::Value::Table(table) = cursor {
        table.insert(leaf.to_owned(), value);
    }
}
