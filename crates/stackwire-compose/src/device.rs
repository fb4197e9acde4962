//! Device mapping normalization.

/// Expands a bare host device into an identical container mapping.
///
/// `"/dev/dri"` becomes `"/dev/dri:/dev/dri"`. Specs that already name a
/// container path, with or without permissions, are returned unchanged.
#[must_use]
pub fn normalize_device(spec: &str) -> String {
    if spec.contains(':') {
        spec.to_string()
    } else {
        format!("{spec}:{spec}")
    }
}

/// Normalizes every device spec in order.
#[must_use]
pub fn normalize_devices(specs: &[String]) -> Vec<String> {
    specs.iter().map(|spec| normalize_device(spec)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_device_is_mirrored() {
        assert_eq!(normalize_device("/dev/foo"), "/dev/foo:/dev/foo");
    }

    #[test]
    fn mapped_device_is_unchanged() {
        assert_eq!(normalize_device("/dev/foo:/dev/bar"), "/dev/foo:/dev/bar");
        assert_eq!(normalize_device("/dev/foo:/dev/bar:rwm"), "/dev/foo:/dev/bar:rwm");
    }

    #[test]
    fn order_is_preserved() {
        let specs = vec!["/dev/a".to_string(), "/dev/b:/dev/c".to_string()];
        assert_eq!(
            normalize_devices(&specs),
            vec!["/dev/a:/dev/a", "/dev/b:/dev/c"]
        );
    }
}
