//! Type namespace helpers.
//!
//! Registered types are keyed by `namespace.TypeName`. The namespace of an application is its package name,
//! cleaned so it can never contain the `.` separator or characters that would not survive as an identifier.

/// Clean a host application name into a type namespace.
///
/// Takes the last `.`-separated component (bundle-identifier style names such as `com.acme.shop` become
/// `shop`) and replaces spaces and dashes with underscores.
///
/// ## Examples
/// ```rust
/// use reflectmap_core::namespace::clean_app_name;
///
/// assert_eq!(clean_app_name("my-app"), "my_app");
/// assert_eq!(clean_app_name("com.acme.Order Desk"), "Order_Desk");
/// ```
pub fn clean_app_name(name: &str) -> String {
    let last = name.rsplit('.').next().unwrap_or(name);
    last.replace([' ', '-'], "_")
}

/// Join a namespace and a short type name.
pub fn qualify(namespace: &str, short_name: &str) -> String {
    if namespace.is_empty() {
        short_name.to_string()
    } else {
        format!("{namespace}.{short_name}")
    }
}

/// Strip everything up to the last `.` of a qualified type name.
pub fn short_type_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

/// Check whether a type name already carries a namespace.
pub fn is_qualified(type_name: &str) -> bool {
    type_name.contains('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_namespace_leaves_name_alone() {
        assert_eq!(qualify("", "User"), "User");
        assert_eq!(qualify("shop", "User"), "shop.User");
    }

    #[test]
    fn short_name_of_qualified() {
        assert_eq!(short_type_name("shop.User"), "User");
        assert_eq!(short_type_name("User"), "User");
    }

    #[test]
    fn clean_name_without_separators() {
        assert_eq!(clean_app_name("reflectmap"), "reflectmap");
    }
}
