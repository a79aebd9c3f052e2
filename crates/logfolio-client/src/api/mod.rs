//! API endpoint implementations.

pub(crate) mod items;
pub(crate) mod search;

pub use items::ItemsApi;
pub use search::SearchApi;

/// Append `key=value` pairs to `path`, URL-encoded. Pairs with `None` values are skipped.
pub(crate) fn with_query<'a>(
    path: &str,
    pairs: impl IntoIterator<Item = (&'a str, Option<String>)>,
) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    let mut any = false;
    for (key, value) in pairs {
        if let Some(value) = value {
            query.append_pair(key, &value);
            any = true;
        }
    }
    if any {
        format!("{}?{}", path, query.finish())
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_query_skips_missing_values() {
        assert_eq!(with_query("/items/", [("year", None)]), "/items/");
        assert_eq!(
            with_query(
                "/items/",
                [
                    ("year", Some("2024".to_string())),
                    ("search", Some("ghost in the shell".to_string())),
                    ("limit", None),
                ]
            ),
            "/items/?year=2024&search=ghost+in+the+shell"
        );
    }
}
