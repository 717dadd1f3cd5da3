//! Resource format inference.
//!
//! DKAN resources frequently carry only a `mimetype`, while CKAN expects a
//! short `format` code. This module holds the fixed mapping between the two.

/// MIME type → CKAN format code. Lookup is exact and case-sensitive.
const MIMETYPE_FORMATS: &[(&str, &str)] = &[
    ("text/html", "HTML"),
    ("text/csv", "CSV"),
    ("text/xml", "XML"),
    ("application/pdf", "PDF"),
    ("application/zip", "ZIP"),
    ("application/rdf+xml", "RDF"),
    ("application/json", "JSON"),
    ("application/vnd.ms-excel", "XLS"),
    ("application/vnd.google-earth.kml+xml", "KML"),
    ("application/msword", "DOC"),
];

/// Returns the format code for a known MIME type.
pub fn format_for_mimetype(mimetype: &str) -> Option<&'static str> {
    MIMETYPE_FORMATS
        .iter()
        .find(|(mime, _)| *mime == mimetype)
        .map(|(_, format)| *format)
}

/// Infers a resource format, falling back to an empty string when the MIME
/// type is absent or unknown.
pub fn infer_format(mimetype: Option<&str>) -> String {
    mimetype
        .and_then(format_for_mimetype)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_mimetypes() {
        assert_eq!(format_for_mimetype("text/csv"), Some("CSV"));
        assert_eq!(format_for_mimetype("application/vnd.ms-excel"), Some("XLS"));
        assert_eq!(
            format_for_mimetype("application/vnd.google-earth.kml+xml"),
            Some("KML")
        );
    }

    #[test]
    fn test_lookup_is_exact() {
        assert_eq!(format_for_mimetype("TEXT/CSV"), None);
        assert_eq!(format_for_mimetype("text/csv; charset=utf-8"), None);
    }

    #[test]
    fn test_infer_defaults_to_empty() {
        assert_eq!(infer_format(Some("text/csv")), "CSV");
        assert_eq!(infer_format(Some("image/png")), "");
        assert_eq!(infer_format(None), "");
    }
}
