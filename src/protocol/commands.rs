//! Module `commands`
//!
//! Request parameters accepted by each route, decoded by axum from the
//! query string or form body.

use serde::Deserialize;

/// Parameters of the directory page (`GET /`)
#[derive(Debug, Default, Deserialize)]
pub struct BrowseQuery {
    pub path: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Identifies one entry by its folder and name (`/download`, `/delete`)
#[derive(Debug, Default, Deserialize)]
pub struct EntryQuery {
    pub path: Option<String>,
    pub file: Option<String>,
}

impl EntryQuery {
    /// Both parameters, when present and non-empty
    pub fn parts(&self) -> Option<(&str, &str)> {
        match (non_empty(&self.path), non_empty(&self.file)) {
            (Some(path), Some(file)) => Some((path, file)),
            _ => None,
        }
    }
}

/// Form body of `POST /create-folder`
#[derive(Debug, Default, Deserialize)]
pub struct CreateFolderForm {
    pub path: Option<String>,
    #[serde(rename = "folderName")]
    pub folder_name: Option<String>,
}

/// Upload form field names
pub const UPLOAD_PATH_FIELD: &str = "path";
pub const UPLOAD_FILE_FIELD: &str = "file";

/// The value as sent, unless it is missing or blank. Never trimmed: `"a.txt "`
/// and `"a.txt"` are different entries.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Last component of a client-supplied file name. Browsers on some
/// platforms send the full local path, with either separator.
pub fn upload_base_name(file_name: &str) -> Option<&str> {
    file_name
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.trim().is_empty() && *name != "." && *name != "..")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_query_parts() {
        let query = EntryQuery {
            path: Some("/srv".into()),
            file: Some("a.txt".into()),
        };
        assert_eq!(query.parts(), Some(("/srv", "a.txt")));

        let missing = EntryQuery {
            path: Some("/srv".into()),
            file: Some("  ".into()),
        };
        assert_eq!(missing.parts(), None);
        assert_eq!(EntryQuery::default().parts(), None);
    }

    #[test]
    fn test_upload_base_name() {
        assert_eq!(upload_base_name("report.pdf"), Some("report.pdf"));
        assert_eq!(upload_base_name("C:\\Users\\me\\report.pdf"), Some("report.pdf"));
        assert_eq!(upload_base_name("../../etc/passwd"), Some("passwd"));
        assert_eq!(upload_base_name("dir/"), None);
        assert_eq!(upload_base_name(".."), None);
        assert_eq!(upload_base_name(""), None);
        assert_eq!(upload_base_name("   "), None);
        assert_eq!(upload_base_name(" padded.txt "), Some(" padded.txt "));
    }

    #[test]
    fn test_non_empty_keeps_value_as_sent() {
        assert_eq!(non_empty(&Some("a.txt ".into())), Some("a.txt "));
        assert_eq!(non_empty(&Some(" \t".into())), None);
        assert_eq!(non_empty(&None), None);
    }
}
