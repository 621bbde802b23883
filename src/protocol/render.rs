//! Directory page rendering
//!
//! Turns a listing into the HTML page with breadcrumbs, upload and
//! create-folder forms. Sorting and unit formatting happen here, not in
//! the storage layer.

use chrono::{DateTime, Local};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use crate::protocol::responses::page_url;
use crate::storage::{DirectoryEntry, ValidatedPath};

const KIB: u64 = 1 << 10;
const MIB: u64 = 1 << 20;
const GIB: u64 = 1 << 30;

const PAGE_STYLE: &str = "
body { font-family: sans-serif; margin: 2em; color: #222; }
nav a { text-decoration: none; }
table { border-collapse: collapse; width: 100%; margin-top: 1em; }
th, td { text-align: left; padding: 0.35em 0.8em; border-bottom: 1px solid #ddd; }
.message { padding: 0.6em 1em; margin: 1em 0; border-radius: 4px; }
.error { background: #fde2e2; color: #8a1f1f; }
.success { background: #e1f5e4; color: #1d5e2a; }
.forms { display: flex; gap: 2em; margin-top: 1em; }
";

const PAGE_SCRIPT: &str = "
function deleteEntry(button) {
  if (!confirm('Delete ' + button.dataset.name + '?')) { return; }
  fetch(button.dataset.url, { method: 'DELETE' })
    .then(function (response) {
      return response.text().then(function (text) {
        if (!response.ok) { alert(text); }
        location.reload();
      });
    });
}
";

/// Everything the directory page shows
pub struct ListingPage<'a> {
    pub root: &'a Path,
    pub current: &'a ValidatedPath,
    pub entries: Vec<DirectoryEntry>,
    pub error: Option<&'a str>,
    pub success: Option<&'a str>,
}

/// Human readable size: bytes, then KB/MB/GB with two decimals (1024 based)
pub fn format_size(size: u64) -> String {
    match size {
        s if s >= GIB => format!("{:.2} GB", s as f64 / GIB as f64),
        s if s >= MIB => format!("{:.2} MB", s as f64 / MIB as f64),
        s if s >= KIB => format!("{:.2} KB", s as f64 / KIB as f64),
        s => format!("{} bytes", s),
    }
}

/// Local time as `YYYY-MM-DD HH:MM:SS`
pub fn format_modified(time: SystemTime) -> String {
    let local: DateTime<Local> = time.into();
    local.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Root followed by each folder down to `current`, as (label, absolute path)
fn breadcrumbs(root: &Path, current: &Path) -> Vec<(String, String)> {
    let mut crumbs = vec![(
        root.to_string_lossy().into_owned(),
        root.to_string_lossy().into_owned(),
    )];

    if let Ok(relative) = current.strip_prefix(root) {
        let mut walked = PathBuf::from(root);
        for component in relative.components() {
            if let Component::Normal(part) = component {
                walked.push(part);
                crumbs.push((
                    part.to_string_lossy().into_owned(),
                    walked.to_string_lossy().into_owned(),
                ));
            }
        }
    }
    crumbs
}

pub fn render_listing(page: ListingPage<'_>) -> Markup {
    let current = page.current.to_string_lossy();
    let at_root = page.current.as_path() == page.root;

    let mut entries = page.entries;
    entries.sort_by(|a, b| {
        b.is_folder()
            .cmp(&a.is_folder())
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "File Manager - " (current) }
                style { (PreEscaped(PAGE_STYLE)) }
                script { (PreEscaped(PAGE_SCRIPT)) }
            }
            body {
                h1 { "File Manager" }
                nav {
                    @for (i, (label, path)) in breadcrumbs(page.root, page.current.as_path()).iter().enumerate() {
                        @if i > 0 { " / " }
                        a href=(page_url(path)) { (label) }
                    }
                }

                @if let Some(message) = page.error {
                    div.message.error { (message) }
                }
                @if let Some(message) = page.success {
                    div.message.success { (message) }
                }

                div.forms {
                    form method="post" action="/upload" enctype="multipart/form-data" {
                        input type="hidden" name="path" value=(current);
                        input type="file" name="file" required;
                        button type="submit" { "Upload" }
                    }
                    form method="post" action="/create-folder" {
                        input type="hidden" name="path" value=(current);
                        input type="text" name="folderName" placeholder="New Folder";
                        button type="submit" { "Create folder" }
                    }
                }

                table {
                    thead {
                        tr { th { "Name" } th { "Type" } th { "Size" } th { "Modified" } th {} }
                    }
                    tbody {
                        @if !at_root {
                            @if let Some(parent) = page.current.as_path().parent() {
                                tr {
                                    td { a href=(page_url(&parent.to_string_lossy())) { ".." } }
                                    td { "folder" } td { "-" } td {} td {}
                                }
                            }
                        }
                        @for entry in &entries {
                            @let download_url = format!(
                                "/download?path={}&file={}",
                                urlencoding::encode(&current),
                                urlencoding::encode(&entry.name)
                            );
                            @let delete_url = format!(
                                "/delete?path={}&file={}",
                                urlencoding::encode(&current),
                                urlencoding::encode(&entry.name)
                            );
                            tr {
                                td {
                                    @if entry.is_folder() {
                                        @let child = page.current.as_path().join(&entry.name);
                                        a href=(page_url(&child.to_string_lossy())) { (entry.name) "/" }
                                    } @else {
                                        a href=(download_url) { (entry.name) }
                                    }
                                }
                                td { (entry.kind.as_str()) }
                                td {
                                    @match entry.size {
                                        Some(size) => { (format_size(size)) },
                                        None => { "-" },
                                    }
                                }
                                td { (format_modified(entry.modified_at)) }
                                td {
                                    @if entry.is_folder() {
                                        a href=(download_url) { "Download ZIP" }
                                        " "
                                    }
                                    button type="button" data-url=(delete_url) data-name=(entry.name) onclick="deleteEntry(this)" { "Delete" }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{EntryKind, PathGuard};

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 bytes");
        assert_eq!(format_size(1023), "1023 bytes");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(5 * MIB), "5.00 MB");
        assert_eq!(format_size(3 * GIB + GIB / 4), "3.25 GB");
    }

    #[test]
    fn test_breadcrumbs() {
        let crumbs = breadcrumbs(Path::new("/srv"), Path::new("/srv/a/b"));
        let labels: Vec<&str> = crumbs.iter().map(|(label, _)| label.as_str()).collect();
        assert_eq!(labels, vec!["/srv", "a", "b"]);
        assert_eq!(crumbs[2].1, PathBuf::from("/srv/a/b").to_string_lossy());
    }

    #[test]
    fn test_render_listing() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir(temp.path().join("sub")).unwrap();
        let guard = PathGuard::new(temp.path()).unwrap();
        let current = guard.validate("sub").unwrap();

        let entries = vec![
            DirectoryEntry {
                name: "zeta.txt".into(),
                kind: EntryKind::File,
                size: Some(2048),
                modified_at: SystemTime::now(),
            },
            DirectoryEntry {
                name: "<b>photos</b>".into(),
                kind: EntryKind::Folder,
                size: None,
                modified_at: SystemTime::now(),
            },
        ];

        let html = render_listing(ListingPage {
            root: guard.root(),
            current: &current,
            entries,
            error: Some("Upload error: boom"),
            success: None,
        })
        .into_string();

        assert!(html.contains("zeta.txt"));
        assert!(html.contains("2.00 KB"));
        assert!(html.contains("Upload error: boom"));
        assert!(html.contains("Download ZIP"));
        // Names are escaped
        assert!(html.contains("&lt;b&gt;photos&lt;/b&gt;"));
        assert!(!html.contains("<b>photos"));
        // Folders are listed before files
        assert!(html.find("photos").unwrap() < html.find("zeta.txt").unwrap());
    }
}
