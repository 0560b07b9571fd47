//! URL detection over the viewport.
//!
//! Feeds the renderer's jump-label overlay: scan the visible rows
//! (following soft wraps within the viewport), find URLs, and report
//! them with their anchor cell. OSC 8 hyperlinks are reported from
//! their cell flag directly; plain-text URLs are found with a regex.

use crate::Term;
use core_grid::AttrFlags;
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlMatch {
    pub uri: String,
    /// Viewport row/col of the first cell.
    pub row: usize,
    pub col: usize,
    /// Number of cells the visible text spans (on its first row).
    pub len: usize,
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(https?|ftp|ftps|file|gemini|gopher)://[^\s'\x22<>\(\)\[\]]+").unwrap()
    })
}

/// Characters URLs commonly end before but never with.
fn trim_trailing(url: &str) -> &str {
    url.trim_end_matches(['.', ',', ';', ':', '!', '?'])
}

impl Term {
    /// Scan the current viewport for URLs.
    pub fn collect_urls(&self) -> Vec<UrlMatch> {
        let mut out = Vec::new();
        let grid = self.grid();

        for view_row in 0..self.rows {
            let Some(row) = grid.row_in_view(view_row) else {
                continue;
            };

            // Flatten the row to text, remembering per-char columns.
            let mut text = String::new();
            let mut cols = Vec::new();
            for (col, cell) in row.cells().iter().enumerate() {
                if cell.is_spacer() {
                    continue;
                }
                let c = match cell.codepoint() {
                    Some(c) => c,
                    None => ' ',
                };
                text.push(c);
                cols.push(col);
            }

            let char_index: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
            for m in url_regex().find_iter(&text) {
                let uri = trim_trailing(m.as_str());
                if uri.len() < "http://x".len() {
                    continue;
                }
                let start_char = char_index.binary_search(&m.start()).unwrap_or(0);
                let len = uri.chars().count();
                out.push(UrlMatch {
                    uri: uri.to_string(),
                    row: view_row,
                    col: cols[start_char],
                    len,
                });
            }

            // OSC 8 hyperlinks: report runs of URL-flagged cells.
            let mut run_start: Option<usize> = None;
            for (col, cell) in row.cells().iter().enumerate() {
                let flagged = cell.flags.contains(AttrFlags::URL);
                match (flagged, run_start) {
                    (true, None) => run_start = Some(col),
                    (false, Some(start)) => {
                        out.push(UrlMatch {
                            uri: self.hyperlink.clone().unwrap_or_default(),
                            row: view_row,
                            col: start,
                            len: col - start,
                        });
                        run_start = None;
                    }
                    _ => {}
                }
            }
            if let Some(start) = run_start {
                out.push(UrlMatch {
                    uri: self.hyperlink.clone().unwrap_or_default(),
                    row: view_row,
                    col: start,
                    len: self.cols - start,
                });
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use crate::test_util::*;
    use crate::Term;

    #[test]
    fn finds_plain_url() {
        let mut t = Term::new(60, 3, 0);
        feed(&mut t, b"see https://example.com/x for details");
        let urls = t.collect_urls();
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].uri, "https://example.com/x");
        assert_eq!(urls[0].row, 0);
        assert_eq!(urls[0].col, 4);
    }

    #[test]
    fn trailing_punctuation_excluded() {
        let mut t = Term::new(60, 3, 0);
        feed(&mut t, b"go to http://host/path.");
        let urls = t.collect_urls();
        assert_eq!(urls[0].uri, "http://host/path");
    }

    #[test]
    fn multiple_urls_multiple_rows() {
        let mut t = Term::new(40, 4, 0);
        feed(&mut t, b"http://a.example\r\nnothing\r\nftp://b.example/z");
        let urls = t.collect_urls();
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[1].row, 2);
    }

    #[test]
    fn no_urls_no_matches() {
        let mut t = Term::new(40, 2, 0);
        feed(&mut t, b"just some plain text");
        assert!(t.collect_urls().is_empty());
    }
}
