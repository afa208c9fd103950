use std::fmt::Write as _;

/// HTML table collecting one image per (system, processor) combination. Rows are systems,
/// columns are processors. Titles are only written when a header was asked for.
#[derive(Debug, Default)]
pub(crate) struct Grid {
    header: Option<Vec<String>>,
    rows: Vec<(String, Vec<String>)>,
}

impl Grid {
    pub(crate) fn new(header: bool) -> Self {
        Self {
            header: header.then(Vec::new),
            rows: Vec::new(),
        }
    }

    /// Records a processor column title. Only the first row's titles are kept.
    pub(crate) fn column(&mut self, title: &str) {
        if self.rows.len() > 1 {
            return;
        }
        if let Some(header) = self.header.as_mut() {
            header.push(title.to_string());
        }
    }

    pub(crate) fn start_row(&mut self, title: &str) {
        self.rows.push((title.to_string(), Vec::new()));
    }

    /// Adds a cell to the current row. `content` is inlined as is (an SVG document, or empty).
    pub(crate) fn cell(&mut self, content: &str) {
        if let Some((_, cells)) = self.rows.last_mut() {
            cells.push(content.to_string());
        }
    }

    pub(crate) fn finish(self) -> String {
        let mut out = String::from("<table class='archix-table'>\n");
        if let Some(header) = &self.header {
            out.push_str("<tr><th></th>");
            for title in header {
                let _ = write!(&mut out, "<th>{title}</th>");
            }
            out.push_str("</tr>\n");
        }
        for (title, cells) in &self.rows {
            out.push_str("<tr>");
            if self.header.is_some() {
                let _ = write!(&mut out, "<th>{title}</th>");
            }
            for cell in cells {
                let _ = write!(&mut out, "<td>{cell}</td>");
            }
            out.push_str("</tr>\n");
        }
        out.push_str("</table>");
        out
    }
}
