use std::{borrow::Cow, fmt::Write};

const CELL_PADDING: usize = 1;
const MIN_COLUMN_WIDTH: usize = 3;
const SECTION_SPACING: &str = "\n\n";

/// Builds a pipe-delimited plain-text table.
#[derive(Default)]
pub struct TextTableBuilder<'a, Seq> {
    headers: &'a [Cow<'a, str>],
    rows: Vec<Seq>,
    alignments: Cow<'a, [Alignment]>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Alignment {
    #[default]
    Left,
    Right,
}

impl<'a, Seq> TextTableBuilder<'a, Seq>
where
    Seq: AsRef<[Cow<'a, str>]> + Default,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alignments(mut self, alignments: &'a [Alignment]) -> Self {
        self.alignments = Cow::Borrowed(alignments);
        self
    }

    pub fn headers(mut self, headers: &'a [Cow<'a, str>]) -> Self {
        self.headers = headers;
        if self.alignments.is_empty() {
            self.alignments = Cow::Owned(vec![Alignment::default(); self.headers.len()]);
        }
        self
    }

    pub fn row(mut self, row: Seq) -> Self {
        self.rows.push(row);
        self
    }

    pub fn build(self) -> String {
        let col_count = self.headers.len();
        if col_count == 0 {
            return String::new();
        }

        let mut col_widths: Vec<usize> = self
            .headers
            .iter()
            .map(|h| display_width(h).max(MIN_COLUMN_WIDTH))
            .collect();
        for row in &self.rows {
            for (i, cell) in row.as_ref().iter().enumerate().take(col_count) {
                col_widths[i] = col_widths[i].max(display_width(cell));
            }
        }

        let alignment_of = |i: usize| self.alignments.get(i).copied().unwrap_or_default();
        let mut table = String::with_capacity(64 * (self.rows.len() + 2));

        write_line(&mut table, self.headers, &col_widths, alignment_of);

        table.push('|');
        for (i, width) in col_widths.iter().enumerate() {
            let dashes = "-".repeat(*width + CELL_PADDING * 2 - 2);
            let _ = match alignment_of(i) {
                Alignment::Left => write!(&mut table, ":{dashes}-|"),
                Alignment::Right => write!(&mut table, "-{dashes}:|"),
            };
        }
        table.push('\n');

        for row in &self.rows {
            write_line(&mut table, row.as_ref(), &col_widths, alignment_of);
        }

        table
    }
}

fn write_line(
    out: &mut String,
    cells: &[Cow<'_, str>],
    col_widths: &[usize],
    alignment_of: impl Fn(usize) -> Alignment,
) {
    out.push('|');
    for (i, width) in col_widths.iter().enumerate() {
        let cell = cells.get(i).map_or("", |cell| cell.as_ref());
        let cell = sanitize_cell(cell);
        let gap = width.saturating_sub(display_width(&cell));
        let (left, right) = match alignment_of(i) {
            Alignment::Left => (0, gap),
            Alignment::Right => (gap, 0),
        };
        let pad = " ".repeat(CELL_PADDING);
        let _ = write!(
            out,
            "{pad}{}{cell}{}{pad}|",
            " ".repeat(left),
            " ".repeat(right)
        );
    }
    out.push('\n');
}

/// Terminal columns taken by `text`; wide (non-ASCII) characters count double.
fn display_width(text: &str) -> usize {
    text.chars().map(|c| if c.is_ascii() { 1 } else { 2 }).sum()
}

fn sanitize_cell(s: &str) -> Cow<'_, str> {
    if !s.contains(['|', '\n', '\r']) {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len() + 4);
    for c in s.chars() {
        match c {
            '|' => result.push_str("\\|"),
            '\n' | '\r' => result.push(' '),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Joins rendered sections with a blank line between them.
pub fn combine_sections(sections: &[&str]) -> Option<String> {
    let sections: Vec<&str> = sections
        .iter()
        .map(|section| section.trim_end_matches('\n'))
        .filter(|section| !section.is_empty())
        .collect();
    if sections.is_empty() {
        return None;
    }

    let mut combined = sections.join(SECTION_SPACING);
    combined.push('\n');
    Some(combined)
}
