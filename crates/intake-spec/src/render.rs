use time::UtcOffset;
use time::macros::format_description;

use crate::answers::AnswerValue;
use crate::spec::catalog::StepCatalog;
use crate::spec::step::StepDefinition;
use crate::submission::Submission;

pub const OTHER_FIELDS_HEADING: &str = "Other Fields";

const MIN_LINE_WIDTH: usize = 40;
const MIN_LINES_PER_PAGE: usize = 10;
const FOOTER_LINES: usize = 2;

/// Page geometry for [`render_report`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportLayout {
    pub line_width: usize,
    pub lines_per_page: usize,
    pub label_width: usize,
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self {
            line_width: 90,
            lines_per_page: 60,
            label_width: 28,
        }
    }
}

impl ReportLayout {
    pub fn new(line_width: usize, lines_per_page: usize) -> Self {
        Self {
            line_width,
            lines_per_page,
            ..Self::default()
        }
        .normalized()
    }

    /// Clamps the geometry to something that can hold a label and a value.
    pub fn normalized(self) -> Self {
        let line_width = self.line_width.max(MIN_LINE_WIDTH);
        Self {
            line_width,
            lines_per_page: self.lines_per_page.max(MIN_LINES_PER_PAGE),
            label_width: self.label_width.clamp(8, line_width / 2),
        }
    }

    fn body_lines(&self) -> usize {
        self.lines_per_page - FOOTER_LINES
    }
}

/// Paginated plain-text report of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pages: Vec<Vec<String>>,
}

impl Report {
    pub fn pages(&self) -> &[Vec<String>] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn to_text(&self) -> String {
        self.pages
            .iter()
            .map(|page| page.join("\n"))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Pages separated by form feeds, ready to hand to a printer or attachment.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.pages
            .iter()
            .map(|page| page.join("\n"))
            .collect::<Vec<_>>()
            .join("\n\x0c")
            .into_bytes()
    }
}

struct Line {
    text: String,
    keep_with_next: bool,
}

impl Line {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keep_with_next: false,
        }
    }

    fn sticky(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keep_with_next: true,
        }
    }
}

/// Renders a submission grouped by category, in catalog order.
///
/// Answers whose step has no category, or whose field the catalog does not
/// know, are listed under [`OTHER_FIELDS_HEADING`].
pub fn render_report(catalog: &StepCatalog, submission: &Submission, layout: &ReportLayout) -> Report {
    let layout = layout.normalized();
    let mut lines = header_lines(catalog, submission, &layout);
    let answers = submission.answers();

    for category in catalog.categories() {
        let entries: Vec<(&StepDefinition, &AnswerValue)> = catalog
            .list_all()
            .iter()
            .filter(|step| step.category.as_deref() == Some(category))
            .filter_map(|step| answers.get(&step.field).map(|value| (step, value)))
            .collect();
        if entries.is_empty() {
            continue;
        }
        push_heading(&mut lines, category);
        for (step, value) in entries {
            push_entry(&mut lines, &field_label(&step.field), &display_value(Some(step), value), &layout);
        }
    }

    let others: Vec<(String, String)> = answers
        .iter()
        .filter_map(|(field, value)| match catalog.step_for_field(field) {
            Some(step) if step.category.is_some() => None,
            step => Some((field_label(field), display_value(step, value))),
        })
        .collect();
    if !others.is_empty() {
        push_heading(&mut lines, OTHER_FIELDS_HEADING);
        for (label, value) in others {
            push_entry(&mut lines, &label, &value, &layout);
        }
    }

    let pages = paginate(lines, layout.body_lines());
    tracing::debug!(
        submission = %submission.id(),
        pages = pages.len(),
        "rendered submission report"
    );
    Report { pages }
}

fn header_lines(catalog: &StepCatalog, submission: &Submission, layout: &ReportLayout) -> Vec<Line> {
    let mut lines = Vec::new();
    for title_line in wrap(catalog.title(), layout.line_width) {
        lines.push(Line::plain(title_line));
    }
    lines.push(Line::plain("=".repeat(catalog.title().chars().count().min(layout.line_width))));
    lines.push(Line::plain(format!("Submission ID: {}", submission.id())));
    lines.push(Line::plain(format!("Date: {}", format_date(submission))));
    lines.push(Line::plain(format!("Version: {}", submission.version())));
    lines.push(Line::plain(format!(
        "Catalog: {} v{}",
        submission.catalog_id(),
        submission.catalog_version()
    )));
    lines
}

fn push_heading(lines: &mut Vec<Line>, heading: &str) {
    lines.push(Line::sticky(""));
    lines.push(Line::sticky(heading));
    lines.push(Line::sticky("-".repeat(heading.chars().count())));
}

fn push_entry(lines: &mut Vec<Line>, label: &str, value: &str, layout: &ReportLayout) {
    let indent = " ".repeat(layout.label_width + 1);
    let value_width = layout.line_width - layout.label_width - 1;
    let prefix = format!("{label}:");

    let wrapped = wrap(value, value_width);
    if prefix.chars().count() > layout.label_width {
        // Long labels get a line of their own.
        for label_line in wrap(&prefix, layout.line_width) {
            lines.push(Line::plain(label_line));
        }
        for value_line in wrapped {
            lines.push(Line::plain(format!("{indent}{value_line}").trim_end().to_string()));
        }
        return;
    }

    let mut values = wrapped.into_iter();
    let first = values.next().unwrap_or_default();
    lines.push(Line::plain(
        format!("{prefix:<width$} {first}", width = layout.label_width)
            .trim_end()
            .to_string(),
    ));
    for value_line in values {
        lines.push(Line::plain(format!("{indent}{value_line}").trim_end().to_string()));
    }
}

fn paginate(lines: Vec<Line>, capacity: usize) -> Vec<Vec<String>> {
    let mut pages: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut idx = 0;

    while idx < lines.len() {
        let mut group_end = idx;
        while group_end < lines.len() && lines[group_end].keep_with_next {
            group_end += 1;
        }
        let group_end = (group_end + 1).min(lines.len());
        let group_len = group_end - idx;
        if !current.is_empty() && current.len() + group_len > capacity && group_len <= capacity {
            pages.push(std::mem::take(&mut current));
        }
        for line in &lines[idx..group_end] {
            if current.len() == capacity {
                pages.push(std::mem::take(&mut current));
            }
            if current.is_empty() && !pages.is_empty() && line.text.is_empty() {
                continue;
            }
            current.push(line.text.clone());
        }
        idx = group_end;
    }
    if !current.is_empty() || pages.is_empty() {
        pages.push(current);
    }

    let total = pages.len();
    for (number, page) in pages.iter_mut().enumerate() {
        page.push(String::new());
        page.push(format!("Page {} of {}", number + 1, total));
    }
    pages
}

/// Greedy word wrap. Words longer than `width` are split; embedded newlines are kept.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_len = 0;
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while !word.is_empty() {
                let gap = usize::from(line_len > 0);
                if line_len + gap + word.len() <= width {
                    if gap == 1 {
                        line.push(' ');
                    }
                    line.extend(word.iter());
                    line_len += gap + word.len();
                    break;
                }
                if line_len > 0 {
                    out.push(std::mem::take(&mut line));
                    line_len = 0;
                    continue;
                }
                let rest = word.split_off(width);
                line.extend(word.iter());
                out.push(std::mem::take(&mut line));
                word = rest;
            }
        }
        out.push(line);
    }
    out
}

fn field_label(field: &str) -> String {
    field.replace('_', " ")
}

fn display_value(step: Option<&StepDefinition>, value: &AnswerValue) -> String {
    match value {
        AnswerValue::Choice(_) => match step {
            Some(step) => step.display_value(value),
            None => value.to_string(),
        },
        AnswerValue::Text(text) if text.trim().is_empty() => "N/A".to_string(),
        AnswerValue::Text(text) => text.clone(),
        AnswerValue::Number(number) => number.to_string(),
        AnswerValue::Flag(true) => "Yes".to_string(),
        AnswerValue::Flag(false) => "No".to_string(),
        AnswerValue::Files(files) if files.is_empty() => "None".to_string(),
        AnswerValue::Files(files) => {
            let names = files
                .iter()
                .map(|file| file.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            format!("{} file(s): {names}", files.len())
        }
        AnswerValue::Links(links) if links.is_empty() => "None".to_string(),
        AnswerValue::Links(links) => links.join(", "),
    }
}

fn format_date(submission: &Submission) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second] UTC");
    let at = submission.submitted_at().to_offset(UtcOffset::UTC);
    at.format(&format).unwrap_or_else(|_| at.to_string())
}
