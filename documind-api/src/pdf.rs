//! Minimal single-page PDF writer
//!
//! Used when no PDF vendor is configured. Text is set in Helvetica, long lines are
//! wrapped and anything past one page is cut off.

const PAGE_WIDTH: u32 = 612;
const PAGE_HEIGHT: u32 = 792;
const MARGIN: u32 = 72;
const TITLE_SIZE: u32 = 18;
const BODY_SIZE: u32 = 11;
const LEADING: u32 = 15;
const WRAP_COLUMNS: usize = 88;

/// Build a PDF with a title line and body lines
pub fn simple_pdf(title: &str, lines: &[String]) -> Vec<u8> {
    let max_lines = ((PAGE_HEIGHT - 2 * MARGIN - 2 * LEADING) / LEADING) as usize;
    let body: Vec<String> = lines
        .iter()
        .flat_map(|line| wrap(line, WRAP_COLUMNS))
        .take(max_lines)
        .collect();

    let mut stream = String::new();
    stream.push_str(&format!(
        "BT /F1 {} Tf {} {} Td ({}) Tj ET\n",
        TITLE_SIZE,
        MARGIN,
        PAGE_HEIGHT - MARGIN,
        escape(title)
    ));
    stream.push_str(&format!(
        "BT /F1 {} Tf {} TL {} {} Td\n",
        BODY_SIZE,
        LEADING,
        MARGIN,
        PAGE_HEIGHT - MARGIN - 2 * LEADING
    ));
    for line in &body {
        stream.push_str(&format!("({}) Tj T*\n", escape(line)));
    }
    stream.push_str("ET\n");

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>",
            PAGE_WIDTH, PAGE_HEIGHT
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        format!("<< /Length {} >>\nstream\n{}endstream", stream.len(), stream),
    ];

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, object) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, object));
    }

    let xref_offset = out.len();
    out.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
    // Each xref entry is exactly 20 bytes including the line ending
    out.push_str("0000000000 65535 f \n");
    for offset in offsets {
        out.push_str(&format!("{:010} 00000 n \n", offset));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    ));

    out.into_bytes()
}

/// Escape a string literal; non-ASCII becomes `?` since only the standard encoding is used
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            c if c.is_ascii() && !c.is_ascii_control() => escaped.push(c),
            _ => escaped.push('?'),
        }
    }
    escaped
}

fn wrap(line: &str, columns: usize) -> Vec<String> {
    if line.trim().is_empty() {
        return vec![String::new()];
    }

    let mut wrapped = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > columns {
            wrapped.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        wrapped.push(current);
    }
    wrapped
}
