use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvError {
    UnterminatedQuote { line: usize },
    Empty,
}

impl fmt::Display for CsvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CsvError::UnterminatedQuote { line } => {
                write!(f, "unterminated quoted field starting on line {}", line)
            }
            CsvError::Empty => write!(f, "CSV input has no header row"),
        }
    }
}

impl Error for CsvError {}

/// One parsed row and the physical line it started on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    pub line: usize,
    pub fields: Vec<String>,
}

pub fn escape_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn push_row<I, S>(out: &mut String, fields: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let line = fields
        .into_iter()
        .map(|field| escape_field(field.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&line);
    out.push('\n');
}

/// Splits `input` into rows, honouring quoted fields.
///
/// Accepts LF or CRLF endings, newlines inside quotes, and a leading BOM.
/// Blank lines are skipped.
pub fn parse(input: &str) -> Result<Vec<CsvRow>, CsvError> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut rows = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut row_line = 1;
    let mut quote_line = 1;
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(ch);
                }
                _ => field.push(ch),
            }
            continue;
        }

        match ch {
            '"' => {
                in_quotes = true;
                quote_line = line;
            }
            ',' => fields.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                fields.push(std::mem::take(&mut field));
                finish_row(&mut rows, std::mem::take(&mut fields), row_line);
                line += 1;
                row_line = line;
            }
            _ => field.push(ch),
        }
    }

    if in_quotes {
        return Err(CsvError::UnterminatedQuote { line: quote_line });
    }
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        finish_row(&mut rows, fields, row_line);
    }
    Ok(rows)
}

fn finish_row(rows: &mut Vec<CsvRow>, fields: Vec<String>, line: usize) {
    let blank = fields.len() == 1 && fields[0].trim().is_empty();
    if !blank {
        rows.push(CsvRow { line, fields });
    }
}

/// First row as the header, remaining rows as data.
pub fn parse_with_header(input: &str) -> Result<(Vec<String>, Vec<CsvRow>), CsvError> {
    let mut rows = parse(input)?.into_iter();
    let header = rows.next().ok_or(CsvError::Empty)?;
    let header = header
        .fields
        .into_iter()
        .map(|cell| cell.trim().to_string())
        .collect();
    Ok((header, rows.collect()))
}
