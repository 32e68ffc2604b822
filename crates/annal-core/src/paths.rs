//! Derived blob-storage paths.
//!
//! The path convention must be preserved exactly for interoperability with
//! the files already in storage:
//!
//! - question PDFs:  `pdfs/{sanitized-origin}/{sanitized-title}.{ext}`
//! - answer PDFs:    `pdfs/{sanitized-origin}/answer/{sanitized-title} answer.{ext}`

/// Strip every character that is not a letter, digit, space, hyphen, or
/// underscore, then trim surrounding whitespace.
pub fn sanitize_component(raw: &str) -> String {
  raw
    .chars()
    .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_'))
    .collect::<String>()
    .trim()
    .to_owned()
}

pub fn question_pdf_path(origin: &str, title: &str, extension: &str) -> String {
  format!(
    "pdfs/{}/{}.{}",
    sanitize_component(origin),
    sanitize_component(title),
    extension
  )
}

pub fn answer_pdf_path(origin: &str, title: &str, extension: &str) -> String {
  format!(
    "pdfs/{}/answer/{} answer.{}",
    sanitize_component(origin),
    sanitize_component(title),
    extension
  )
}
