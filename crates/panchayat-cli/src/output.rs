//! Plain-text rendering of API results.

use panchayat_core::{announcement::Announcement, document::DocumentRequest};
use serde_json::Value;

use crate::client::PerformanceReport;

const DATE: &str = "%Y-%m-%d";

/// Left-aligned columns separated by two spaces, with a header row.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
  let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
  for row in rows {
    for (w, cell) in widths.iter_mut().zip(row) {
      *w = (*w).max(cell.chars().count());
    }
  }

  let mut out = line(headers.iter().copied(), &widths);
  for row in rows {
    out.push_str(&line(row.iter().map(String::as_str), &widths));
  }
  out
}

fn line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
  let padded: Vec<String> = cells
    .zip(widths)
    .map(|(c, &w)| format!("{c:<w$}"))
    .collect();
  let mut line = padded.join("  ").trim_end().to_owned();
  line.push('\n');
  line
}

fn or_dash(s: Option<&str>) -> String { s.filter(|s| !s.is_empty()).unwrap_or("-").to_owned() }

pub fn documents(docs: &[DocumentRequest]) -> String {
  if docs.is_empty() {
    return "No document requests.\n".to_owned();
  }
  let rows: Vec<Vec<String>> = docs
    .iter()
    .map(|d| {
      vec![
        d.id.to_string(),
        d.document_type.title(),
        d.status.to_string(),
        or_dash(d.requester_name.as_deref()),
        d.created_at.format(DATE).to_string(),
        d.purpose.clone(),
      ]
    })
    .collect();
  table(&["ID", "TYPE", "STATUS", "REQUESTER", "SUBMITTED", "PURPOSE"], &rows)
}

/// Field-per-line view of one request.
pub fn document(doc: &DocumentRequest) -> String {
  let mut fields: Vec<(&str, String)> = vec![
    ("ID", doc.id.to_string()),
    ("Type", doc.document_type.title()),
    ("Status", doc.status.to_string()),
    ("Requester", or_dash(doc.requester_name.as_deref())),
    ("Purpose", doc.purpose.clone()),
    ("Submitted", doc.created_at.format("%Y-%m-%d %H:%M").to_string()),
    ("Updated", doc.updated_at.format("%Y-%m-%d %H:%M").to_string()),
  ];
  if doc.verified_by.is_some() {
    fields.push(("Verified by", or_dash(doc.verified_by_name.as_deref())));
  }
  if doc.approved_by.is_some() {
    fields.push(("Approved by", or_dash(doc.approved_by_name.as_deref())));
  }
  if let Some(reason) = &doc.rejection_reason {
    fields.push(("Rejected", reason.clone()));
  }
  if let Some(notes) = &doc.additional_notes {
    fields.push(("Notes", notes.clone()));
  }
  for (key, value) in &doc.form_details {
    let value = match value {
      Value::String(s) => s.clone(),
      other => other.to_string(),
    };
    fields.push((key.as_str(), value));
  }
  for url in &doc.attachments {
    fields.push(("Attachment", url.clone()));
  }

  let width = fields.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
  fields
    .iter()
    .map(|(k, v)| format!("{:<width$}  {v}\n", format!("{k}:"), width = width + 1))
    .collect()
}

pub fn announcements(items: &[Announcement]) -> String {
  if items.is_empty() {
    return "No announcements.\n".to_owned();
  }
  let mut out = String::new();
  for a in items {
    let flag = if a.important { " [important]" } else { "" };
    out.push_str(&format!("{}  {}  {}{flag}\n", a.date.format(DATE), a.category, a.title));
    out.push_str(&format!("    {}\n", a.preview()));
  }
  out
}

pub fn performance(report: &PerformanceReport) -> String {
  let mut out = String::new();
  if let Some(error) = &report.error {
    out.push_str(&format!("warning: last refresh failed ({error}); showing earlier figures\n"));
  }
  if report.staff.is_empty() {
    out.push_str("No staff members.\n");
    return out;
  }
  let rows: Vec<Vec<String>> = report
    .staff
    .iter()
    .map(|p| {
      vec![
        p.staff_name.clone(),
        p.complaints_resolved.to_string(),
        p.documents_reviewed.to_string(),
        p.documents_approved.to_string(),
        p.last_active.format(DATE).to_string(),
      ]
    })
    .collect();
  out.push_str(&table(&["NAME", "RESOLVED", "REVIEWED", "APPROVED", "LAST ACTIVE"], &rows));
  out
}
