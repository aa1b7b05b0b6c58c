use crate::ExportFormat;

/// Collapse every run of non-alphanumeric characters to one `_`, trimmed at both ends.
pub fn slug(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_gap = false;
    for c in title.chars() {
        if c.is_alphanumeric() {
            if pending_gap && !out.is_empty() {
                out.push('_');
            }
            pending_gap = false;
            out.push(c);
        } else {
            pending_gap = true;
        }
    }
    if out.is_empty() {
        "Untitled".to_string()
    } else {
        out
    }
}

/// `Report_<slug>.<ext>`
pub fn export_filename(title: &str, format: ExportFormat) -> String {
    format!("Report_{}.{}", slug(title), format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_runs() {
        assert_eq!(slug("Site visit -- Block A/2"), "Site_visit_Block_A_2");
        assert_eq!(slug("  ...Depot!!  "), "Depot");
        assert_eq!(slug("Über Straße"), "Über_Straße");
    }

    #[test]
    fn empty_title_gets_placeholder() {
        assert_eq!(export_filename("", ExportFormat::Pdf), "Report_Untitled.pdf");
        assert_eq!(export_filename("%%%", ExportFormat::Docx), "Report_Untitled.docx");
    }
}
