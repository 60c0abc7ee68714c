use chrono::Utc;
use std::io;
use std::path::{ Path, PathBuf };

/// Newline/bold/italic-only markdown flattening, enough for the export
/// layout. Full markdown rendering stays with the chat view's renderer.
fn format_text(text: &str) -> String {
    let mut out = text.replace('\n', "<br>");
    out = replace_delimited(&out, "**", "<b>", "</b>");
    out = replace_delimited(&out, "*", "<i>", "</i>");
    out
}

/// Replace paired occurrences of `delim` with open/close tags. An
/// unpaired trailing delimiter is left untouched.
fn replace_delimited(text: &str, delim: &str, open: &str, close: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        let Some(start) = rest.find(delim) else {
            out.push_str(rest);
            return out;
        };
        let after = &rest[start + delim.len()..];
        let Some(end) = after.find(delim) else {
            out.push_str(rest);
            return out;
        };
        out.push_str(&rest[..start]);
        out.push_str(open);
        out.push_str(&after[..end]);
        out.push_str(close);
        rest = &after[end + delim.len()..];
    }
}

/// Build the standalone Q&A export document.
pub fn export_html(question: &str, answer: &str) -> String {
    format!(
        concat!(
            "<html><head><meta charset='utf-8'></head><body>",
            "<div style=\"font-family: sans-serif; color: #000; padding: 20px; background: #fff;\">",
            "<h2 style=\"color: #6b21a8; border-bottom: 1px solid #e5e5e5; padding-bottom: 10px;\">NeuralNotes Q&amp;A</h2>",
            "<h4 style=\"color: #333; margin-top: 20px;\">Question:</h4>",
            "<div style=\"background: #f9f9f9; padding: 10px; border-radius: 5px; margin-bottom: 20px;\">{question}</div>",
            "<h4 style=\"color: #6b21a8;\">Answer:</h4>",
            "<div style=\"background: #faf5ff; padding: 10px; border-radius: 5px;\">{answer}</div>",
            "</div></body></html>"
        ),
        question = format_text(question),
        answer = format_text(answer)
    )
}

/// Write one Q&A pair to `NeuralNotes_QnA_<epoch-ms>.html` inside
/// `dir` and return the path.
pub fn export_to_file(dir: &Path, question: &str, answer: &str) -> io::Result<PathBuf> {
    let filename = format!("NeuralNotes_QnA_{}.html", Utc::now().timestamp_millis());
    let path = dir.join(filename);
    std::fs::write(&path, export_html(question, answer))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_newlines_bold_and_italic() {
        let html = format_text("line one\n**bold** and *lean*");
        assert_eq!(html, "line one<br><b>bold</b> and <i>lean</i>");
    }

    #[test]
    fn unpaired_markers_are_left_alone() {
        assert_eq!(format_text("2 * 3 = 6"), "2 * 3 = 6");
    }

    #[test]
    fn export_document_carries_both_sides() {
        let html = export_html("What is an acid?", "A **proton** donor.");
        assert!(html.contains("What is an acid?"));
        assert!(html.contains("<b>proton</b> donor"));
        assert!(html.contains("NeuralNotes Q&amp;A"));
    }

    #[test]
    fn export_writes_a_timestamped_html_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_to_file(dir.path(), "Q", "A").unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("NeuralNotes_QnA_"));
        assert!(name.ends_with(".html"));
        assert!(std::fs::read_to_string(&path).unwrap().contains("Answer:"));
    }
}
