//! Fixed-layout certificate renderer. Produces a single-page PDF from the
//! completion fields; callers treat the layout as opaque.

pub struct CertificateFields<'a> {
    pub holder_name: &'a str,
    pub course_title: &'a str,
    pub issuer: &'a str,
    pub issued_on: &'a str,
}

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;

/// Literal strings in a content stream must escape backslash and parens.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            _ => out.push(ch),
        }
    }
    out
}

fn text_line(font: &str, size: u32, y: f32, text: &str) -> String {
    // Roughly centered: Helvetica glyphs average about half the point size.
    let approx_width = text.chars().count() as f32 * size as f32 * 0.5;
    let x = ((PAGE_WIDTH - approx_width) / 2.0).max(36.0);
    format!(
        "BT /{} {} Tf {:.1} {:.1} Td ({}) Tj ET\n",
        font,
        size,
        x,
        y,
        escape_text(text)
    )
}

pub fn render(fields: &CertificateFields<'_>) -> Vec<u8> {
    let issued_line = format!("Issued by {} on {}", fields.issuer, fields.issued_on);

    let mut content = String::new();
    content.push_str(&text_line("F2", 24, PAGE_HEIGHT - 150.0, "Certificate of Completion"));
    content.push_str(&text_line("F1", 14, PAGE_HEIGHT - 200.0, "This certifies that"));
    content.push_str(&text_line("F2", 18, PAGE_HEIGHT - 230.0, fields.holder_name));
    content.push_str(&text_line(
        "F1",
        14,
        PAGE_HEIGHT - 260.0,
        "has successfully completed the course",
    ));
    content.push_str(&text_line("F2", 18, PAGE_HEIGHT - 290.0, fields.course_title));
    content.push_str(&text_line("F1", 12, PAGE_HEIGHT - 330.0, &issued_line));

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
             /Resources << /Font << /F1 5 0 R /F2 6 0 R >> >> /Contents 4 0 R >>",
            PAGE_WIDTH as u32, PAGE_HEIGHT as u32
        ),
        format!(
            "<< /Length {} >>\nstream\n{}endstream",
            content.len(),
            content
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold >>".to_string(),
    ];

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{}\nendobj\n", index + 1, body));
    }

    let xref_offset = out.len();
    out.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
    out.push_str("0000000000 65535 f \n");
    for offset in &offsets {
        out.push_str(&format!("{:010} 00000 n \n", offset));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    ));

    out.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<u8> {
        render(&CertificateFields {
            holder_name: "Ada Lovelace",
            course_title: "Analytical Engines 101",
            issuer: "EduTrack",
            issued_on: "2026-08-06",
        })
    }

    #[test]
    fn output_is_a_pdf_document() {
        let bytes = sample();
        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(bytes.ends_with(b"%%EOF\n"));
    }

    #[test]
    fn output_carries_all_certificate_fields() {
        let text = String::from_utf8(sample()).unwrap();
        assert!(text.contains("(Ada Lovelace)"));
        assert!(text.contains("(Analytical Engines 101)"));
        assert!(text.contains("(Issued by EduTrack on 2026-08-06)"));
        assert!(text.contains("Certificate of Completion"));
    }

    #[test]
    fn parens_in_fields_are_escaped() {
        let bytes = render(&CertificateFields {
            holder_name: "A (B) \\C",
            course_title: "T",
            issuer: "I",
            issued_on: "2026-01-01",
        });
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("(A \\(B\\) \\\\C)"));
    }
}
