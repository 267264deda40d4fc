//! Shared fixtures for integration tests: a minimal PDF writer that
//! produces files with correct cross-reference offsets.

/// Append `content` as object `number`, returning its byte offset.
fn push_object(body: &mut Vec<u8>, number: u32, content: &[u8]) -> usize {
    let pos = body.len();
    body.extend_from_slice(format!("{number} 0 obj\n").as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(b"\nendobj\n");
    pos
}

/// Assemble a classic-xref file from numbered objects. `trailer_extra`
/// is spliced into the trailer dictionary verbatim.
pub fn assemble(objects: &[(u32, Vec<u8>)], trailer_extra: &str) -> Vec<u8> {
    let mut body = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (number, content) in objects {
        offsets.push((*number, push_object(&mut body, *number, content)));
    }
    let xref_pos = body.len();
    body.extend_from_slice(b"xref\n");
    body.extend_from_slice(b"0 1\n0000000000 65535 f \n");
    for (number, offset) in &offsets {
        body.extend_from_slice(format!("{number} 1\n{offset:010} 00000 n \n").as_bytes());
    }
    let size = objects.iter().map(|(n, _)| n + 1).max().unwrap_or(1);
    body.extend_from_slice(
        format!("trailer\n<< /Size {size} /Root 1 0 R {trailer_extra} >>\n").as_bytes(),
    );
    body.extend_from_slice(format!("startxref\n{xref_pos}\n%%EOF\n").as_bytes());
    body
}

/// Assemble the same objects behind a cross-reference stream instead of
/// a classic table. Objects must be numbered 1..=N; the stream itself
/// takes N+1.
pub fn assemble_with_xref_stream(objects: &[(u32, Vec<u8>)]) -> Vec<u8> {
    let mut body = b"%PDF-1.5\n".to_vec();
    let mut offsets = Vec::new();
    for (number, content) in objects {
        offsets.push(push_object(&mut body, *number, content));
    }
    let stream_number = objects.len() as u32 + 1;
    let xref_pos = body.len();
    let size = stream_number + 1;

    // W [1 4 2]: entry type, offset, generation, big-endian.
    let mut rows: Vec<u8> = Vec::new();
    push_row(&mut rows, 0, 0, 0xFFFF);
    for offset in &offsets {
        push_row(&mut rows, 1, *offset as u32, 0);
    }
    push_row(&mut rows, 1, xref_pos as u32, 0);

    body.extend_from_slice(
        format!(
            "{stream_number} 0 obj\n<< /Type /XRef /Size {size} /Index [0 {size}] \
             /W [1 4 2] /Root 1 0 R /Length {} >>\nstream\n",
            rows.len()
        )
        .as_bytes(),
    );
    body.extend_from_slice(&rows);
    body.extend_from_slice(b"\nendstream\nendobj\n");
    body.extend_from_slice(format!("startxref\n{xref_pos}\n%%EOF\n").as_bytes());
    body
}

fn push_row(rows: &mut Vec<u8>, kind: u8, second: u32, third: u16) {
    rows.push(kind);
    rows.extend_from_slice(&second.to_be_bytes());
    rows.extend_from_slice(&third.to_be_bytes());
}

fn content_stream(text: &str) -> Vec<u8> {
    format!("<< /Length {} >>\nstream\n{}\nendstream", text.len(), text).into_bytes()
}

/// Object set for a document with one page per content stream and a
/// shared Helvetica font. Numbering: 1 catalog, 2 page tree, then a
/// page/content pair per stream, font last.
pub fn page_objects(streams: &[&str]) -> Vec<(u32, Vec<u8>)> {
    let n = streams.len() as u32;
    let font_number = 3 + 2 * n;
    let kids: Vec<String> = (0..n).map(|i| format!("{} 0 R", 3 + 2 * i)).collect();

    let mut objects: Vec<(u32, Vec<u8>)> = vec![
        (1, b"<< /Type /Catalog /Pages 2 0 R >>".to_vec()),
        (
            2,
            format!(
                "<< /Type /Pages /Kids [{}] /Count {n} >>",
                kids.join(" ")
            )
            .into_bytes(),
        ),
    ];
    for (i, stream) in streams.iter().enumerate() {
        let page_number = 3 + 2 * i as u32;
        let content_number = page_number + 1;
        objects.push((
            page_number,
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Resources << /Font << /F1 {font_number} 0 R >> >> \
                 /Contents {content_number} 0 R >>"
            )
            .into_bytes(),
        ));
        objects.push((content_number, content_stream(stream)));
    }
    objects.push((
        font_number,
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_vec(),
    ));
    objects
}

/// A complete classic-xref document, one page per content stream.
pub fn document_with_pages(streams: &[&str]) -> Vec<u8> {
    assemble(&page_objects(streams), "")
}

/// A heading over two body segments: the title is the only 24pt item,
/// the body's two kerned segments make 12pt the modal height.
pub const TITLE_AND_BODY: &str = "BT /F1 24 Tf 72 720 Td (Title) Tj ET\n\
     BT /F1 12 Tf 72 680 Td [(Body ) -20 (text.)] TJ ET";
