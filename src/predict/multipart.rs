//! Minimal `multipart/form-data` encoder for single-file uploads

use std::time::{SystemTime, UNIX_EPOCH};

pub(crate) struct MultipartForm {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartForm {
    pub(crate) fn new() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        Self::with_boundary(format!(
            "----fitcheck{:x}{:x}",
            nanos,
            std::process::id()
        ))
    }

    pub(crate) fn with_boundary(boundary: String) -> Self {
        Self {
            boundary,
            body: Vec::new(),
        }
    }

    pub(crate) fn add_file(&mut self, field: &str, file_name: &str, bytes: &[u8]) -> &mut Self {
        let header = format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            self.boundary,
            escape_quoted(field),
            escape_quoted(file_name),
            content_type_for(file_name),
        );
        self.body.extend_from_slice(header.as_bytes());
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Close the body. Returns the `Content-Type` header value and the bytes.
    pub(crate) fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.body,
        )
    }
}

/// Quoted-string value for a disposition parameter; quotes and line breaks are percent-encoded.
fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

pub(crate) fn content_type_for(file_name: &str) -> &'static str {
    let lower = file_name.to_ascii_lowercase();
    let ext = lower.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    match ext {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "heic" => "image/heic",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_single_file_field() {
        let mut form = MultipartForm::with_boundary("XYZ".to_string());
        form.add_file("file", "photo.PNG", b"abc");
        let (content_type, body) = form.finish();

        assert_eq!(content_type, "multipart/form-data; boundary=XYZ");
        let expected = "--XYZ\r\n\
            Content-Disposition: form-data; name=\"file\"; filename=\"photo.PNG\"\r\n\
            Content-Type: image/png\r\n\r\n\
            abc\r\n\
            --XYZ--\r\n";
        assert_eq!(String::from_utf8(body).unwrap(), expected);
    }

    #[test]
    fn quotes_in_file_name_are_escaped() {
        let mut form = MultipartForm::with_boundary("B".to_string());
        form.add_file("file", "we\"ird\n.jpg", b"");
        let (_, body) = form.finish();
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("filename=\"we%22ird%0A.jpg\""));
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type_for("a.JPEG"), "image/jpeg");
        assert_eq!(content_type_for("a.webp"), "image/webp");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }

    #[test]
    fn generated_boundaries_are_prefixed() {
        let (content_type, _) = MultipartForm::new().finish();
        assert!(content_type.starts_with("multipart/form-data; boundary=----fitcheck"));
    }
}
