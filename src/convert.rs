use crate::error::ApiError;
use crate::startup::AppState;
use axum::{
    extract::{Extension, Multipart, multipart::MultipartError},
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::IntoResponse,
};
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};
use uuid::Uuid;

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Runs an office suite headless to turn PDFs into DOCX files.
#[derive(Debug, Clone)]
pub struct Converter {
    program: String,
    timeout: Duration,
}

impl Converter {
    pub fn new(program: &str, timeout: Duration) -> Self {
        Self {
            program: program.to_string(),
            timeout,
        }
    }

    pub async fn pdf_to_docx(&self, pdf: &[u8]) -> Result<Vec<u8>, ApiError> {
        let workdir = std::env::temp_dir().join(format!("pdf2docx-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&workdir).await?;

        let result = self.run(&workdir, pdf).await;

        if let Err(e) = tokio::fs::remove_dir_all(&workdir).await {
            warn!("Failed to remove {}: {e}", workdir.display());
        }
        result
    }

    async fn run(&self, workdir: &Path, pdf: &[u8]) -> Result<Vec<u8>, ApiError> {
        let input = workdir.join("input.pdf");
        tokio::fs::write(&input, pdf).await?;

        // a private profile lets conversions run side by side
        let profile = format!(
            "-env:UserInstallation=file://{}",
            workdir.join("profile").display()
        );

        let mut cmd = Command::new(&self.program);
        cmd.arg(profile)
            .arg("--headless")
            .arg("--infilter=writer_pdf_import")
            .arg("--convert-to")
            .arg("docx")
            .arg("--outdir")
            .arg(workdir)
            .arg(&input)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Err(_) => {
                return Err(ApiError::ConversionFailed(format!(
                    "timed out after {}s",
                    self.timeout.as_secs()
                )));
            }
            Ok(Err(e)) => {
                return Err(ApiError::Internal(format!(
                    "failed to start {}: {e}",
                    self.program
                )));
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ApiError::ConversionFailed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        match tokio::fs::read(workdir.join("input.docx")).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ApiError::ConversionFailed(
                "converter produced no output".into(),
            )),
            Err(e) => Err(e.into()),
        }
    }
}

fn check_pdf(data: &[u8]) -> Result<(), ApiError> {
    if data.is_empty() {
        return Err(ApiError::InvalidRequest("uploaded file is empty".into()));
    }
    if !data.starts_with(PDF_MAGIC) {
        return Err(ApiError::InvalidRequest(
            "uploaded file is not a PDF".into(),
        ));
    }
    Ok(())
}

/// `report.pdf` becomes `report.docx`; anything unsafe for a header is dropped.
fn docx_file_name(upload_name: Option<&str>) -> String {
    let stem: String = upload_name
        .and_then(|name| Path::new(name).file_stem())
        .and_then(|stem| stem.to_str())
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ' ' | '.'))
        .collect();

    let stem = stem.trim();
    if stem.is_empty() {
        "converted.docx".to_string()
    } else {
        format!("{stem}.docx")
    }
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::InvalidRequest(e.body_text())
    }
}

/// Accepts a multipart upload with a `file` field and answers with the DOCX.
pub async fn pdf_to_word(
    Extension(app_state): Extension<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some("file") {
            let file_name = field.file_name().map(str::to_string);
            let data = field.bytes().await.map_err(multipart_error)?;
            upload = Some((file_name, data));
            break;
        }
    }

    let (file_name, data) =
        upload.ok_or_else(|| ApiError::InvalidRequest("missing 'file' field".into()))?;
    check_pdf(&data)?;

    let docx = app_state.converter.pdf_to_docx(&data).await?;
    let download_name = docx_file_name(file_name.as_deref());
    info!(
        input_bytes = data.len(),
        output_bytes = docx.len(),
        file = %download_name,
        "pdf converted"
    );

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, DOCX_MIME.to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{download_name}\""),
            ),
        ],
        docx,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_pdf() {
        assert!(check_pdf(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3").is_ok());
        assert!(check_pdf(b"").is_err());
        assert!(check_pdf(b"PK\x03\x04").is_err());
    }

    #[test]
    fn test_docx_file_name() {
        assert_eq!(docx_file_name(Some("report.pdf")), "report.docx");
        assert_eq!(
            docx_file_name(Some("dir/q3 \"final\".pdf")),
            "q3 final.docx"
        );
        assert_eq!(docx_file_name(Some("\u{7d04}.pdf")), "converted.docx");
        assert_eq!(docx_file_name(None), "converted.docx");
    }

    #[tokio::test]
    async fn test_missing_program_is_internal_error() {
        let converter = Converter::new("/nonexistent/office-suite-binary", Duration::from_secs(5));
        let err = converter.pdf_to_docx(b"%PDF-1.4").await.unwrap_err();
        assert!(matches!(err, ApiError::Internal(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_program_is_conversion_error() {
        let converter = Converter::new("false", Duration::from_secs(5));
        let err = converter.pdf_to_docx(b"%PDF-1.4").await.unwrap_err();
        assert!(matches!(err, ApiError::ConversionFailed(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_silent_program_without_output() {
        let converter = Converter::new("true", Duration::from_secs(5));
        let err = converter.pdf_to_docx(b"%PDF-1.4").await.unwrap_err();
        assert!(matches!(err, ApiError::ConversionFailed(msg) if msg.contains("no output")));
    }
}
