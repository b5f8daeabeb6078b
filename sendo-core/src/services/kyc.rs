//! KYC document upload

use std::path::Path;
use std::sync::Arc;

use crate::domain::result::{Error, Result};
use crate::domain::{KycDocumentType, KycFile, KycUploadResult, MAX_KYC_FILE_BYTES};
use crate::services::api::SendoApi;

pub struct KycService {
    api: Arc<SendoApi>,
}

impl KycService {
    pub fn new(api: Arc<SendoApi>) -> Self {
        Self { api }
    }

    /// Read and check a document from disk
    pub fn load_file(path: &Path) -> Result<KycFile> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::validation(format!("Invalid file path: {}", path.display())))?
            .to_string();

        let size = std::fs::metadata(path)?.len();
        if size > MAX_KYC_FILE_BYTES as u64 {
            return Err(Error::validation(format!(
                "{}: file exceeds the 10 MB limit",
                file_name
            )));
        }

        KycFile::new(file_name, std::fs::read(path)?)
    }

    pub async fn upload(
        &self,
        document_type: KycDocumentType,
        files: Vec<KycFile>,
    ) -> Result<KycUploadResult> {
        if files.is_empty() {
            return Err(Error::validation("Select at least one file"));
        }
        let count = files.len();
        let result = self.api.kyc_upload(document_type, files).await?;
        tracing::info!(%document_type, files = count, "KYC documents uploaded");
        Ok(result)
    }

    pub async fn upload_paths<P: AsRef<Path>>(
        &self,
        document_type: KycDocumentType,
        paths: &[P],
    ) -> Result<KycUploadResult> {
        let files = paths
            .iter()
            .map(|p| Self::load_file(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        self.upload(document_type, files).await
    }

    /// Swap one stored document for a new file
    pub async fn replace(&self, public_id: &str, file: KycFile) -> Result<KycUploadResult> {
        let public_id = public_id.trim();
        if public_id.is_empty() {
            return Err(Error::validation("Document id is required"));
        }
        self.api.kyc_replace(public_id, file).await
    }
}
