//! KYC document types and client-side file checks

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// Largest accepted document, in bytes
pub const MAX_KYC_FILE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KycDocumentType {
    IdProof,
    AddressProof,
    Rccm,
    NiuProof,
    Selfie,
    ArticlesAssociationProof,
}

impl KycDocumentType {
    pub const ALL: [KycDocumentType; 6] = [
        Self::IdProof,
        Self::AddressProof,
        Self::Rccm,
        Self::NiuProof,
        Self::Selfie,
        Self::ArticlesAssociationProof,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IdProof => "ID_PROOF",
            Self::AddressProof => "ADDRESS_PROOF",
            Self::Rccm => "RCCM",
            Self::NiuProof => "NIU_PROOF",
            Self::Selfie => "SELFIE",
            Self::ArticlesAssociationProof => "ARTICLES_ASSOCIATION_PROOF",
        }
    }
}

impl fmt::Display for KycDocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KycDocumentType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| format!("Unknown KYC document type '{}'", s))
    }
}

/// A document ready to be uploaded
#[derive(Clone)]
pub struct KycFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl KycFile {
    /// Accepts images and PDFs up to [`MAX_KYC_FILE_BYTES`]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let file_name = file_name.into();
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        let content_type = match extension.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "pdf" => "application/pdf",
            _ => {
                return Err(Error::validation(format!(
                    "{}: only images (png, jpg, gif, webp) and PDF files are accepted",
                    file_name
                )))
            }
        };

        if bytes.is_empty() {
            return Err(Error::validation(format!("{}: file is empty", file_name)));
        }
        if bytes.len() > MAX_KYC_FILE_BYTES {
            return Err(Error::validation(format!(
                "{}: file exceeds the 10 MB limit",
                file_name
            )));
        }

        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for KycFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KycFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Response of the upload endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KycUploadResult {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub document_type: Option<KycDocumentType>,
    #[serde(default)]
    pub file_urls: Vec<String>,
}
