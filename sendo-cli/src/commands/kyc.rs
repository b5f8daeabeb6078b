//! KYC document upload

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use sendo_core::domain::{KycDocumentType, KycUploadResult};
use sendo_core::services::KycService;
use sendo_core::{LogEvent, OperationResult};

use super::{get_logged_in_context, get_logger, log_event, log_failure, print_json};
use crate::output;

#[derive(Subcommand)]
pub enum KycCommands {
    /// Upload documents of one type
    Upload {
        /// Document type (ID_PROOF, ADDRESS_PROOF, RCCM, NIU_PROOF, SELFIE,
        /// ARTICLES_ASSOCIATION_PROOF)
        #[arg(long = "type")]
        document_type: KycDocumentType,
        /// Image or PDF files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Replace a stored document
    Replace {
        /// Public id of the stored document
        public_id: String,
        /// New file
        file: PathBuf,
    },
}

pub async fn run(command: KycCommands, json: bool) -> Result<()> {
    let logger = get_logger();
    let result = execute(command).await;
    match &result {
        Ok(_) => log_event(&logger, LogEvent::new("kyc_uploaded").with_command("kyc")),
        Err(e) => log_failure(&logger, "kyc", e),
    }

    let uploaded = result?;
    if json {
        return print_json(&OperationResult::ok(uploaded));
    }

    match &uploaded.document_type {
        Some(kind) => output::success(&format!("{} uploaded", kind)),
        None => output::success("Document uploaded"),
    }
    for url in &uploaded.file_urls {
        println!("  {}", url);
    }
    Ok(())
}

async fn execute(command: KycCommands) -> Result<KycUploadResult> {
    let ctx = get_logged_in_context()?;
    let uploaded = match command {
        KycCommands::Upload {
            document_type,
            files,
        } => {
            let pb = output::spinner(&format!("Uploading {} file(s)...", files.len()));
            let sent = ctx.kyc.upload_paths(document_type, &files).await;
            pb.finish_and_clear();
            sent?
        }
        KycCommands::Replace { public_id, file } => {
            let file = KycService::load_file(&file)?;
            let pb = output::spinner("Uploading...");
            let sent = ctx.kyc.replace(&public_id, file).await;
            pb.finish_and_clear();
            sent?
        }
    };
    Ok(uploaded)
}
