// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! AWS Certificate Manager implementation of [`CertificateAuthority`].

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_acm::error::DisplayErrorContext;
use aws_sdk_acm::types as acm_types;
use aws_sdk_acm::Client as AcmClient;
use tracing::debug;

use super::{
    CertificateAuthority, CertificateDetail, CertificateRequest, CertificateStatus,
    CertificateSummary, DomainValidation, ValidationRecord,
};
use crate::cert_errors::ProviderError;

const SERVICE: &str = "ACM";

/// Certificate authority backed by AWS Certificate Manager.
#[derive(Clone)]
pub struct AcmCertificateAuthority {
    client: AcmClient,
}

impl std::fmt::Debug for AcmCertificateAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcmCertificateAuthority")
            .finish_non_exhaustive()
    }
}

impl AcmCertificateAuthority {
    /// Create a client from a loaded AWS SDK configuration.
    #[must_use]
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: AcmClient::new(sdk_config),
        }
    }
}

fn api_error(operation: &'static str, err: &impl std::error::Error) -> ProviderError {
    ProviderError::Api {
        service: SERVICE,
        operation,
        reason: DisplayErrorContext(err).to_string(),
    }
}

fn to_sdk_status(status: CertificateStatus) -> acm_types::CertificateStatus {
    match status {
        CertificateStatus::PendingValidation => acm_types::CertificateStatus::PendingValidation,
        CertificateStatus::Issued => acm_types::CertificateStatus::Issued,
        CertificateStatus::Inactive => acm_types::CertificateStatus::Inactive,
        CertificateStatus::Expired => acm_types::CertificateStatus::Expired,
        CertificateStatus::ValidationTimedOut => acm_types::CertificateStatus::ValidationTimedOut,
        CertificateStatus::Revoked => acm_types::CertificateStatus::Revoked,
        CertificateStatus::Failed => acm_types::CertificateStatus::Failed,
        CertificateStatus::Unknown => acm_types::CertificateStatus::from("UNKNOWN"),
    }
}

fn from_sdk_status(status: &acm_types::CertificateStatus) -> CertificateStatus {
    match status {
        acm_types::CertificateStatus::PendingValidation => CertificateStatus::PendingValidation,
        acm_types::CertificateStatus::Issued => CertificateStatus::Issued,
        acm_types::CertificateStatus::Inactive => CertificateStatus::Inactive,
        acm_types::CertificateStatus::Expired => CertificateStatus::Expired,
        acm_types::CertificateStatus::ValidationTimedOut => CertificateStatus::ValidationTimedOut,
        acm_types::CertificateStatus::Revoked => CertificateStatus::Revoked,
        acm_types::CertificateStatus::Failed => CertificateStatus::Failed,
        _ => CertificateStatus::Unknown,
    }
}

#[async_trait]
impl CertificateAuthority for AcmCertificateAuthority {
    async fn list_certificates(
        &self,
        statuses: &[CertificateStatus],
    ) -> Result<Vec<CertificateSummary>, ProviderError> {
        let mut certificates = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .client
                .list_certificates()
                .set_certificate_statuses(Some(
                    statuses.iter().copied().map(to_sdk_status).collect(),
                ))
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| api_error("ListCertificates", &e))?;

            for summary in output.certificate_summary_list() {
                // Entries without an ARN or domain cannot be reused or deleted
                if let (Some(arn), Some(domain_name)) =
                    (summary.certificate_arn(), summary.domain_name())
                {
                    certificates.push(CertificateSummary {
                        arn: arn.to_string(),
                        domain_name: domain_name.to_string(),
                    });
                }
            }

            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        debug!(count = certificates.len(), "Listed ACM certificates");
        Ok(certificates)
    }

    async fn request_certificate(
        &self,
        request: &CertificateRequest,
    ) -> Result<String, ProviderError> {
        let mut call = self
            .client
            .request_certificate()
            .domain_name(&request.domain_name)
            .validation_method(acm_types::ValidationMethod::Dns);

        if !request.subject_alternative_names.is_empty() {
            call = call.set_subject_alternative_names(Some(
                request.subject_alternative_names.clone(),
            ));
        }

        for (key, value) in &request.tags {
            let tag = acm_types::Tag::builder()
                .key(key)
                .value(value)
                .build()
                .map_err(|e| api_error("RequestCertificate", &e))?;
            call = call.tags(tag);
        }

        let output = call
            .send()
            .await
            .map_err(|e| api_error("RequestCertificate", &e))?;

        output
            .certificate_arn()
            .map(ToString::to_string)
            .ok_or(ProviderError::MalformedResponse {
                service: SERVICE,
                operation: "RequestCertificate",
                reason: "response has no certificate ARN".to_string(),
            })
    }

    async fn describe_certificate(&self, arn: &str) -> Result<CertificateDetail, ProviderError> {
        let output = self
            .client
            .describe_certificate()
            .certificate_arn(arn)
            .send()
            .await
            .map_err(|e| api_error("DescribeCertificate", &e))?;

        let certificate = output
            .certificate()
            .ok_or_else(|| ProviderError::MalformedResponse {
                service: SERVICE,
                operation: "DescribeCertificate",
                reason: format!("no certificate detail for {arn}"),
            })?;

        let domain_validations = certificate
            .domain_validation_options()
            .iter()
            .map(|option| DomainValidation {
                domain_name: option.domain_name().to_string(),
                record: option.resource_record().map(|record| ValidationRecord {
                    name: record.name().to_string(),
                    record_type: record.r#type().as_str().to_string(),
                    value: record.value().to_string(),
                }),
            })
            .collect();

        Ok(CertificateDetail {
            arn: arn.to_string(),
            status: certificate
                .status()
                .map_or(CertificateStatus::Unknown, from_sdk_status),
            failure_reason: certificate
                .failure_reason()
                .map(|reason| reason.as_str().to_string()),
            domain_validations,
        })
    }

    async fn delete_certificate(&self, arn: &str) -> Result<(), ProviderError> {
        self.client
            .delete_certificate()
            .certificate_arn(arn)
            .send()
            .await
            .map_err(|e| api_error("DeleteCertificate", &e))?;
        Ok(())
    }
}
