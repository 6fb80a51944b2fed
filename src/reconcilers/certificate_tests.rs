// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `certificate.rs`

#[cfg(test)]
mod tests {
    use super::super::{
        build_request, certificate_domain, ensure_certificate, wait_for_issuance,
        ValidationPolicy,
    };
    use crate::annotations::ResolvedConfig;
    use crate::cert_errors::{CertificateError, ValidationError, ZoneError};
    use crate::labels::{MANAGED_BY_ACM_MANAGER, TAG_MANAGED_BY};
    use crate::providers::CertificateStatus::{self, Failed, Issued, PendingValidation};
    use crate::testing::{cname, FakeCertificateAuthority, FakeDnsProvider, Harness};
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    const EXISTING_ARN: &str = "arn:aws:acm:us-east-1:123456789012:certificate/existing";
    const NEW_ARN: &str = "arn:aws:acm:us-east-1:123456789012:certificate/new-1";

    fn managed() -> ResolvedConfig {
        ResolvedConfig {
            managed: true,
            ..Default::default()
        }
    }

    /// CA that validates `domain` through one CNAME and issues on the given schedule
    fn issuing_ca(domain: &str, statuses: &[CertificateStatus]) -> FakeCertificateAuthority {
        FakeCertificateAuthority::new()
            .with_validation(domain, cname(domain))
            .with_statuses(statuses)
    }

    fn example_zone() -> FakeDnsProvider {
        FakeDnsProvider::new().with_zone("/hostedzone/Z1", "example.com.")
    }

    // ========== Request shape ==========

    #[test]
    fn test_certificate_domain_wildcard_prefix() {
        assert_eq!(certificate_domain("example.com", true), "*.example.com");
        assert_eq!(certificate_domain("example.com", false), "example.com");
    }

    #[test]
    fn test_build_request_tags_and_sans() {
        let config = ResolvedConfig {
            sans: vec!["www.example.com".to_string(), "api.example.com".to_string()],
            ..managed()
        };
        let request = build_request("example.com", &config);
        assert_eq!(request.domain_name, "example.com");
        assert_eq!(
            request.subject_alternative_names,
            vec!["www.example.com", "api.example.com"]
        );
        assert_eq!(
            request.tags.get(TAG_MANAGED_BY).map(String::as_str),
            Some(MANAGED_BY_ACM_MANAGER)
        );
    }

    #[test]
    fn test_default_policy() {
        let policy = ValidationPolicy::default();
        assert_eq!(policy.poll_interval, Duration::from_secs(15));
        assert_eq!(policy.timeout, Duration::from_secs(600));
        assert_eq!(policy.progress_every, 4);
    }

    // ========== Reuse ==========

    #[tokio::test]
    async fn test_reuses_case_insensitive_match_without_request() {
        let ca = FakeCertificateAuthority::new()
            .with_certificate(EXISTING_ARN, "Foo.Example.COM", Issued);
        let h = Harness::new(ca, example_zone());

        let arn = ensure_certificate(&h.ctx, "foo.example.com", &managed())
            .await
            .unwrap();

        assert_eq!(arn, EXISTING_ARN);
        assert_eq!(h.ca.request_count(), 0);
        assert!(h.dns.recorded_upserts().is_empty());
    }

    #[tokio::test]
    async fn test_reuses_pending_certificate() {
        let ca = FakeCertificateAuthority::new()
            .with_certificate(EXISTING_ARN, "foo.example.com", PendingValidation);
        let h = Harness::new(ca, example_zone());

        let arn = ensure_certificate(&h.ctx, "foo.example.com", &managed())
            .await
            .unwrap();
        assert_eq!(arn, EXISTING_ARN);
        assert_eq!(h.ca.request_count(), 0);
    }

    #[tokio::test]
    async fn test_reuse_picks_first_match() {
        let ca = FakeCertificateAuthority::new()
            .with_certificate("arn:first", "foo.example.com", Issued)
            .with_certificate("arn:second", "foo.example.com", Issued);
        let h = Harness::new(ca, example_zone());

        let arn = ensure_certificate(&h.ctx, "foo.example.com", &managed())
            .await
            .unwrap();
        assert_eq!(arn, "arn:first");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_certificate_is_not_reused() {
        let ca = issuing_ca("foo.example.com", &[Issued])
            .with_certificate(EXISTING_ARN, "foo.example.com", Failed);
        let h = Harness::new(ca, example_zone());

        let arn = ensure_certificate(&h.ctx, "foo.example.com", &managed())
            .await
            .unwrap();
        assert_eq!(arn, NEW_ARN);
        assert_eq!(h.ca.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reuse_disabled_always_requests() {
        let ca = issuing_ca("foo.example.com", &[Issued])
            .with_certificate(EXISTING_ARN, "foo.example.com", Issued);
        let h = Harness::new(ca, example_zone());
        let config = ResolvedConfig {
            reuse_existing: false,
            ..managed()
        };

        let arn = ensure_certificate(&h.ctx, "foo.example.com", &config)
            .await
            .unwrap();
        assert_eq!(arn, NEW_ARN);
        assert_eq!(h.ca.list_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_wildcard_reuse_matches_resolved_domain() {
        let ca = FakeCertificateAuthority::new()
            .with_certificate(EXISTING_ARN, "example.com", Issued)
            .failing_request();
        let h = Harness::new(ca, example_zone());
        let config = ResolvedConfig {
            wildcard: true,
            ..managed()
        };

        let arn = ensure_certificate(&h.ctx, "example.com", &config)
            .await
            .unwrap();
        assert_eq!(arn, EXISTING_ARN);
        assert_eq!(h.ca.request_count(), 0);
    }

    #[tokio::test]
    async fn test_list_failure_is_surfaced() {
        let h = Harness::new(FakeCertificateAuthority::new().failing_list(), example_zone());
        let err = ensure_certificate(&h.ctx, "foo.example.com", &managed())
            .await
            .unwrap_err();
        assert!(matches!(err, CertificateError::Provider(_)));
        assert!(err.arn().is_none());
        assert_eq!(h.ca.request_count(), 0);
    }

    // ========== Request and validation ==========

    #[tokio::test(start_paused = true)]
    async fn test_wildcard_requests_prefixed_domain() {
        let ca = issuing_ca("example.com", &[Issued]);
        let h = Harness::new(ca, example_zone());
        let config = ResolvedConfig {
            wildcard: true,
            ..managed()
        };

        ensure_certificate(&h.ctx, "example.com", &config)
            .await
            .unwrap();

        let requests = h.ca.requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].domain_name, "*.example.com");
    }

    #[tokio::test(start_paused = true)]
    async fn test_zone_override_used_for_records() {
        let ca = issuing_ca("foo.example.com", &[Issued]);
        let h = Harness::new(ca, FakeDnsProvider::new());
        let config = ResolvedConfig {
            zone_id: Some("ZOVERRIDE".to_string()),
            ..managed()
        };

        ensure_certificate(&h.ctx, "foo.example.com", &config)
            .await
            .unwrap();
        assert_eq!(h.dns.recorded_upserts()[0].0, "ZOVERRIDE");
    }

    #[tokio::test]
    async fn test_zone_not_found_returns_arn_without_polling() {
        let ca = issuing_ca("foo.example.com", &[Issued]);
        let dns = FakeDnsProvider::new().with_zone("Z9", "example.org.");
        let h = Harness::new(ca, dns);

        let err = ensure_certificate(&h.ctx, "foo.example.com", &managed())
            .await
            .unwrap_err();

        assert_eq!(err.arn(), Some(NEW_ARN));
        assert!(matches!(
            err,
            CertificateError::ValidationRecords {
                source: ValidationError::Zone {
                    source: ZoneError::NoMatchingZone { .. },
                    ..
                },
                ..
            }
        ));
        // One describe to read validation options, none for polling
        assert_eq!(h.ca.describe_calls.load(Ordering::SeqCst), 1);
        assert!(h.ca.deleted_arns().is_empty(), "Pending certificate must not be rolled back");
    }

    // ========== Polling ==========

    #[tokio::test(start_paused = true)]
    async fn test_issued_after_several_polls() {
        let ca = issuing_ca(
            "foo.example.com",
            &[PendingValidation, PendingValidation, PendingValidation, Issued],
        );
        let h = Harness::new(ca, example_zone());

        let started = tokio::time::Instant::now();
        let arn = ensure_certificate(&h.ctx, "foo.example.com", &managed())
            .await
            .unwrap();

        assert_eq!(arn, NEW_ARN);
        assert_eq!(h.dns.recorded_upserts().len(), 1);
        // The first scripted status is consumed by the validation record lookup
        assert_eq!(h.ca.describe_calls.load(Ordering::SeqCst), 4);
        assert_eq!(started.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_status_reports_reason() {
        let ca = issuing_ca("foo.example.com", &[PendingValidation, Failed])
            .with_failure_reason("CAA_ERROR");
        let h = Harness::new(ca, example_zone());

        let err = ensure_certificate(&h.ctx, "foo.example.com", &managed())
            .await
            .unwrap_err();

        match err {
            CertificateError::ValidationFailed { arn, reason } => {
                assert_eq!(arn, NEW_ARN);
                assert_eq!(reason, "CAA_ERROR");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_status_without_reason() {
        let ca = FakeCertificateAuthority::new().with_statuses(&[Failed]);
        let err = wait_for_issuance(&ca, NEW_ARN, &ValidationPolicy::default())
            .await
            .unwrap_err();
        assert!(
            matches!(err, CertificateError::ValidationFailed { ref reason, .. } if reason == "unknown")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_when_never_issued() {
        let ca = FakeCertificateAuthority::new().with_statuses(&[PendingValidation]);

        let err = wait_for_issuance(&ca, NEW_ARN, &ValidationPolicy::default())
            .await
            .unwrap_err();

        match err {
            CertificateError::ValidationTimeout { arn, waited } => {
                assert_eq!(arn, NEW_ARN);
                assert!(waited > Duration::from_secs(600));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // A check at t=0 and every 15s up to and including the deadline
        assert_eq!(ca.describe_calls.load(Ordering::SeqCst), 41);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_policy_is_honoured() {
        let ca = FakeCertificateAuthority::new().with_statuses(&[PendingValidation]);
        let policy = ValidationPolicy {
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(3),
            progress_every: 1,
        };

        let err = wait_for_issuance(&ca, NEW_ARN, &policy).await.unwrap_err();
        assert!(matches!(err, CertificateError::ValidationTimeout { .. }));
        assert_eq!(ca.describe_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_status_check_failure_carries_arn() {
        let ca = FakeCertificateAuthority::new().failing_describe();
        let err = wait_for_issuance(&ca, NEW_ARN, &ValidationPolicy::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CertificateError::StatusCheck { .. }));
        assert_eq!(err.arn(), Some(NEW_ARN));
    }

    #[tokio::test(start_paused = true)]
    async fn test_domain_lock_released_after_ensure() {
        let h = Harness::new(issuing_ca("foo.example.com", &[Issued]), example_zone());
        ensure_certificate(&h.ctx, "foo.example.com", &managed())
            .await
            .unwrap();
        assert!(h.ctx.locks.is_empty());

        let relock =
            tokio::time::timeout(Duration::from_secs(1), h.ctx.locks.lock("foo.example.com")).await;
        assert!(relock.is_ok());
    }

    #[tokio::test]
    async fn test_domain_lock_released_after_failure() {
        let h = Harness::new(FakeCertificateAuthority::new().failing_list(), example_zone());
        ensure_certificate(&h.ctx, "foo.example.com", &managed())
            .await
            .unwrap_err();
        assert!(h.ctx.locks.is_empty());
    }
}
