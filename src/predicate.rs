//! Build metadata decoding.
//!
//! The provenance payload returned by verification is a signed envelope
//! whose `payload` field holds a base64-encoded in-toto statement. This
//! module unwraps the envelope, decodes the statement, and projects six
//! fields of its `predicate` for display. Fields absent from the predicate
//! are tolerated; a malformed envelope, bad base64, or an invalid statement
//! is fatal.

use crate::attest::VerificationOutcome;
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use serde::Serialize;
use serde_json::Value;

/// Indicator printed in place of a predicate field that is absent.
pub const MISSING_FIELD: &str = "<missing>";

/// Errors raised while decoding a provenance payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Verification did not return a payload to decode.
    #[error("verified provenance carried no payload to decode")]
    MissingPayload,

    /// The envelope is not a JSON document.
    #[error("attestation envelope is not valid JSON: {reason}")]
    InvalidEnvelope {
        /// Parser diagnostic.
        reason: String,
    },

    /// The envelope has no `payload` string.
    #[error("attestation envelope has no payload field")]
    MissingEnvelopePayload,

    /// The payload is not valid base64.
    #[error("attestation payload is not valid base64: {reason}")]
    InvalidBase64 {
        /// Decoder diagnostic.
        reason: String,
    },

    /// The decoded payload is not a JSON document.
    #[error("attestation statement is not valid JSON: {reason}")]
    InvalidStatement {
        /// Parser diagnostic.
        reason: String,
    },
}

/// The build facts projected from a provenance predicate.
///
/// Each field is `None` when the predicate does not carry it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildPredicate {
    /// `predicate.buildType`.
    pub build_type: Option<String>,
    /// `predicate.builder.id`.
    pub builder_id: Option<String>,
    /// `predicate.metadata.buildInvocationId`.
    pub build_invocation_id: Option<String>,
    /// `predicate.metadata.buildStartedOn`.
    pub build_started_on: Option<String>,
    /// `predicate.invocation.configSource.uri`.
    pub config_source_uri: Option<String>,
    /// `predicate.invocation.configSource.digest.sha1`.
    pub config_source_sha1: Option<String>,
}

impl BuildPredicate {
    /// Project the six display fields from a `predicate` object.
    #[must_use]
    pub fn from_predicate(predicate: &Value) -> Self {
        let field = |pointer: &str| predicate.pointer(pointer).and_then(render_value);
        Self {
            build_type: field("/buildType"),
            builder_id: field("/builder/id"),
            build_invocation_id: field("/metadata/buildInvocationId"),
            build_started_on: field("/metadata/buildStartedOn"),
            config_source_uri: field("/invocation/configSource/uri"),
            config_source_sha1: field("/invocation/configSource/digest/sha1"),
        }
    }

    /// Return the labelled display lines, `buildType` first.
    ///
    /// # Examples
    ///
    /// ```
    /// use caddy_verify::predicate::{BuildPredicate, MISSING_FIELD};
    ///
    /// let predicate = BuildPredicate {
    ///     build_type: Some("https://slsa-framework.github.io/github-actions-buildtypes/workflow/v1".into()),
    ///     ..BuildPredicate::default()
    /// };
    /// let lines = predicate.labelled();
    /// assert_eq!(lines[0].0, "Build Type");
    /// assert_eq!(lines[1].1, MISSING_FIELD);
    /// ```
    #[must_use]
    pub fn labelled(&self) -> [(&'static str, &str); 6] {
        [
            ("Build Type", shown(self.build_type.as_ref())),
            ("Builder", shown(self.builder_id.as_ref())),
            ("Build ID", shown(self.build_invocation_id.as_ref())),
            ("Build Time", shown(self.build_started_on.as_ref())),
            ("Repository", shown(self.config_source_uri.as_ref())),
            ("Commit", shown(self.config_source_sha1.as_ref())),
        ]
    }

    /// Number of fields the predicate did not carry.
    #[must_use]
    pub fn missing_count(&self) -> usize {
        [
            &self.build_type,
            &self.builder_id,
            &self.build_invocation_id,
            &self.build_started_on,
            &self.config_source_uri,
            &self.config_source_sha1,
        ]
        .into_iter()
        .filter(|value| value.is_none())
        .count()
    }
}

fn shown(value: Option<&String>) -> &str {
    value.map_or(MISSING_FIELD, String::as_str)
}

/// Strings render verbatim, `null` as missing, anything else as compact JSON.
fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Decode the provenance payload carried by a verification outcome.
///
/// # Errors
///
/// Returns [`DecodeError::MissingPayload`] when the outcome carries no
/// payload, otherwise any error from [`decode`].
pub fn decode_outcome(outcome: &VerificationOutcome) -> Result<BuildPredicate, DecodeError> {
    if !outcome.is_verified() {
        return Err(DecodeError::MissingPayload);
    }
    let payload = outcome
        .decoded_payload
        .as_deref()
        .ok_or(DecodeError::MissingPayload)?;
    decode(payload)
}

/// Decode an attestation envelope into its build predicate.
///
/// The envelope may be a bare DSSE envelope (`payload` at the top level), a
/// Sigstore bundle (`dsseEnvelope.payload`), or a legacy cosign bundle whose
/// `base64Signature` encodes the envelope.
///
/// # Errors
///
/// Returns an error if the envelope is not JSON, lacks a payload, the
/// payload is not base64, or the decoded statement is not JSON.
///
/// # Examples
///
/// ```
/// use caddy_verify::predicate::decode;
///
/// // base64 of {"predicate":{"buildType":"X"}}
/// let envelope = br#"{"payload":"eyJwcmVkaWNhdGUiOnsiYnVpbGRUeXBlIjoiWCJ9fQ=="}"#;
/// let predicate = decode(envelope).expect("decodes");
/// assert_eq!(predicate.build_type.as_deref(), Some("X"));
/// assert_eq!(predicate.missing_count(), 5);
/// ```
pub fn decode(envelope: &[u8]) -> Result<BuildPredicate, DecodeError> {
    let document: Value =
        serde_json::from_slice(envelope).map_err(|e| DecodeError::InvalidEnvelope {
            reason: e.to_string(),
        })?;
    let encoded = envelope_payload(&document)?;
    let statement = decode_base64(&encoded)?;
    let statement: Value =
        serde_json::from_slice(&statement).map_err(|e| DecodeError::InvalidStatement {
            reason: e.to_string(),
        })?;

    Ok(statement
        .get("predicate")
        .map(BuildPredicate::from_predicate)
        .unwrap_or_default())
}

/// Locate the base64 payload string within an envelope document.
fn envelope_payload(document: &Value) -> Result<String, DecodeError> {
    let direct = document
        .get("payload")
        .or_else(|| document.pointer("/dsseEnvelope/payload"))
        .and_then(Value::as_str);
    if let Some(payload) = direct {
        return Ok(payload.to_owned());
    }

    let Some(signature) = document.get("base64Signature").and_then(Value::as_str) else {
        return Err(DecodeError::MissingEnvelopePayload);
    };
    let inner = decode_base64(signature)?;
    let inner: Value =
        serde_json::from_slice(&inner).map_err(|e| DecodeError::InvalidEnvelope {
            reason: e.to_string(),
        })?;
    inner
        .get("payload")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or(DecodeError::MissingEnvelopePayload)
}

/// Decode standard base64, falling back to the URL-safe alphabet.
fn decode_base64(encoded: &str) -> Result<Vec<u8>, DecodeError> {
    let trimmed = encoded.trim();
    STANDARD
        .decode(trimmed)
        .or_else(|_| URL_SAFE.decode(trimmed))
        .map_err(|e| DecodeError::InvalidBase64 {
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{envelope_json, sample_predicate};
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn decodes_every_field_of_a_full_predicate() {
        let envelope = envelope_json(&sample_predicate());

        let predicate = decode(envelope.as_bytes()).expect("decodes");

        assert_eq!(
            predicate.build_type.as_deref(),
            Some("https://github.com/slsa-framework/slsa-github-generator/generic@v1")
        );
        assert_eq!(
            predicate.builder_id.as_deref(),
            Some("https://github.com/slsa-framework/slsa-github-generator/.github/workflows/generator_generic_slsa3.yml@refs/tags/v1.9.0")
        );
        assert_eq!(
            predicate.build_invocation_id.as_deref(),
            Some("https://github.com/caddyserver/caddy/actions/runs/7052431337/attempts/1")
        );
        assert_eq!(predicate.build_started_on.as_deref(), Some("2023-12-01T12:00:00Z"));
        assert_eq!(
            predicate.config_source_uri.as_deref(),
            Some("git+https://github.com/caddyserver/caddy@refs/tags/v2.7.6")
        );
        assert_eq!(
            predicate.config_source_sha1.as_deref(),
            Some("6d9a83376b5e19b3c0368541ee46044ab284038b")
        );
        assert_eq!(predicate.missing_count(), 0);
    }

    #[test]
    fn missing_build_time_renders_indicator() {
        let mut predicate = sample_predicate();
        if let Some(metadata) = predicate
            .get_mut("metadata")
            .and_then(Value::as_object_mut)
        {
            metadata.remove("buildStartedOn");
        }

        let decoded = decode(envelope_json(&predicate).as_bytes()).expect("decodes");

        assert!(decoded.build_started_on.is_none());
        let lines = decoded.labelled();
        assert_eq!(lines[3], ("Build Time", MISSING_FIELD));
        assert_ne!(lines[0].1, MISSING_FIELD);
    }

    #[test]
    fn labels_follow_display_order() {
        let labels = BuildPredicate::default().labelled().map(|(label, _)| label);
        assert_eq!(
            labels,
            [
                "Build Type",
                "Builder",
                "Build ID",
                "Build Time",
                "Repository",
                "Commit"
            ]
        );
    }

    #[test]
    fn statement_without_predicate_yields_all_missing() {
        let statement = json!({ "_type": "https://in-toto.io/Statement/v0.1" });
        let encoded = STANDARD.encode(statement.to_string());
        let envelope = json!({ "payload": encoded }).to_string();

        let decoded = decode(envelope.as_bytes()).expect("decodes");

        assert_eq!(decoded, BuildPredicate::default());
        assert_eq!(decoded.missing_count(), 6);
    }

    #[test]
    fn non_string_fields_render_as_json() {
        let predicate = json!({ "buildType": 3, "metadata": { "buildInvocationId": null } });
        let decoded = decode(envelope_json(&predicate).as_bytes()).expect("decodes");
        assert_eq!(decoded.build_type.as_deref(), Some("3"));
        assert!(decoded.build_invocation_id.is_none());
    }

    #[test]
    fn sigstore_bundle_payload_is_found() {
        let statement = json!({ "predicate": { "buildType": "X" } });
        let bundle = json!({
            "mediaType": "application/vnd.dev.sigstore.bundle+json;version=0.2",
            "dsseEnvelope": {
                "payload": STANDARD.encode(statement.to_string()),
                "payloadType": "application/vnd.in-toto+json",
                "signatures": []
            }
        })
        .to_string();

        let decoded = decode(bundle.as_bytes()).expect("decodes");
        assert_eq!(decoded.build_type.as_deref(), Some("X"));
    }

    #[test]
    fn legacy_cosign_bundle_payload_is_found() {
        let statement = json!({ "predicate": { "builder": { "id": "B" } } });
        let dsse = json!({ "payload": STANDARD.encode(statement.to_string()) });
        let bundle = json!({
            "base64Signature": STANDARD.encode(dsse.to_string()),
            "cert": "",
            "rekorBundle": {}
        })
        .to_string();

        let decoded = decode(bundle.as_bytes()).expect("decodes");
        assert_eq!(decoded.builder_id.as_deref(), Some("B"));
    }

    #[test]
    fn url_safe_payload_is_accepted() {
        let statement = json!({ "predicate": { "buildType": "??>>" } }).to_string();
        let envelope = json!({ "payload": URL_SAFE.encode(&statement) }).to_string();
        let decoded = decode(envelope.as_bytes()).expect("decodes");
        assert_eq!(decoded.build_type.as_deref(), Some("??>>"));
    }

    #[rstest]
    #[case::not_json(b"Verified OK".as_slice())]
    #[case::truncated(br#"{"payload":"#.as_slice())]
    fn malformed_envelope_is_fatal(#[case] envelope: &[u8]) {
        let err = decode(envelope).expect_err("must fail");
        assert!(matches!(err, DecodeError::InvalidEnvelope { .. }));
    }

    #[test]
    fn envelope_without_payload_is_fatal() {
        let err = decode(br#"{"payloadType":"application/vnd.in-toto+json"}"#)
            .expect_err("must fail");
        assert_eq!(err, DecodeError::MissingEnvelopePayload);
    }

    #[test]
    fn invalid_base64_is_fatal() {
        let err = decode(br#"{"payload":"not base64 at all!"}"#).expect_err("must fail");
        assert!(matches!(err, DecodeError::InvalidBase64 { .. }));
    }

    #[test]
    fn invalid_statement_json_is_fatal() {
        let envelope = json!({ "payload": STANDARD.encode("{not json") }).to_string();
        let err = decode(envelope.as_bytes()).expect_err("must fail");
        assert!(matches!(err, DecodeError::InvalidStatement { .. }));
    }

    #[test]
    fn outcome_without_payload_is_missing_payload() {
        let outcome = VerificationOutcome::verified("ok", None);
        assert_eq!(decode_outcome(&outcome), Err(DecodeError::MissingPayload));
    }

    #[test]
    fn failed_outcome_is_never_decoded() {
        let outcome = VerificationOutcome::failed("bad signature");
        assert_eq!(decode_outcome(&outcome), Err(DecodeError::MissingPayload));
    }

    #[test]
    fn verified_outcome_decodes() {
        let envelope = envelope_json(&sample_predicate());
        let outcome = VerificationOutcome::verified("ok", Some(envelope.into_bytes()));
        let decoded = decode_outcome(&outcome).expect("decodes");
        assert!(decoded.build_type.is_some());
    }

    #[test]
    fn json_uses_camel_case_keys_and_nulls() {
        let predicate = BuildPredicate {
            build_type: Some("X".to_owned()),
            ..BuildPredicate::default()
        };
        let value = serde_json::to_value(&predicate).expect("serialises");
        assert_eq!(value["buildType"], json!("X"));
        assert_eq!(value["configSourceSha1"], Value::Null);
    }
}
