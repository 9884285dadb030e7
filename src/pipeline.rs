//! Pipeline orchestration
//!
//! This module provides the public API for Synheart Motor. Each subject
//! record goes through validation → per-hand feature derivation →
//! bundle assembly; batches fan out across subjects on the rayon pool.

use crate::config::AnalysisConfig;
use crate::encoder::{FeatureBundle, MotorEncoder, MotorPayload, RecordKind};
use crate::error::MotorError;
use crate::schema::{RecordReader, RejectedRecord, TappingRecord, Timeslots, WearableRecord};
use crate::tapping::aggregate::TappingFeatureDeriver;
use crate::types::{
    is_affected, AsymmetryFeatures, Cohort, Diagnostic, FeatureIssue, Hand, HandRole, Severity,
    TappingBundle, TappingHandFeatures, TrendAsymmetry, WearableBundle,
};
use crate::wearable::WearableFeatureDeriver;
use rayon::prelude::*;
use tracing::{debug, info, warn};

const ROLES: [HandRole; 2] = [HandRole::Dominant, HandRole::NonDominant];

/// Derive every tapping feature for one subject.
///
/// Fails only when the record itself is malformed. Streams missing from
/// the record, and features that cannot be computed, become diagnostics.
pub fn tapping_features(
    record: &TappingRecord,
    config: &AnalysisConfig,
) -> Result<TappingBundle, MotorError> {
    record
        .validate()
        .map_err(|e| MotorError::InvalidInput(e.to_string()))?;

    let subject = record.subject_id.as_str();
    let mut hands = Vec::new();
    let mut diagnostics = Vec::new();

    for protocol in &config.protocols {
        for role in ROLES {
            let hand = role.hand_for(record.hand);
            let slot = protocol.slot(role);
            let Some(events) = record.stream(slot) else {
                let issue = FeatureIssue::missing(
                    "stream",
                    None,
                    &MotorError::InvalidInput(format!("no event stream in slot {slot}")),
                );
                diagnostics.push(report(subject, hand, Some(&protocol.name), issue));
                continue;
            };

            let derivation = TappingFeatureDeriver::derive(events, protocol, config);
            diagnostics.extend(
                derivation
                    .issues
                    .into_iter()
                    .map(|issue| report(subject, hand, Some(&protocol.name), issue)),
            );
            hands.push(TappingHandFeatures {
                protocol: protocol.name.clone(),
                role,
                hand,
                affected: is_affected(record.side, hand),
                velocity_trend: derivation.velocity_trend,
                windows: derivation.windows,
            });
        }
    }

    let asymmetry = asymmetry_features(&hands, config);
    debug!(
        subject_id = subject,
        hands = hands.len(),
        diagnostics = diagnostics.len(),
        "assembled tapping bundle"
    );

    Ok(TappingBundle {
        subject_id: record.subject_id.clone(),
        cohort: Cohort::from_subject_id(subject),
        handedness: record.hand,
        hands,
        asymmetry,
        diagnostics,
    })
}

fn asymmetry_features(hands: &[TappingHandFeatures], config: &AnalysisConfig) -> Vec<AsymmetryFeatures> {
    let find = |protocol: &str, role: HandRole| {
        hands
            .iter()
            .find(|h| h.protocol == protocol && h.role == role)
    };

    let mut out = Vec::new();
    for protocol in &config.protocols {
        let (Some(dom), Some(ndom)) = (
            find(&protocol.name, HandRole::Dominant),
            find(&protocol.name, HandRole::NonDominant),
        ) else {
            continue;
        };
        for &window_ms in &config.windows_ms {
            let (Some(d), Some(n)) = (dom.window(window_ms), ndom.window(window_ms)) else {
                continue;
            };
            out.push(AsymmetryFeatures {
                protocol: protocol.name.clone(),
                window_ms,
                flight: TrendAsymmetry::between(d.flight.trend.as_ref(), n.flight.trend.as_ref()),
                dwell: TrendAsymmetry::between(d.dwell.trend.as_ref(), n.dwell.trend.as_ref()),
            });
        }
    }
    out
}

/// Derive wearable features for each wrist present in the record.
///
/// With `timeslots`, each wrist is cut to its task slot first; a wrist
/// without a slot is analysed whole and flagged.
pub fn wearable_features(
    record: &WearableRecord,
    timeslots: Option<&Timeslots>,
    config: &AnalysisConfig,
) -> Result<WearableBundle, MotorError> {
    record
        .validate()
        .map_err(|e| MotorError::InvalidInput(e.to_string()))?;

    let subject = record.subject_id.as_str();
    let mut hands = Vec::new();
    let mut diagnostics = Vec::new();

    for hand in [Hand::Left, Hand::Right] {
        let Some(recording) = record.wrists.get(hand) else {
            continue;
        };
        let role = if hand == record.hand {
            HandRole::Dominant
        } else {
            HandRole::NonDominant
        };

        let segment = match timeslots.map(|t| t.slot(subject, hand)) {
            Some(Some(slot)) => match slot.select(recording) {
                Ok(segment) => segment,
                Err(e) => {
                    diagnostics.push(report(subject, hand, None, FeatureIssue::missing("timeslot", None, &e)));
                    continue;
                }
            },
            Some(None) => {
                let issue = FeatureIssue::missing(
                    "timeslot",
                    None,
                    &MotorError::InvalidInput(format!(
                        "no timeslot for {} wrist, analysing full recording",
                        hand.as_str()
                    )),
                );
                diagnostics.push(report(subject, hand, None, issue));
                recording.clone()
            }
            None => recording.clone(),
        };

        let derivation = WearableFeatureDeriver::derive(
            &segment,
            hand,
            role,
            is_affected(record.side, hand),
            &config.wearable,
        );
        diagnostics.extend(
            derivation
                .issues
                .into_iter()
                .map(|issue| report(subject, hand, None, issue)),
        );
        hands.push(derivation.features);
    }

    debug!(
        subject_id = subject,
        hands = hands.len(),
        diagnostics = diagnostics.len(),
        "assembled wearable bundle"
    );

    Ok(WearableBundle {
        subject_id: record.subject_id.clone(),
        cohort: Cohort::from_subject_id(subject),
        handedness: record.hand,
        hands,
        diagnostics,
    })
}

fn report(subject_id: &str, hand: Hand, protocol: Option<&str>, issue: FeatureIssue) -> Diagnostic {
    let diagnostic = Diagnostic::from_issue(subject_id, hand, protocol, issue);
    match diagnostic.severity {
        Severity::Warning => warn!(
            subject_id,
            hand = hand.as_str(),
            protocol = diagnostic.protocol.as_deref(),
            window_ms = diagnostic.window_ms,
            feature = %diagnostic.feature,
            code = %diagnostic.code,
            "{}",
            diagnostic.message
        ),
        Severity::NumericalWarning => debug!(
            subject_id,
            hand = hand.as_str(),
            feature = %diagnostic.feature,
            "{}",
            diagnostic.message
        ),
    }
    diagnostic
}

/// Outcome of one record in a batch
#[derive(Debug)]
pub enum BatchItem<B> {
    Done(B),
    Failed { subject_id: String, error: MotorError },
}

impl<B> BatchItem<B> {
    fn from_result(subject_id: &str, result: Result<B, MotorError>) -> Self {
        match result {
            Ok(bundle) => BatchItem::Done(bundle),
            Err(error) => {
                warn!(subject_id, code = error.code(), "record failed: {error}");
                BatchItem::Failed {
                    subject_id: subject_id.to_string(),
                    error,
                }
            }
        }
    }

    fn rejected(rejected: RejectedRecord) -> Self {
        warn!(
            position = rejected.position,
            subject_id = rejected.subject_id.as_deref(),
            "record rejected: {}",
            rejected.error
        );
        BatchItem::Failed {
            subject_id: rejected.subject_id.unwrap_or_default(),
            error: rejected.error,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, BatchItem::Done(_))
    }
}

/// Tapping features for many subjects in parallel, in input order
pub fn tapping_batch(records: &[TappingRecord], config: &AnalysisConfig) -> Vec<BatchItem<TappingBundle>> {
    let items: Vec<_> = records
        .par_iter()
        .map(|record| BatchItem::from_result(&record.subject_id, tapping_features(record, config)))
        .collect();
    log_summary("tapping", &items);
    items
}

/// Wearable features for many subjects in parallel, in input order
pub fn wearable_batch(
    records: &[WearableRecord],
    timeslots: Option<&Timeslots>,
    config: &AnalysisConfig,
) -> Vec<BatchItem<WearableBundle>> {
    let items: Vec<_> = records
        .par_iter()
        .map(|record| {
            BatchItem::from_result(
                &record.subject_id,
                wearable_features(record, timeslots, config),
            )
        })
        .collect();
    log_summary("wearable", &items);
    items
}

/// Run `derive` over independently parsed records; rejected entries become
/// failed items in place
fn parsed_batch<R, B, F>(kind: &str, parsed: Vec<Result<R, RejectedRecord>>, derive: F) -> Vec<BatchItem<B>>
where
    R: SubjectRecord + Send,
    B: Send,
    F: Fn(&R) -> Result<B, MotorError> + Sync,
{
    let items: Vec<_> = parsed
        .into_par_iter()
        .map(|entry| match entry {
            Ok(record) => BatchItem::from_result(record.subject_id(), derive(&record)),
            Err(rejected) => BatchItem::rejected(rejected),
        })
        .collect();
    log_summary(kind, &items);
    items
}

trait SubjectRecord {
    fn subject_id(&self) -> &str;
}

impl SubjectRecord for TappingRecord {
    fn subject_id(&self) -> &str {
        &self.subject_id
    }
}

impl SubjectRecord for WearableRecord {
    fn subject_id(&self) -> &str {
        &self.subject_id
    }
}

fn log_summary<B>(kind: &str, items: &[BatchItem<B>]) {
    let done = items.iter().filter(|i| i.is_done()).count();
    info!(
        kind,
        records = items.len(),
        done,
        failed = items.len() - done,
        "batch complete"
    );
}

/// Processor holding a validated configuration and one encoder instance.
///
/// Use this to turn raw JSON / NDJSON input into output payloads.
pub struct MotorProcessor {
    config: AnalysisConfig,
    encoder: MotorEncoder,
}

impl Default for MotorProcessor {
    fn default() -> Self {
        Self {
            config: AnalysisConfig::default(),
            encoder: MotorEncoder::new(),
        }
    }
}

impl MotorProcessor {
    pub fn new(config: AnalysisConfig) -> Result<Self, MotorError> {
        config.validate()?;
        Ok(Self {
            config,
            encoder: MotorEncoder::new(),
        })
    }

    pub fn with_encoder(mut self, encoder: MotorEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Process tapping records given as a JSON array or NDJSON.
    ///
    /// A record that fails to parse yields a failed payload in its place.
    pub fn process_tapping(&self, input: &str) -> Result<Vec<MotorPayload>, MotorError> {
        let parsed = RecordReader::parse_each::<TappingRecord>(input)?;
        let items = parsed_batch("tapping", parsed, |record| tapping_features(record, &self.config));
        Ok(self.encode_items(items, RecordKind::Tapping, FeatureBundle::Tapping))
    }

    /// Process wearable records given as a JSON array or NDJSON
    pub fn process_wearable(
        &self,
        input: &str,
        timeslots: Option<&Timeslots>,
    ) -> Result<Vec<MotorPayload>, MotorError> {
        let parsed = RecordReader::parse_each::<WearableRecord>(input)?;
        let items = parsed_batch("wearable", parsed, |record| {
            wearable_features(record, timeslots, &self.config)
        });
        Ok(self.encode_items(items, RecordKind::Wearable, FeatureBundle::Wearable))
    }

    fn encode_items<B>(
        &self,
        items: Vec<BatchItem<B>>,
        kind: RecordKind,
        wrap: fn(B) -> FeatureBundle,
    ) -> Vec<MotorPayload> {
        items
            .into_iter()
            .map(|item| match item {
                BatchItem::Done(bundle) => self.encoder.encode(wrap(bundle)),
                BatchItem::Failed { subject_id, error } => {
                    self.encoder.encode_failure(&subject_id, kind, &error)
                }
            })
            .collect()
    }
}
