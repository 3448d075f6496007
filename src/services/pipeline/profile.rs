use super::{canvas_for, Engine};
use crate::models::config::EngineConfig;
use crate::models::profile::{GovernorProfile, UNSET};
use crate::models::{Analysis, Anchor, Anchors, ClassifiedNode, NodeId};
use crate::services::cognitive::similarity::best_similarity;
use crate::services::cognitive::ScreenKind;
use crate::services::extractors::{
    run_with_retry, AllianceExtractor, AllianceInfo, CivilizationExtractor, IdExtractor, NameExtractor, StatExtractor,
};
use crate::services::reacquire::{FieldHunt, HuntField};
use crate::services::vocabulary::Vocabulary;
use image::DynamicImage;
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

/// Power this large is really kill points read into the wrong slot
const IMPLAUSIBLE_POWER: i64 = 1_500_000_000;
const PROFILE_FIELDS: f64 = 6.0;

/// One extractor pass over the profile screen
#[derive(Debug, Clone)]
pub struct ProfileReading {
    pub profile: GovernorProfile,
    pub anchors: Anchors,
    /// Confidences (0-100) of the fields that were read successfully
    pub confidences: Vec<f64>,
}

impl ProfileReading {
    /// Mean confidence of the successful fields, scaled by how many of the
    /// six fields succeeded
    pub fn confidence(&self) -> f64 {
        if self.confidences.is_empty() {
            return 0.0;
        }
        let mean = self.confidences.iter().sum::<f64>() / self.confidences.len() as f64;
        mean * self.confidences.len() as f64 / PROFILE_FIELDS
    }

    /// Hunts for the fields still missing, each at its anchor
    fn hunts(&self, nodes: &[ClassifiedNode]) -> Vec<FieldHunt> {
        let profile = &self.profile;
        let mut hunts = Vec::new();

        let mut plan = |field: HuntField, anchor: Anchor| {
            if let Some(node) = self.anchors.node(anchor, nodes) {
                hunts.push(FieldHunt {
                    field,
                    anchor: node.detection.clone(),
                });
            }
        };

        if profile.civilization == UNSET {
            plan(HuntField::Civilization, Anchor::CivilizationLabel);
        }
        if profile.power == 0 {
            plan(HuntField::Power, Anchor::PowerLabel);
        }
        if profile.id > 0 && (profile.name == UNSET || profile.name.chars().count() < 3) {
            plan(HuntField::Name, Anchor::Id);
        }

        hunts
    }
}

fn map_anchors(nodes: &[ClassifiedNode], vocabulary: &Vocabulary, threshold: f64) -> Anchors {
    let mut anchors = Anchors::new();
    let tables = [
        (Anchor::AllianceLabel, &vocabulary.alliance_labels),
        (Anchor::PowerLabel, &vocabulary.power_labels),
        (Anchor::KillPointsLabel, &vocabulary.kill_points_labels),
        (Anchor::CivilizationLabel, &vocabulary.civilization_labels),
    ];

    for (anchor, labels) in tables {
        if let Some(node) = nodes.iter().find(|node| best_similarity(node.text(), labels) > threshold) {
            anchors.insert(anchor, node.id);
        }
    }

    anchors
}

/// Fix-ups applied after every pass
fn audit_profile(profile: &mut GovernorProfile) {
    if profile.power > IMPLAUSIBLE_POWER {
        std::mem::swap(&mut profile.power, &mut profile.kill_points);
    }

    for field in [&mut profile.name, &mut profile.alliance_tag, &mut profile.alliance_name, &mut profile.civilization] {
        if field.trim().is_empty() {
            *field = UNSET.to_string();
        }
    }

    profile.successful_read = profile.id > 0 && (profile.name != UNSET || profile.power > 0);
}

/// Read a governor profile from classified nodes.
///
/// Fields are read in a fixed order and nodes consumed by one field are
/// excluded from the ones after it.
pub fn interpret_profile(nodes: &[ClassifiedNode], vocabulary: &Vocabulary, config: &EngineConfig) -> ProfileReading {
    let thresholds = &config.thresholds;
    let retry = &config.retry;

    let mut anchors = map_anchors(nodes, vocabulary, thresholds.ui_keyword);
    let mut used: HashSet<NodeId> = HashSet::new();
    let mut confidences = Vec::new();
    let mut profile = GovernorProfile::default();

    let mut record = |confidence: f64, success: bool| {
        if success {
            confidences.push(confidence);
        }
    };

    let id = run_with_retry(&IdExtractor, nodes, &anchors, &used, 0, retry);
    if id.is_success() {
        profile.id = id.value;
        if let Some(source) = id.source {
            used.insert(source);
            anchors.insert(Anchor::Id, source);
        }
    }
    record(id.confidence, id.is_success());

    let power = run_with_retry(&StatExtractor::new(Anchor::PowerLabel), nodes, &anchors, &used, 0, retry);
    profile.power = power.value;
    used.extend(power.source);
    record(power.confidence, power.is_success());

    let kill_points = StatExtractor::new(Anchor::KillPointsLabel).excluding(profile.power);
    let kill_points = run_with_retry(&kill_points, nodes, &anchors, &used, 0, retry);
    profile.kill_points = kill_points.value;
    used.extend(kill_points.source);
    record(kill_points.confidence, kill_points.is_success());

    let alliance = run_with_retry(&AllianceExtractor, nodes, &anchors, &used, AllianceInfo::default(), retry);
    profile.alliance_tag = alliance.value.tag.clone();
    profile.alliance_name = alliance.value.name.clone();
    used.extend(alliance.source);
    record(alliance.confidence, alliance.is_success());

    let civilization = CivilizationExtractor::new(&vocabulary.civilizations, thresholds.civilization);
    let civilization = run_with_retry(&civilization, nodes, &anchors, &used, UNSET.to_string(), retry);
    profile.civilization = civilization.value.clone();
    record(civilization.confidence, civilization.is_success());

    let name = NameExtractor::new(&vocabulary.ui_keywords, thresholds.name_ui_keyword);
    let name = run_with_retry(&name, nodes, &anchors, &used, UNSET.to_string(), retry);
    profile.name = name.value.clone();
    record(name.confidence, name.is_success());

    audit_profile(&mut profile);
    debug!(?profile, "Profile pass complete");

    ProfileReading {
        profile,
        anchors,
        confidences,
    }
}

impl Engine {
    /// Read a governor profile screenshot.
    ///
    /// Missing fields trigger concurrent hunts around their anchors; new
    /// readings join the node set and the pass repeats, up to
    /// `profile_passes` passes or until a hunt round brings nothing back.
    pub async fn analyze_profile(&self, image: &DynamicImage) -> Analysis<GovernorProfile> {
        let recognition = match self.recognizer.recognize(image).await {
            Ok(recognition) => recognition,
            Err(e) => {
                error!(error = %e, "Profile recognition failed");
                return Analysis::failed(format!("[System Error] Failed to recognize profile: {}", e));
            }
        };

        let classifier = self.classifier(ScreenKind::Profile);
        let mut arena = classifier.build_arena(canvas_for(&recognition, image), recognition.detections);
        let reacquirer = self.reacquirer(image);
        let mut warnings = Vec::new();
        let mut pass = 0;

        let reading = loop {
            let reading = interpret_profile(arena.nodes(), &self.vocabulary, &self.config);
            pass += 1;

            if reading.profile.is_complete() || pass >= self.config.retry.profile_passes {
                break reading;
            }

            let hunts = reading.hunts(arena.nodes());
            if hunts.is_empty() {
                break reading;
            }

            let mut found = false;
            for (field, result) in reacquirer.hunt_fields(&hunts).await {
                match result {
                    Ok(detections) if !detections.is_empty() => {
                        info!(?field, count = detections.len(), "Hunt found new readings");
                        classifier.extend_arena(&mut arena, detections);
                        found = true;
                    }
                    Ok(_) => debug!(?field, "Hunt came back empty"),
                    Err(e) => {
                        warn!(?field, error = %e, "Hunt failed");
                        warnings.push(format!("[Re-acquisition] {:?} hunt failed: {}", field, e));
                    }
                }
            }

            if !found {
                break reading;
            }
        };

        let confidence = reading.confidence();
        Analysis::new(reading.profile, warnings, confidence)
    }
}
