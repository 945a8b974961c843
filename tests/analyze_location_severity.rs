// tests/analyze_location_severity.rs
//
// Location resolution, severity/status priority and near-duplicate collapse
// against the shipped lexicon.

use fire_incident_monitor::analyze::{dedupe, Severity, Status, UNRESOLVED_CONFIDENCE};
use fire_incident_monitor::config::keywords::Lexicon;
use fire_incident_monitor::gazetteer::{self, DEFAULT_LATITUDE, DEFAULT_LONGITUDE, UNKNOWN_REGION};
use fire_incident_monitor::incident::build_incident;
use fire_incident_monitor::ingest::types::Candidate;

fn cand(title: &str, summary: &str, confidence: f64) -> Candidate {
    Candidate::new(title, "https://news.dz/a", summary, "Recent", "News", confidence)
        .expect("title long enough")
}

#[test]
fn gazetteer_has_every_wilaya_once() {
    let regions = gazetteer::regions();
    assert_eq!(regions.len(), 58);
    for (i, r) in regions.iter().enumerate() {
        assert_eq!(usize::from(r.code), i + 1);
        assert!((-90.0..=90.0).contains(&r.latitude));
        assert!((-180.0..=180.0).contains(&r.longitude));
    }
    assert_eq!(gazetteer::find("setif").map(|r| r.code), Some(19));
}

#[test]
fn summary_mention_of_canonical_name() {
    let loc = &Lexicon::builtin().locator;
    let (name, conf) = loc.resolve_name("Vague de chaleur", "Températures record à Annaba");
    assert_eq!(name, Some("Annaba"));
    assert!(conf >= 0.7);
}

#[test]
fn title_mention_scores_higher() {
    let loc = &Lexicon::builtin().locator;
    let (name, conf) = loc.resolve_name("Incendie à Annaba", "");
    assert_eq!(name, Some("Annaba"));
    assert!(conf >= 0.9);
    assert!(conf <= 1.0);
}

#[test]
fn alternate_script_resolves_to_canonical() {
    let loc = &Lexicon::builtin().locator;
    let (name, _) = loc.resolve_name("حريق في تلمسان", "");
    assert_eq!(name, Some("Tlemcen"));
}

#[test]
fn no_region_mentioned() {
    let loc = &Lexicon::builtin().locator;
    assert_eq!(loc.resolve_name("Météo clémente", "Rien à signaler"), (None, 0.0));
}

#[test]
fn unresolved_incident_uses_default_location() {
    let inc = build_incident(
        cand("Incendie dans un entrepôt", "Aucun lieu précisé", 0.8),
        Lexicon::builtin(),
    );
    assert_eq!(inc.location.wilaya, UNKNOWN_REGION);
    assert_eq!(inc.location.wilaya_code, None);
    assert_eq!(inc.location.lat, DEFAULT_LATITUDE);
    assert_eq!(inc.location.lon, DEFAULT_LONGITUDE);
    assert_eq!(inc.confidence, UNRESOLVED_CONFIDENCE);
}

#[test]
fn severity_takes_highest_matching_tier() {
    let c = &Lexicon::builtin().classifier;
    assert_eq!(
        c.classify_severity("Les pompiers ordonnent une évacuation", ""),
        Severity::Critical
    );
    assert_eq!(c.classify_severity("Les pompiers interviennent", ""), Severity::High);
    assert_eq!(c.classify_severity("Petit départ de feu", ""), Severity::Medium);
}

#[test]
fn contained_wins_over_under_control() {
    let c = &Lexicon::builtin().classifier;
    assert_eq!(c.classify_status("Incendie maîtrisé", ""), Status::Contained);
    assert_eq!(c.classify_status("Feu sous contrôle", ""), Status::UnderControl);
    // listed in both sets
    assert_eq!(c.classify_status("الحريق تحت السيطرة", ""), Status::Contained);
    assert_eq!(c.classify_status("Le feu progresse", ""), Status::Active);
    assert_eq!(serde_json::to_value(Status::UnderControl).unwrap(), "Under Control");
}

#[test]
fn near_duplicates_collapse_to_best_prior() {
    let out = dedupe(vec![
        cand("Incendie de forêt à Tipaza ce matin", "", 0.7),
        cand("Incendie de forêt à Tipaza ce matin", "", 0.9),
        cand("Incendie de forêt à Tipaza ce soir", "", 0.8),
        cand("Feu de broussailles près de Médéa", "", 0.8),
    ]);
    // 7 words each; "matin" vs "soir" leaves 6/7 > 0.8 overlap
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].confidence, 0.9);
    assert_eq!(out[1].title, "Feu de broussailles près de Médéa");
}

#[test]
fn half_overlap_titles_both_survive() {
    let out = dedupe(vec![
        cand("Incendie violent près Tipaza", "", 0.8),
        cand("Incendie violent vers Oran", "", 0.9),
    ]);
    // 2 shared words out of 4: at the 0.5 mark, well under the 0.8 cut
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].title, "Incendie violent vers Oran");
    assert_eq!(out[1].title, "Incendie violent près Tipaza");
}
