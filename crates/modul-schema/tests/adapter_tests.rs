//! Adapter behavior over recorded and deliberately odd payloads.

use chrono::NaiveDate;
use modul_core::document::ProfileDimensions;
use modul_core::{AdapterWarning, DocumentModel, DocumentVariant, FormInput, Payload, TimeBudget};
use modul_schema::{adapt, empty_model, AdaptContext};
use serde_json::{json, Value};

fn fixture(name: &str) -> String {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let path = std::path::Path::new(&manifest_dir)
        .join("../../testing/fixtures/payloads")
        .join(name);
    std::fs::read_to_string(path).unwrap()
}

fn json_fixture(name: &str) -> Value {
    serde_json::from_str(&fixture(name)).unwrap()
}

fn budi_form() -> FormInput {
    FormInput {
        teacher_name: "Budi".into(),
        subject: "Matematika".into(),
        grade: "Kelas X (Fase E)".into(),
        semester: "Ganjil".into(),
        topic: "Persamaan Kuadrat".into(),
        meetings: "2".into(),
        hours_per_meeting: "2".into(),
        duration: "45".into(),
        ..Default::default()
    }
}

fn budi_ctx() -> AdaptContext {
    AdaptContext::new(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap())
        .with_form(&budi_form())
        .with_budget(TimeBudget {
            meetings: 2,
            hours_per_meeting: 2,
            minutes_per_hour: 45,
        })
}

// ============================================================================
// Recorded payloads
// ============================================================================

#[test]
fn test_deep_learning_fixture_adapts_cleanly() {
    let payload = Payload::Json(json_fixture("deep_learning_budi.json"));
    let adapted = adapt(&payload, DocumentVariant::DeepLearning, &budi_ctx());

    assert!(adapted.warnings.is_empty(), "{:?}", adapted.warnings);
    let DocumentModel::DeepLearning(module) = adapted.model else {
        panic!("wrong variant");
    };
    assert_eq!(module.dimensions.len(), 2);
    assert!(matches!(module.dimensions, ProfileDimensions::Described(_)));
    assert_eq!(module.meetings.len(), 2);
    assert_eq!(module.general.class_semester, "Kelas X (Fase E) / Ganjil");
    assert_eq!(module.rubric.indicators.len(), 2);
    assert_eq!(module.appendix.glossary, "- Akar: Nilai x yang memenuhi persamaan");
    assert_eq!(module.signature.right.name, "Budi");
}

#[test]
fn test_standard_fixture_adapts_cleanly() {
    let payload = Payload::Json(json_fixture("standard_budi.json"));
    let adapted = adapt(&payload, DocumentVariant::StandardModule, &budi_ctx());

    assert!(adapted.warnings.is_empty(), "{:?}", adapted.warnings);
    let DocumentModel::StandardModule(module) = adapted.model else {
        panic!("wrong variant");
    };
    assert_eq!(module.identity.author, "Budi");
    assert_eq!(module.profile.len(), 2);
    assert_eq!(module.activities.len(), 2);
    assert_eq!(module.activities[0].steps.len(), 7);
    assert_eq!(module.assessments.len(), 3);
    assert_eq!(module.core.goals, vec!["Menentukan akar persamaan kuadrat", "Memodelkan masalah kontekstual"]);
}

#[test]
fn test_legacy_text() {
    let payload = Payload::Text("| Mata Pelajaran | Matematika |\n\nIsi modul".into());
    let adapted = adapt(&payload, DocumentVariant::Legacy, &budi_ctx());
    assert_eq!(adapted.model.subject(), "Matematika");
}

// ============================================================================
// Totality
// ============================================================================

#[test]
fn test_odd_roots_never_panic() {
    let ctx = budi_ctx();
    let roots = vec![
        json!({}),
        json!(null),
        json!([]),
        json!([{"informasiUmum": {}}]),
        json!("teks"),
        json!(42),
        json!({"informasiUmum": "bukan objek", "pengalamanBelajar": 3, "rubrik": []}),
        json!({"kompetensiInti": {"kegiatanPembelajaran": "tidak ada", "asesmen": 7}}),
    ];

    for root in roots {
        for variant in DocumentVariant::ALL {
            let adapted = adapt(&Payload::Json(root.clone()), variant, &ctx);
            assert_eq!(adapted.model.variant(), variant);
        }
    }
}

#[test]
fn test_non_object_root_is_reported() {
    let adapted = adapt(&Payload::Json(json!([1, 2])), DocumentVariant::DeepLearning, &budi_ctx());
    assert!(adapted
        .warnings
        .contains(&AdapterWarning::RootNotObject { found: "array".into() }));

    let adapted = adapt(&Payload::Text("halo".into()), DocumentVariant::StandardModule, &budi_ctx());
    assert!(adapted
        .warnings
        .contains(&AdapterWarning::RootNotObject { found: "text".into() }));
}

#[test]
fn test_empty_model_uses_form_identity() {
    let model = empty_model(DocumentVariant::StandardModule, &budi_ctx());
    assert_eq!(model.subject(), "Matematika");

    let model = empty_model(DocumentVariant::DeepLearning, &budi_ctx());
    let DocumentModel::DeepLearning(module) = model else {
        panic!("wrong variant");
    };
    assert_eq!(module.general.author, "Budi");
    assert_eq!(module.general.time_allocation, "2 JP x 2 pertemuan (180 menit)");
}

// ============================================================================
// Shapes and warnings
// ============================================================================

#[test]
fn test_listed_dimensions_from_strings() {
    let payload = Payload::Json(json!({"identifikasi": {"dpl": ["Kreativitas", "Kolaborasi"]}}));
    let adapted = adapt(&payload, DocumentVariant::DeepLearning, &budi_ctx());
    let DocumentModel::DeepLearning(module) = adapted.model else {
        panic!("wrong variant");
    };
    assert_eq!(
        module.dimensions,
        ProfileDimensions::Listed(vec!["Kreativitas".into(), "Kolaborasi".into()])
    );
}

#[test]
fn test_unknown_schema_version_is_a_warning() {
    let mut payload = json_fixture("deep_learning_budi.json");
    payload["schemaVersion"] = json!("modul.deep-learning.v9");
    let adapted = adapt(&Payload::Json(payload), DocumentVariant::DeepLearning, &budi_ctx());

    assert_eq!(
        adapted.warnings,
        vec![AdapterWarning::UnknownSchemaVersion {
            found: "modul.deep-learning.v9".into(),
            expected: "modul.deep-learning.v2".into()
        }]
    );
    assert_eq!(adapted.model.subject(), "Matematika");
}

#[test]
fn test_time_mismatch_is_reported_not_fixed() {
    let mut payload = json_fixture("deep_learning_budi.json");
    payload["pengalamanBelajar"][1]["penutup"]["waktu"] = json!("25 menit");
    let adapted = adapt(&Payload::Json(payload), DocumentVariant::DeepLearning, &budi_ctx());

    assert!(adapted.warnings.contains(&AdapterWarning::TimeAllocationMismatch {
        scope: "Pertemuan 2".into(),
        expected: 90,
        actual: 105
    }));
    assert!(adapted.warnings.contains(&AdapterWarning::TimeAllocationMismatch {
        scope: "Total".into(),
        expected: 180,
        actual: 195
    }));
    let DocumentModel::DeepLearning(module) = adapted.model else {
        panic!("wrong variant");
    };
    assert_eq!(module.meetings[1].closing.duration, "25 menit");
}

#[test]
fn test_huge_durations_do_not_overflow() {
    let payload = Payload::Json(json!({
        "pengalamanBelajar": [{
            "pendahuluan": { "waktu": "4000000000 menit" },
            "penutup": { "waktu": "4000000000 menit" }
        }]
    }));
    let ctx = budi_ctx().with_budget(TimeBudget {
        meetings: 1,
        hours_per_meeting: 2,
        minutes_per_hour: 45,
    });
    let adapted = adapt(&payload, DocumentVariant::DeepLearning, &ctx);

    assert!(adapted.warnings.contains(&AdapterWarning::TimeAllocationMismatch {
        scope: "Pertemuan 1".into(),
        expected: 90,
        actual: u32::MAX
    }));
}

#[test]
fn test_single_strings_become_lists() {
    let payload = Payload::Json(json!({
        "kompetensiInti": {
            "pertanyaanPemantik": "Mengapa bola jatuh?",
            "kegiatanPembelajaran": [{"pertemuan": 1, "langkah": [{"tahap": "Inti", "kegiatan": "Diskusi"}]}]
        }
    }));
    let adapted = adapt(&payload, DocumentVariant::StandardModule, &AdaptContext::new(
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
    ));
    let DocumentModel::StandardModule(module) = adapted.model else {
        panic!("wrong variant");
    };
    assert_eq!(module.core.trigger_questions, vec!["Mengapa bola jatuh?"]);
    assert_eq!(module.activities[0].steps[0].activities, vec!["Diskusi"]);
    assert_eq!(module.activities[0].steps[0].duration, "-");
}

#[test]
fn test_adapted_serializes_warnings_with_kind() {
    let adapted = adapt(&Payload::Json(json!(1)), DocumentVariant::DeepLearning, &budi_ctx());
    let value = serde_json::to_value(&adapted).unwrap();
    assert_eq!(value["warnings"][0]["kind"], "root_not_object");
    assert_eq!(value["model"]["variant"], "deepLearning");
}
