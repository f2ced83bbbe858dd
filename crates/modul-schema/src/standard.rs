//! Standard module adapter (`modul.standard.v3`)
use crate::common;
use crate::dimensions::adapt_dimensions;
use crate::fields::{class_semester, Cursor, Diagnostics};
use crate::timing;
use crate::AdaptContext;
use chrono::Datelike;
use modul_core::document::{
    ActivityStep, AssessmentRow, CoreCompetence, Facilities, Identity, LearningModel,
    MeetingActivities, NeedsMapping, NeedsRow, SocialEmotionalCompetence, StandardModule,
};
use modul_core::{DocumentVariant, PLACEHOLDER};
use serde_json::Value;

pub fn adapt(root: Cursor<'_>, ctx: &AdaptContext, diag: &mut Diagnostics) -> StandardModule {
    let info = root.first(&["informasiUmum", "informasi_umum"]);
    let identity = identity(info.get("identitas"), ctx, diag);

    let profile = adapt_dimensions(
        info.first(&["profilPelajarPancasila", "dimensiProfilLulusan"]),
        "informasiUmum.profilPelajarPancasila",
        diag,
    );

    let core_node = root.get("kompetensiInti");
    let activities = activities(core_node.get("kegiatanPembelajaran"), diag);

    if let Some(budget) = &ctx.budget {
        let durations: Vec<Vec<&str>> = activities
            .iter()
            .map(|m| m.steps.iter().map(|s| s.duration.as_str()).collect())
            .collect();
        for warning in timing::audit(&durations, budget) {
            diag.push(warning);
        }
    }

    let signature = common::signature(ctx, &identity.author, "Kepala Sekolah", true);

    StandardModule {
        schema_version: DocumentVariant::StandardModule.schema_id().to_string(),
        initial_competence: info
            .get("kompetensiAwal")
            .markdown("informasiUmum.kompetensiAwal", diag),
        profile,
        needs_mapping: needs_mapping(info.get("pemetaanKebutuhanBelajar"), diag),
        social_emotional: social_emotional(info.get("kompetensiSosialEmosional"), diag),
        facilities: facilities(info.get("saranaPrasarana"), ctx, diag),
        learning_model: learning_model(info.get("modelPembelajaran"), ctx, diag),
        core: core_competence(core_node, ctx, diag),
        activities,
        assessments: assessments(core_node.get("asesmen"), diag),
        rubric: common::rubric(root.get("rubrik"), diag),
        appendix: common::appendix(root.get("lampiran"), diag),
        signature,
        identity,
    }
}

fn identity(node: Cursor<'_>, ctx: &AdaptContext, diag: &mut Diagnostics) -> Identity {
    let hints = &ctx.hints;
    let budget = ctx.budget.as_ref();

    let class = node
        .get("kelas")
        .text_opt("identitas.kelas", diag)
        .or_else(|| Some(hints.grade.clone()).filter(|s| !s.is_empty()));
    let semester = node
        .get("semester")
        .text_opt("identitas.semester", diag)
        .or_else(|| Some(hints.semester.clone()).filter(|s| !s.is_empty()));

    let allocation = budget
        .map(|b| format!("total {} menit", b.total_minutes()))
        .unwrap_or_default();
    let meetings = budget.map(|b| b.meetings.to_string()).unwrap_or_default();
    let hours = budget
        .map(|b| format!("{} JP", b.hours_per_meeting))
        .unwrap_or_default();

    Identity {
        author: node
            .first(&["namaPenyusun", "namaGuru"])
            .text_or("identitas.namaPenyusun", &hints.teacher_name, diag),
        school: node
            .first(&["satuanPendidikan", "sekolah"])
            .text_or("identitas.satuanPendidikan", &ctx.school.name, diag),
        year: node
            .get("tahunPenyusunan")
            .text_or("identitas.tahunPenyusunan", &ctx.today.year().to_string(), diag),
        subject: node
            .get("mataPelajaran")
            .text_or("identitas.mataPelajaran", &hints.subject, diag),
        class_semester: class_semester(class, semester),
        material: node
            .first(&["materi", "materiPelajaran"])
            .text_or("identitas.materi", &hints.topic, diag),
        time_allocation: node
            .get("alokasiWaktu")
            .text_or("identitas.alokasiWaktu", &allocation, diag),
        meeting_count: node
            .get("jumlahPertemuan")
            .text_or("identitas.jumlahPertemuan", &meetings, diag),
        hours_per_meeting: node
            .get("jamPerPertemuan")
            .text_or("identitas.jamPerPertemuan", &hours, diag),
    }
}

fn needs_mapping(node: Cursor<'_>, diag: &mut Diagnostics) -> NeedsMapping {
    const PATH: &str = "informasiUmum.pemetaanKebutuhanBelajar";
    match node.value() {
        Value::Null => NeedsMapping::Absent,
        Value::Array(_) => NeedsMapping::Table {
            rows: node
                .items(PATH, diag)
                .into_iter()
                .map(|row| {
                    if row.is_object() {
                        NeedsRow {
                            category: row.first(&["kategori", "aspek"]).text(PATH, diag),
                            description: row.get("deskripsi").text(PATH, diag),
                            strategy: row.get("strategi").text(PATH, diag),
                        }
                    } else {
                        NeedsRow {
                            category: PLACEHOLDER.to_string(),
                            description: row.text(PATH, diag),
                            strategy: PLACEHOLDER.to_string(),
                        }
                    }
                })
                .collect(),
        },
        Value::Object(_) => NeedsMapping::Summary {
            identification: node
                .first(&["identifikasi", "identifikasiKebutuhan"])
                .markdown(PATH, diag),
            result: node
                .first(&["hasilPemetaan", "hasil"])
                .markdown(PATH, diag),
        },
        Value::String(s) if s.trim().is_empty() => NeedsMapping::Absent,
        _ => NeedsMapping::Summary {
            identification: node.text(PATH, diag),
            result: PLACEHOLDER.to_string(),
        },
    }
}

fn social_emotional(node: Cursor<'_>, diag: &mut Diagnostics) -> Vec<SocialEmotionalCompetence> {
    const PATH: &str = "informasiUmum.kompetensiSosialEmosional";
    if let Value::String(_) = node.value() {
        return node
            .list(PATH, diag)
            .into_iter()
            .map(|competence| SocialEmotionalCompetence {
                competence,
                description: PLACEHOLDER.to_string(),
            })
            .collect();
    }
    node.items(PATH, diag)
        .into_iter()
        .map(|item| {
            if item.is_object() {
                SocialEmotionalCompetence {
                    competence: item.first(&["kompetensi", "nama"]).text(PATH, diag),
                    description: item.get("deskripsi").text(PATH, diag),
                }
            } else {
                SocialEmotionalCompetence {
                    competence: item.text(PATH, diag),
                    description: PLACEHOLDER.to_string(),
                }
            }
        })
        .collect()
}

fn facilities(node: Cursor<'_>, ctx: &AdaptContext, diag: &mut Diagnostics) -> Facilities {
    if let Value::String(text) = node.value() {
        // one free-text line instead of the three lists
        return Facilities {
            note: text.trim().to_string(),
            ..Facilities::default()
        };
    }
    let note = node
        .get("catatanTambahan")
        .text_opt("saranaPrasarana.catatanTambahan", diag)
        .unwrap_or_else(|| ctx.hints.facilities.clone());
    Facilities {
        media: node.get("media").list("saranaPrasarana.media", diag),
        tools: node.get("alat").list("saranaPrasarana.alat", diag),
        sources: node
            .first(&["sumberBelajar", "sumber"])
            .list("saranaPrasarana.sumberBelajar", diag),
        note,
    }
}

fn learning_model(node: Cursor<'_>, ctx: &AdaptContext, diag: &mut Diagnostics) -> LearningModel {
    const PATH: &str = "informasiUmum.modelPembelajaran";
    if node.is_object() {
        return LearningModel::Structured {
            mode: node.get("moda").text(PATH, diag),
            approach: node.get("pendekatan").text(PATH, diag),
            model: node.get("model").text_or(PATH, &ctx.hints.practice, diag),
            method: node.get("metode").text(PATH, diag),
        };
    }
    LearningModel::Plain {
        text: node.text_or(PATH, &ctx.hints.practice, diag),
    }
}

fn core_competence(node: Cursor<'_>, ctx: &AdaptContext, diag: &mut Diagnostics) -> CoreCompetence {
    let goals_node = node.get("tujuanPembelajaran");
    let (goals_intro, goals) = if goals_node.is_object() {
        (
            goals_node
                .first(&["pendahuluan", "pengantar"])
                .text_opt("kompetensiInti.tujuanPembelajaran.pendahuluan", diag)
                .unwrap_or_default(),
            goals_node
                .first(&["tujuan", "daftar"])
                .list("kompetensiInti.tujuanPembelajaran.tujuan", diag),
        )
    } else {
        (
            String::new(),
            goals_node.list("kompetensiInti.tujuanPembelajaran", diag),
        )
    };

    CoreCompetence {
        phase: node
            .first(&["faseCP", "fase"])
            .text_or("kompetensiInti.faseCP", &ctx.hints.grade, diag),
        element: node
            .get("elemen")
            .text_or("kompetensiInti.elemen", &ctx.hints.element, diag),
        learning_outcome: node
            .get("capaianPembelajaran")
            .markdown("kompetensiInti.capaianPembelajaran", diag),
        material: node
            .get("materiPembelajaran")
            .markdown("kompetensiInti.materiPembelajaran", diag),
        competence: node
            .get("kompetensi")
            .markdown("kompetensiInti.kompetensi", diag),
        goals_intro,
        goals,
        meaningful_understanding: node
            .get("pemahamanBermakna")
            .markdown("kompetensiInti.pemahamanBermakna", diag),
        trigger_questions: node
            .get("pertanyaanPemantik")
            .list("kompetensiInti.pertanyaanPemantik", diag),
    }
}

/// Per-meeting steps, or a flat step list treated as a single meeting.
fn activities(node: Cursor<'_>, diag: &mut Diagnostics) -> Vec<MeetingActivities> {
    const PATH: &str = "kompetensiInti.kegiatanPembelajaran";
    let items = node.items(PATH, diag);
    let per_meeting = items
        .first()
        .is_some_and(|first| !first.get("langkah").is_missing());

    if !per_meeting {
        if items.is_empty() {
            return Vec::new();
        }
        let steps = items
            .into_iter()
            .enumerate()
            .map(|(i, step)| activity_step(step, &format!("{}[{}]", PATH, i), diag))
            .collect();
        return vec![MeetingActivities { number: 1, steps }];
    }

    items
        .into_iter()
        .enumerate()
        .map(|(i, meeting)| {
            let path = format!("{}[{}].langkah", PATH, i);
            MeetingActivities {
                number: meeting
                    .first(&["pertemuan", "pertemuanKe"])
                    .number()
                    .unwrap_or(i as u32 + 1),
                steps: meeting
                    .get("langkah")
                    .items(&path, diag)
                    .into_iter()
                    .enumerate()
                    .map(|(j, step)| activity_step(step, &format!("{}[{}]", path, j), diag))
                    .collect(),
            }
        })
        .collect()
}

fn activity_step(node: Cursor<'_>, path: &str, diag: &mut Diagnostics) -> ActivityStep {
    if !node.is_object() {
        return ActivityStep {
            stage: PLACEHOLDER.to_string(),
            activities: node.list(path, diag),
            duration: PLACEHOLDER.to_string(),
        };
    }
    ActivityStep {
        stage: node.first(&["tahap", "sintaks", "nama"]).text(path, diag),
        activities: node
            .first(&["kegiatan", "deskripsi"])
            .list(&format!("{}.kegiatan", path), diag),
        duration: node.get("waktu").text(&format!("{}.waktu", path), diag),
    }
}

fn assessments(node: Cursor<'_>, diag: &mut Diagnostics) -> Vec<AssessmentRow> {
    const PATH: &str = "kompetensiInti.asesmen";
    match node.value() {
        Value::Object(map) if !map.contains_key("jenis") && !map.contains_key("teknik") => {
            // {"diagnostik": "...", "formatif": {...}} keyed by kind
            map.iter()
                .map(|(kind, value)| {
                    let row = Cursor::new(value);
                    if row.is_object() {
                        AssessmentRow {
                            kind: kind.clone(),
                            technique: row.get("teknik").text(PATH, diag),
                            instrument: row.get("instrumen").text(PATH, diag),
                        }
                    } else {
                        AssessmentRow {
                            kind: kind.clone(),
                            technique: row.text(PATH, diag),
                            instrument: PLACEHOLDER.to_string(),
                        }
                    }
                })
                .collect()
        }
        _ => node
            .items(PATH, diag)
            .into_iter()
            .map(|row| AssessmentRow {
                kind: row.first(&["jenis", "asesmen"]).text(PATH, diag),
                technique: row.get("teknik").text(PATH, diag),
                instrument: row.get("instrumen").text(PATH, diag),
            })
            .collect(),
    }
}
