//! Deep-learning module adapter (`modul.deep-learning.v2`)
use crate::common;
use crate::dimensions::adapt_dimensions;
use crate::fields::{class_semester, Cursor, Diagnostics};
use crate::timing;
use crate::AdaptContext;
use modul_core::document::{
    AssessmentPlan, CoreStage, DeepLearningModule, GeneralInfo, LearningDesign, MeetingExperience,
    Phase,
};
use modul_core::DocumentVariant;

pub fn adapt(root: Cursor<'_>, ctx: &AdaptContext, diag: &mut Diagnostics) -> DeepLearningModule {
    let general = general_info(root, ctx, diag);

    let identification = root.get("identifikasi");
    let dimensions_node = if identification.get("dpl").is_missing() {
        root.first(&["dimensiProfilLulusan", "dpl"])
    } else {
        identification.get("dpl")
    };
    let dimensions = adapt_dimensions(dimensions_node, "identifikasi.dpl", diag);

    let design = learning_design(root.get("desainPembelajaran"), ctx, diag);

    let experience = root.first(&["pengalamanBelajar", "langkahPembelajaran"]);
    let meetings: Vec<MeetingExperience> = experience
        .items("pengalamanBelajar", diag)
        .into_iter()
        .enumerate()
        .map(|(i, node)| meeting(root, node, i, diag))
        .collect();

    if let Some(budget) = &ctx.budget {
        let durations: Vec<Vec<&str>> = meetings.iter().map(|m| m.durations().to_vec()).collect();
        for warning in timing::audit(&durations, budget) {
            diag.push(warning);
        }
    }

    let assessment_node = if root.get("asesmen").is_missing() {
        root.get("penutup").get("asesmen")
    } else {
        root.get("asesmen")
    };
    let assessment = AssessmentPlan {
        initial: assessment_node.get("awal").text("asesmen.awal", diag),
        process: assessment_node.get("proses").text("asesmen.proses", diag),
        summative: assessment_node
            .first(&["akhir", "sumatif"])
            .text("asesmen.akhir", diag),
        detail: assessment_node.get("detail").markdown("asesmen.detail", diag),
    };

    let signature = common::signature(
        ctx,
        &general.author,
        &format!("Kepala {}", general.school),
        false,
    );

    DeepLearningModule {
        schema_version: DocumentVariant::DeepLearning.schema_id().to_string(),
        general,
        dimensions,
        design,
        meetings,
        assessment,
        rubric: common::rubric(root.get("rubrik"), diag),
        appendix: common::appendix(root.get("lampiran"), diag),
        signature,
    }
}

fn general_info(root: Cursor<'_>, ctx: &AdaptContext, diag: &mut Diagnostics) -> GeneralInfo {
    let info = root.first(&["informasiUmum", "informasi_umum"]);
    let hints = &ctx.hints;

    let class = info
        .get("kelas")
        .text_opt("informasiUmum.kelas", diag)
        .or_else(|| non_blank(&hints.grade));
    let semester = info
        .get("semester")
        .text_opt("informasiUmum.semester", diag)
        .or_else(|| non_blank(&hints.semester));

    let allocation_fallback = ctx
        .budget
        .as_ref()
        .map(|b| b.allocation_label())
        .unwrap_or_default();

    let learners = if info.get("pesertaDidik").is_missing() {
        root.get("identifikasi").get("pesertaDidik")
    } else {
        info.get("pesertaDidik")
    };

    GeneralInfo {
        school: info
            .get("sekolah")
            .text_or("informasiUmum.sekolah", &ctx.school.name, diag),
        author: info
            .first(&["namaPenyusun", "namaGuru"])
            .text_or("informasiUmum.namaPenyusun", &hints.teacher_name, diag),
        subject: info
            .get("mataPelajaran")
            .text_or("informasiUmum.mataPelajaran", &hints.subject, diag),
        class_semester: class_semester(class, semester),
        time_allocation: info
            .get("alokasiWaktu")
            .text_or("informasiUmum.alokasiWaktu", &allocation_fallback, diag),
        learners: learners.text("informasiUmum.pesertaDidik", diag),
        material: info
            .first(&["materiPelajaran", "materi"])
            .text_or("informasiUmum.materiPelajaran", &hints.topic, diag),
    }
}

fn learning_design(node: Cursor<'_>, ctx: &AdaptContext, diag: &mut Diagnostics) -> LearningDesign {
    let hints = &ctx.hints;
    LearningDesign {
        learning_outcome: node
            .get("capaianPembelajaran")
            .markdown("desainPembelajaran.capaianPembelajaran", diag),
        cross_disciplinary: node
            .first(&["lintasDisiplin", "lintasDisiplinIlmu"])
            .text("desainPembelajaran.lintasDisiplin", diag),
        learning_goals: node
            .get("tujuanPembelajaran")
            .markdown("desainPembelajaran.tujuanPembelajaran", diag),
        topic: node
            .first(&["topik", "topikPembelajaran"])
            .text_or("desainPembelajaran.topik", &hints.topic, diag),
        pedagogical_practice: node
            .get("praktikPedagogis")
            .text_or("desainPembelajaran.praktikPedagogis", &hints.practice, diag),
        partnerships: node
            .first(&["kemitraan", "kemitraanPembelajaran"])
            .text("desainPembelajaran.kemitraan", diag),
        environment: node
            .first(&["lingkungan", "lingkunganPembelajaran"])
            .text("desainPembelajaran.lingkungan", diag),
        digital_tools: node
            .first(&["digital", "pemanfaatanDigital"])
            .text("desainPembelajaran.digital", diag),
    }
}

fn meeting(root: Cursor<'_>, node: Cursor<'_>, index: usize, diag: &mut Diagnostics) -> MeetingExperience {
    let path = format!("pengalamanBelajar[{}]", index);
    let core = node.get("inti");

    // older payloads keep a single closing phase at the root
    let closing = if node.get("penutup").is_missing() {
        root.get("penutup")
    } else {
        node.get("penutup")
    };

    MeetingExperience {
        number: node
            .first(&["pertemuan", "pertemuanKe"])
            .number()
            .unwrap_or(index as u32 + 1),
        opening: phase(node.first(&["pendahuluan", "awal"]), &format!("{}.pendahuluan", path), diag),
        understand: stage(core.get("memahami"), &format!("{}.inti.memahami", path), diag),
        apply: stage(core.get("mengaplikasi"), &format!("{}.inti.mengaplikasi", path), diag),
        reflect: stage(core.get("merefleksi"), &format!("{}.inti.merefleksi", path), diag),
        closing: phase(closing, &format!("{}.penutup", path), diag),
    }
}

fn phase(node: Cursor<'_>, path: &str, diag: &mut Diagnostics) -> Phase {
    if !node.is_object() {
        // "pendahuluan": "Guru membuka ..." without principle or duration
        return Phase {
            principle: modul_core::PLACEHOLDER.to_string(),
            description: node.markdown(path, diag),
            duration: modul_core::PLACEHOLDER.to_string(),
        };
    }
    Phase {
        principle: node.get("prinsip").text(&format!("{}.prinsip", path), diag),
        description: node
            .first(&["deskripsi", "kegiatan"])
            .markdown(&format!("{}.deskripsi", path), diag),
        duration: node.get("waktu").text(&format!("{}.waktu", path), diag),
    }
}

fn stage(node: Cursor<'_>, path: &str, diag: &mut Diagnostics) -> CoreStage {
    if !node.is_object() {
        return CoreStage {
            principle: modul_core::PLACEHOLDER.to_string(),
            activities: node.list(path, diag),
            duration: modul_core::PLACEHOLDER.to_string(),
        };
    }
    CoreStage {
        principle: node.get("prinsip").text(&format!("{}.prinsip", path), diag),
        activities: node
            .first(&["kegiatan", "deskripsi"])
            .list(&format!("{}.kegiatan", path), diag),
        duration: node.get("waktu").text(&format!("{}.waktu", path), diag),
    }
}

fn non_blank(s: &str) -> Option<String> {
    Some(s.trim().to_string()).filter(|s| !s.is_empty())
}
