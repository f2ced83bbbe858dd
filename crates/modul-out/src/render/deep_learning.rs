use super::{
    appendix_blocks, duration_cell, field_table, identity_table, profile_blocks, rubric_blocks,
    text_blocks,
};
use crate::markdown;
use crate::view::{Block, Cell, Row, Table, TableClass};
use modul_core::document::{CoreStage, DeepLearningModule, MeetingExperience, Phase};

const MEETING_COLUMNS: [&str; 4] = ["Tahap", "Prinsip", "Kegiatan", "Waktu"];

pub(super) fn blocks(doc: &DeepLearningModule) -> Vec<Block> {
    let general = &doc.general;
    let mut blocks = vec![
        Block::HeaderImage,
        Block::Title {
            text: "MODUL AJAR DEEP LEARNING".to_string(),
            subtitle: Some(format!("MATA PELAJARAN : {}", general.subject.to_uppercase())),
        },
        Block::heading(2, "A. INFORMASI UMUM"),
        Block::Table(identity_table(&[
            ("Satuan Pendidikan", general.school.as_str()),
            ("Nama Penyusun", general.author.as_str()),
            ("Mata Pelajaran", general.subject.as_str()),
            ("Kelas / Semester", general.class_semester.as_str()),
            ("Alokasi Waktu", general.time_allocation.as_str()),
        ])),
        Block::heading(2, "B. IDENTIFIKASI"),
        Block::Table(field_table(&[
            ("Peserta Didik", general.learners.as_str()),
            ("Materi Pelajaran", general.material.as_str()),
        ])),
        Block::heading(3, "Dimensi Profil Lulusan"),
    ];
    blocks.extend(profile_blocks(&doc.dimensions));

    blocks.push(Block::heading(2, "C. DESAIN PEMBELAJARAN"));
    blocks.push(Block::Table(field_table(&doc.design.rows())));

    blocks.push(Block::heading(2, "D. PENGALAMAN BELAJAR"));
    if doc.meetings.is_empty() {
        blocks.push(Block::Table(meeting_table(&MeetingExperience::default(), 1)));
    }
    for meeting in &doc.meetings {
        blocks.push(Block::Table(meeting_table(meeting, meeting.number)));
    }

    let assessment = &doc.assessment;
    blocks.push(Block::heading(2, "E. ASESMEN PEMBELAJARAN"));
    blocks.push(Block::Table(field_table(&[
        ("Asesmen Awal", assessment.initial.as_str()),
        ("Asesmen Proses", assessment.process.as_str()),
        ("Asesmen Akhir", assessment.summative.as_str()),
    ])));
    blocks.extend(text_blocks(&assessment.detail));

    blocks.extend(rubric_blocks(&doc.rubric, "F. RUBRIK PENILAIAN"));
    blocks.extend(appendix_blocks(&doc.appendix, "LAMPIRAN"));
    blocks.push(Block::Signature(doc.signature.clone()));
    blocks
}

fn meeting_table(meeting: &MeetingExperience, number: u32) -> Table {
    let columns = MEETING_COLUMNS.len();
    let mut table = Table::new(TableClass::Content, vec![18, 17, 50, 15]);
    table
        .header
        .push(Row::spanning(Cell::strong(format!("Pertemuan {}", number)), columns));
    table.header.push(Row::new(MEETING_COLUMNS.iter().map(|l| Cell::strong(*l)).collect()));

    table.push(phase_row("Awal", &meeting.opening));
    table.push(Row::spanning(Cell::strong("Inti"), columns));
    table.push(stage_row("Memahami", &meeting.understand));
    table.push(stage_row("Mengaplikasi", &meeting.apply));
    table.push(stage_row("Merefleksi", &meeting.reflect));
    table.push(phase_row("Penutup", &meeting.closing));
    table
}

fn phase_row(label: &str, phase: &Phase) -> Row {
    Row::new(vec![
        Cell::strong(label),
        Cell::text(or_dash(&phase.principle)),
        Cell::lines(markdown::cell_lines(&phase.description)),
        duration_cell(or_dash(&phase.duration)),
    ])
}

fn stage_row(label: &str, stage: &CoreStage) -> Row {
    Row::new(vec![
        Cell::strong(label),
        Cell::text(or_dash(&stage.principle)),
        Cell::bulleted(&stage.activities),
        duration_cell(or_dash(&stage.duration)),
    ])
}

/// Default-constructed models hold empty strings rather than the placeholder.
fn or_dash(text: &str) -> &str {
    if text.trim().is_empty() {
        modul_core::PLACEHOLDER
    } else {
        text
    }
}
