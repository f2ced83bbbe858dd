use super::{
    appendix_blocks, duration_cell, field_table, identity_table, profile_blocks, rubric_blocks,
    text_blocks,
};
use crate::markdown;
use crate::view::{Block, Cell, Row, Table, TableClass};
use modul_core::document::{
    AssessmentRow, LearningModel, MeetingActivities, NeedsMapping, StandardModule,
};
use modul_core::PLACEHOLDER;

pub(super) fn blocks(doc: &StandardModule) -> Vec<Block> {
    let mut blocks = vec![
        Block::HeaderImage,
        Block::Title {
            text: "MODUL AJAR".to_string(),
            subtitle: Some(format!("MATERI {}", doc.identity.material.to_uppercase())),
        },
        Block::heading(2, "I. INFORMASI UMUM"),
        Block::heading(3, "A. Identitas Modul"),
        Block::Table(identity_table(&doc.identity.rows())),
        Block::heading(3, "B. Kompetensi Awal"),
    ];
    blocks.extend(text_blocks(&doc.initial_competence));

    blocks.push(Block::heading(3, "C. Profil Pelajar Pancasila"));
    blocks.extend(profile_blocks(&doc.profile));

    blocks.push(Block::heading(3, "D. Pemetaan Kebutuhan Belajar"));
    blocks.push(needs_block(&doc.needs_mapping));

    blocks.push(Block::heading(3, "E. Kompetensi Sosial Emosional"));
    let mut social =
        Table::new(TableClass::Content, vec![30, 70]).with_header(["Kompetensi", "Deskripsi"]);
    for item in &doc.social_emotional {
        social.push(Row::new(vec![
            Cell::strong(item.competence.as_str()),
            Cell::lines(markdown::cell_lines(&item.description)),
        ]));
    }
    blocks.push(table_or_dash(social));

    let facilities = &doc.facilities;
    blocks.push(Block::heading(3, "F. Sarana dan Prasarana"));
    let mut table = Table::new(TableClass::Content, vec![30, 70]);
    table.push(Row::new(vec![Cell::strong("Media"), Cell::bulleted(&facilities.media)]));
    table.push(Row::new(vec![Cell::strong("Alat"), Cell::bulleted(&facilities.tools)]));
    table.push(Row::new(vec![
        Cell::strong("Sumber Belajar"),
        Cell::bulleted(&facilities.sources),
    ]));
    if !facilities.note.trim().is_empty() {
        table.push(Row::new(vec![
            Cell::strong("Catatan"),
            Cell::lines(markdown::cell_lines(&facilities.note)),
        ]));
    }
    blocks.push(Block::Table(table));

    blocks.push(Block::heading(3, "G. Model Pembelajaran"));
    blocks.push(match &doc.learning_model {
        LearningModel::Structured {
            mode,
            approach,
            model,
            method,
        } => Block::Table(identity_table(&[
            ("Moda", mode.as_str()),
            ("Pendekatan", approach.as_str()),
            ("Model", model.as_str()),
            ("Metode", method.as_str()),
        ])),
        LearningModel::Plain { text } => Block::paragraph(text.as_str()),
    });

    let core = &doc.core;
    blocks.push(Block::heading(2, "II. KOMPETENSI INTI"));
    blocks.push(Block::Table(field_table(&[
        ("Fase", core.phase.as_str()),
        ("Elemen", core.element.as_str()),
        ("Capaian Pembelajaran", core.learning_outcome.as_str()),
        ("Materi Pembelajaran", core.material.as_str()),
        ("Kompetensi", core.competence.as_str()),
    ])));

    blocks.push(Block::heading(3, "A. Tujuan Pembelajaran"));
    if !core.goals_intro.is_empty() {
        blocks.push(Block::paragraph(core.goals_intro.as_str()));
    }
    blocks.push(ordered_or_dash(&core.goals));

    blocks.push(Block::heading(3, "B. Pemahaman Bermakna"));
    blocks.extend(text_blocks(&core.meaningful_understanding));

    blocks.push(Block::heading(3, "C. Pertanyaan Pemantik"));
    blocks.push(ordered_or_dash(&core.trigger_questions));

    blocks.push(Block::heading(3, "D. Kegiatan Pembelajaran"));
    if doc.activities.is_empty() {
        blocks.push(Block::Table(activity_table(&MeetingActivities {
            number: 1,
            steps: Vec::new(),
        })));
    }
    for meeting in &doc.activities {
        blocks.push(Block::Table(activity_table(meeting)));
    }

    blocks.push(Block::heading(3, "E. Asesmen"));
    blocks.push(Block::Table(assessment_table(&doc.assessments)));

    blocks.extend(rubric_blocks(&doc.rubric, "III. RUBRIK PENILAIAN"));
    blocks.extend(appendix_blocks(&doc.appendix, "IV. LAMPIRAN"));
    blocks.push(Block::Signature(doc.signature.clone()));
    blocks
}

fn needs_block(mapping: &NeedsMapping) -> Block {
    match mapping {
        NeedsMapping::Summary {
            identification,
            result,
        } => Block::Table(field_table(&[
            ("Identifikasi", identification.as_str()),
            ("Hasil Pemetaan", result.as_str()),
        ])),
        NeedsMapping::Table { rows } => {
            let mut table = Table::new(TableClass::Content, vec![20, 40, 40])
                .with_header(["Kategori", "Deskripsi", "Strategi"]);
            for row in rows {
                table.push(Row::new(vec![
                    Cell::strong(row.category.as_str()),
                    Cell::lines(markdown::cell_lines(&row.description)),
                    Cell::lines(markdown::cell_lines(&row.strategy)),
                ]));
            }
            table_or_dash(table)
        }
        NeedsMapping::Absent => Block::paragraph(PLACEHOLDER),
    }
}

fn activity_table(meeting: &MeetingActivities) -> Table {
    let mut table = Table::new(TableClass::Content, vec![25, 60, 15]);
    table
        .header
        .push(Row::spanning(Cell::strong(format!("Pertemuan {}", meeting.number)), 3));
    table
        .header
        .push(Row::new(vec![Cell::strong("Tahap"), Cell::strong("Kegiatan"), Cell::strong("Waktu")]));

    if meeting.steps.is_empty() {
        table.push(Row::new(vec![
            Cell::text(PLACEHOLDER),
            Cell::text(PLACEHOLDER),
            Cell::text(PLACEHOLDER),
        ]));
    }
    for step in &meeting.steps {
        table.push(Row::new(vec![
            Cell::strong(step.stage.as_str()),
            Cell::numbered(&step.activities),
            duration_cell(&step.duration),
        ]));
    }
    table
}

fn assessment_table(rows: &[AssessmentRow]) -> Table {
    let mut table = Table::new(TableClass::Content, vec![25, 35, 40])
        .with_header(["Jenis Asesmen", "Teknik", "Instrumen"]);
    if rows.is_empty() {
        table.push(Row::new(vec![
            Cell::text(PLACEHOLDER),
            Cell::text(PLACEHOLDER),
            Cell::text(PLACEHOLDER),
        ]));
    }
    for row in rows {
        table.push(Row::new(vec![
            Cell::strong(row.kind.as_str()),
            Cell::text(row.technique.as_str()),
            Cell::text(row.instrument.as_str()),
        ]));
    }
    table
}

fn table_or_dash(table: Table) -> Block {
    if table.rows.is_empty() {
        Block::paragraph(PLACEHOLDER)
    } else {
        Block::Table(table)
    }
}

fn ordered_or_dash(items: &[String]) -> Block {
    if items.is_empty() {
        return Block::paragraph(PLACEHOLDER);
    }
    Block::List {
        ordered: true,
        items: items.iter().map(|i| markdown::inline(i)).collect(),
    }
}
