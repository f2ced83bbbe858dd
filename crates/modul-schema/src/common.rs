//! Sections shared by the structured variants: rubric, appendix, signature
use crate::fields::{Cursor, Diagnostics};
use crate::AdaptContext;
use chrono::Locale;
use modul_core::document::{Appendix, Rubric, RubricIndicator, Signature, SignatureParty};

/// Blank NIP line printed under signatures in the standard variant
pub const NIP_LINE: &str = "NIP. .........................";

pub fn rubric(node: Cursor<'_>, diag: &mut Diagnostics) -> Rubric {
    let indicators = node
        .first(&["indikator", "kriteria"])
        .items("rubrik.indikator", diag)
        .into_iter()
        .enumerate()
        .map(|(i, row)| indicator(row, &format!("rubrik.indikator[{}]", i), diag))
        .collect();

    Rubric {
        title: node.get("judul").text("rubrik.judul", diag),
        goal: node.get("tujuan").text("rubrik.tujuan", diag),
        indicators,
        notes: node.get("keterangan").list("rubrik.keterangan", diag),
    }
}

fn indicator(row: Cursor<'_>, path: &str, diag: &mut Diagnostics) -> RubricIndicator {
    if !row.is_object() {
        // bare aspect name without levels
        return RubricIndicator {
            aspect: row.text(path, diag),
            ..blank_indicator()
        };
    }
    RubricIndicator {
        aspect: row.first(&["aspek", "kriteria"]).text(path, diag),
        beginning: row.first(&["baruBerkembang", "kurang"]).text(path, diag),
        developing: row.first(&["layak", "cukup"]).text(path, diag),
        proficient: row.first(&["cakap", "baik"]).text(path, diag),
        advanced: row.first(&["mahir", "sangatBaik"]).text(path, diag),
    }
}

fn blank_indicator() -> RubricIndicator {
    let dash = modul_core::PLACEHOLDER.to_string();
    RubricIndicator {
        aspect: dash.clone(),
        beginning: dash.clone(),
        developing: dash.clone(),
        proficient: dash.clone(),
        advanced: dash,
    }
}

pub fn appendix(node: Cursor<'_>, diag: &mut Diagnostics) -> Appendix {
    Appendix {
        worksheet: node.first(&["lkpd", "LKPD"]).markdown("lampiran.lkpd", diag),
        reading_material: node.get("bahanBacaan").markdown("lampiran.bahanBacaan", diag),
        glossary: node.get("glosarium").markdown("lampiran.glosarium", diag),
        bibliography: node.get("daftarPustaka").markdown("lampiran.daftarPustaka", diag),
    }
}

/// "Wates, 16 Oktober 2026"
pub fn place_and_date(ctx: &AdaptContext) -> String {
    let locale = Locale::try_from(ctx.school.locale.as_str()).unwrap_or(Locale::id_ID);
    format!(
        "{}, {}",
        ctx.school.city,
        ctx.today.format_localized("%-d %B %Y", locale)
    )
}

/// Principal on the left, teacher on the right.
pub fn signature(ctx: &AdaptContext, teacher: &str, school_label: &str, nip: bool) -> Signature {
    let id_line = nip.then(|| NIP_LINE.to_string());
    Signature {
        left: SignatureParty {
            heading: vec!["Mengetahui,".to_string(), school_label.to_string()],
            name: ctx.school.principal_name.clone(),
            id_line: id_line.clone(),
        },
        right: SignatureParty {
            heading: vec![place_and_date(ctx), "Guru Mata Pelajaran".to_string()],
            name: teacher.to_string(),
            id_line,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn ctx() -> AdaptContext {
        AdaptContext::new(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap())
    }

    #[test]
    fn test_place_and_date_in_indonesian() {
        assert_eq!(place_and_date(&ctx()), "Wates, 16 Oktober 2026");
    }

    #[test]
    fn test_rubric_rows_follow_payload() {
        let payload = json!({
            "judul": "Rubrik",
            "indikator": [
                {"aspek": "Pemahaman", "baruBerkembang": "a", "layak": "b", "cakap": "c", "mahir": "d"},
                {"aspek": "Kolaborasi"},
                "Presentasi"
            ],
            "keterangan": "Skor 1-4"
        });
        let mut diag = Diagnostics::new();
        let rubric = rubric(Cursor::new(&payload), &mut diag);

        assert_eq!(rubric.indicators.len(), 3);
        assert_eq!(rubric.indicators[1].developing, "-");
        assert_eq!(rubric.indicators[2].aspect, "Presentasi");
        assert_eq!(rubric.goal, "-");
        assert_eq!(rubric.notes, vec!["Skor 1-4"]);
    }

    #[test]
    fn test_signature_parties() {
        let sig = signature(&ctx(), "Budi", "Kepala Sekolah", true);
        assert_eq!(sig.left.heading, vec!["Mengetahui,", "Kepala Sekolah"]);
        assert_eq!(sig.left.name, "Pujiono, S.Pd.");
        assert_eq!(sig.right.heading[0], "Wates, 16 Oktober 2026");
        assert_eq!(sig.right.name, "Budi");
        assert_eq!(sig.right.id_line.as_deref(), Some(NIP_LINE));
    }
}
