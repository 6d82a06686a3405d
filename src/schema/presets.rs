//! Built-in catalog, quote schema and report reasons.

use crate::catalog::Category;
use crate::errors::FlowResult;
use crate::report::ReportReason;
use crate::schema::{ChoiceOption, FieldKind, FieldSchema, StepSchema, WizardSchema};

pub fn default_categories() -> Vec<Category> {
    vec![
        Category::new("cleaning", "Temizlik")
            .with_description("Ev, ofis ve inşaat sonrası temizlik")
            .with_icon("sparkles"),
        Category::new("painting", "Boya Badana")
            .with_description("İç ve dış cephe boya işleri")
            .with_icon("paint-roller"),
        Category::new("moving", "Nakliyat")
            .with_description("Evden eve ve ofis taşıma")
            .with_icon("truck"),
        Category::new("plumbing", "Tesisat")
            .with_description("Su tesisatı ve kaçak tespiti")
            .with_icon("wrench"),
    ]
}

/// General purpose quote request used for every category.
pub fn quote_schema() -> FlowResult<WizardSchema> {
    WizardSchema::new(vec![
        StepSchema::new(
            "Hizmet Detayları",
            vec![
                FieldSchema::new("title", "Başlık", FieldKind::short_text())
                    .with_placeholder("Örn. 3+1 daire boyası"),
                FieldSchema::new("description", "Açıklama", FieldKind::long_text())
                    .with_placeholder("İşi kısaca anlatın")
                    .with_optional(),
                FieldSchema::new(
                    "quantity",
                    "Miktar",
                    FieldKind::quantity(["Adet", "m²", "Saat", "Oda"]),
                ),
            ],
        )
        .with_subtitle("Ne yaptırmak istiyorsunuz?"),
        StepSchema::new(
            "Zamanlama",
            vec![FieldSchema::new(
                "urgency",
                "Ne zaman?",
                FieldKind::choice(vec![
                    ChoiceOption::new("asap", "Hemen", "24 saat içinde"),
                    ChoiceOption::new("this_week", "Bu hafta", "7 gün içinde"),
                    ChoiceOption::new("flexible", "Esnek", "Tarih fark etmez"),
                ]),
            )],
        ),
        StepSchema::new(
            "Konum",
            vec![
                FieldSchema::new("location", "Adres", FieldKind::Location),
                FieldSchema::new(
                    "materials_included",
                    "Malzeme dahil olsun",
                    FieldKind::BooleanSwitch,
                )
                .with_optional(),
                FieldSchema::new("internal_note", "İç Not", FieldKind::long_text())
                    .with_privileged_only(),
            ],
        )
        .with_subtitle("Hizmet nerede verilecek?"),
    ])
}

pub fn issue_reasons() -> Vec<ReportReason> {
    vec![
        ReportReason::new("no_show", "Hizmet veren gelmedi"),
        ReportReason::new("poor_quality", "İş kalitesi yetersiz"),
        ReportReason::new("rude", "Uygunsuz davranış"),
        ReportReason::new("other", "Diğer"),
    ]
}

pub fn dispute_reasons() -> Vec<ReportReason> {
    vec![
        ReportReason::new("price_mismatch", "Fiyat teklifle uyuşmuyor"),
        ReportReason::new("incomplete", "İş tamamlanmadı"),
        ReportReason::new("damage", "Hasar oluştu"),
        ReportReason::new("other", "Diğer"),
    ]
}
