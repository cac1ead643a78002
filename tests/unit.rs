//! Unit tests for names, type signatures and diagnostics.
mod common;
use hensei::catalog::{MatchKind, TypeRelations};
use hensei::diagnostics::{Diagnostic, DiagnosticCode, GraphView, Severity};
use hensei::name::{group_by_parent, ParsedName};
use hensei::prelude::*;

#[test]
fn test_name_round_trip() {
    for name in ["fetch", "scraping.stepstone.fetch", "a.b.c.d.e", "x_1.y_2"] {
        let parsed = ParsedName::parse(name).expect("valid name");
        assert_eq!(parsed.full(), name);
        assert_eq!(parsed.segments().join("."), name);
    }
}

#[test]
fn test_name_parts() {
    let parsed = ParsedName::parse("scraping.stepstone.fetch").unwrap();
    assert_eq!(parsed.depth(), 3);
    assert_eq!(parsed.step_name(), "fetch");
    assert_eq!(parsed.parent_path(), "scraping.stepstone");
    assert_eq!(parsed.prefix_paths(), vec!["", "scraping", "scraping.stepstone"]);

    let root_level = ParsedName::parse("fetch").unwrap();
    assert_eq!(root_level.depth(), 1);
    assert_eq!(root_level.parent_path(), "");
}

#[test]
fn test_name_rejects_invalid_input() {
    assert!(matches!(ParsedName::parse(""), Err(NameError::Empty)));
    assert!(matches!(
        ParsedName::parse("x..y"),
        Err(NameError::EmptySegment { .. })
    ));
    assert!(matches!(
        ParsedName::parse(".leading"),
        Err(NameError::EmptySegment { .. })
    ));
    assert!(matches!(
        ParsedName::parse("trailing."),
        Err(NameError::EmptySegment { .. })
    ));
    assert!(matches!(
        ParsedName::parse("a.1digit"),
        Err(NameError::InvalidSegment { .. })
    ));
    assert!(matches!(
        ParsedName::parse("a.bad-segment"),
        Err(NameError::InvalidSegment { .. })
    ));
}

#[test]
fn test_group_by_parent_is_deterministic() {
    let names: Vec<ParsedName> = ["a.x.one", "a.y.two", "a.x.three", "top"]
        .iter()
        .map(|n| ParsedName::parse(n).unwrap())
        .collect();

    let grouped = group_by_parent(&names);
    let again = group_by_parent(&names);

    let keys: Vec<&String> = grouped.keys().collect();
    assert_eq!(keys, vec!["", "a.x", "a.y"]);
    assert_eq!(
        grouped["a.x"].iter().map(|n| n.full()).collect::<Vec<_>>(),
        vec!["a.x.one", "a.x.three"]
    );
    assert_eq!(grouped, again);
}

#[test]
fn test_type_signature_display() {
    assert_eq!(TypeSignature::named("JobPage").to_string(), "JobPage");
    assert_eq!(
        TypeSignature::list_of(TypeSignature::named("JobPage")).to_string(),
        "[JobPage]"
    );
    assert_eq!(TypeSignature::Unit.to_string(), "()");
    let record = TypeSignature::Record(vec![
        ("fetch".to_string(), TypeSignature::named("JobPage")),
        ("count".to_string(), TypeSignature::named("Count")),
    ]);
    assert_eq!(record.to_string(), "{fetch: JobPage, count: Count}");
}

#[test]
fn test_assignability_rules() {
    let mut relations = TypeRelations::new();
    relations.declare_subtype("PremiumPage", "JobPage");
    relations.declare_subtype("JobPage", "Document");

    let premium = TypeSignature::named("PremiumPage");
    let page = TypeSignature::named("JobPage");
    let document = TypeSignature::named("Document");
    let other = TypeSignature::named("Invoice");

    assert!(relations.assignable(&page, &page));
    assert!(relations.assignable(&premium, &page));
    // Transitive chain.
    assert!(relations.assignable(&premium, &document));
    assert!(!relations.assignable(&page, &premium));
    assert!(!relations.assignable(&page, &other));

    // Lists are element-wise.
    assert!(relations.assignable(
        &TypeSignature::list_of(premium.clone()),
        &TypeSignature::list_of(page.clone())
    ));

    // Records use width subtyping: extra fields on the producer side
    // are fine, missing ones are not.
    let wide = TypeSignature::Record(vec![
        ("a".to_string(), page.clone()),
        ("b".to_string(), other.clone()),
    ]);
    let narrow = TypeSignature::Record(vec![("a".to_string(), page.clone())]);
    assert!(relations.assignable(&wide, &narrow));
    assert!(!relations.assignable(&narrow, &wide));
}

#[test]
fn test_satisfies_match_kinds() {
    let relations = TypeRelations::new();
    let page = TypeSignature::named("JobPage");
    let pages = TypeSignature::list_of(page.clone());
    let aggregate = TypeSignature::Record(vec![("fetch".to_string(), page.clone())]);

    let direct = relations.satisfies(&page, &page).expect("direct match");
    assert_eq!(direct.kind, MatchKind::Direct);
    assert!(!direct.element);

    let element = relations.satisfies(&page, &pages).expect("element match");
    assert_eq!(element.kind, MatchKind::Element);
    assert!(element.element);

    let nested = relations
        .satisfies(&aggregate, &pages)
        .expect("aggregate match");
    assert_eq!(nested.kind, MatchKind::Aggregate);
    assert_eq!(nested.access, vec!["fetch"]);
    assert!(nested.element);

    assert!(relations
        .satisfies(&TypeSignature::named("Invoice"), &page)
        .is_none());
}

#[test]
fn test_diagnostic_codes_carry_view_and_severity() {
    assert_eq!(DiagnosticCode::InvalidName.view(), GraphView::Hierarchy);
    assert_eq!(
        DiagnosticCode::MissingEntityReference.view(),
        GraphView::Entity
    );
    assert_eq!(DiagnosticCode::DeadOutput.view(), GraphView::DataFlow);
    assert_eq!(DiagnosticCode::DeadOutput.severity(), Severity::Warning);
    assert_eq!(
        DiagnosticCode::CyclicDependency.severity(),
        Severity::Error
    );
}

#[test]
fn test_diagnostic_display_is_self_sufficient() {
    let diagnostic = Diagnostic::new(
        DiagnosticCode::UnsatisfiedDependency,
        "etl.transform",
        "etl",
        "required input 'raw' of type Raw matches no sibling output",
    );
    let rendered = diagnostic.to_string();
    assert!(rendered.contains("etl.transform"));
    assert!(rendered.contains("'etl'"));
    assert!(rendered.contains("Raw"));
    assert!(rendered.contains("error"));
}

#[test]
fn test_error_display() {
    let err = NameError::InvalidSegment {
        name: "a.1b".to_string(),
        segment: "1b".to_string(),
    };
    assert!(err.to_string().contains("a.1b"));
    assert!(err.to_string().contains("1b"));

    let adapter_err = AdapterError::DispatchMismatch {
        operation: "etl.load".to_string(),
        declared: "blocking",
        given: "async",
    };
    assert!(adapter_err.to_string().contains("etl.load"));
    assert!(adapter_err.to_string().contains("blocking"));
}
