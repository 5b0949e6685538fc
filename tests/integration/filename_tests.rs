use pngx::upload::filename::{MetadataExtractor, DEFAULT_DATE_RULE};
use std::path::Path;

use super::common::strings;

fn extractor(date_rules: &[&str], title_rules: &[&str]) -> MetadataExtractor {
    MetadataExtractor::new(&strings(date_rules), &strings(title_rules), &[])
}

#[test]
fn test_date_and_remainder_from_default_rule() {
    let meta = extractor(&[DEFAULT_DATE_RULE], &[]).extract(Path::new("2024-03-05-invoice.pdf"));
    assert_eq!(meta.created.as_deref(), Some("2024-03-05"));
    assert_eq!(meta.title, "invoice");
}

#[test]
fn test_no_matching_rule_keeps_stem() {
    let meta = extractor(&[DEFAULT_DATE_RULE], &[]).extract(Path::new("inbox/invoice-march.pdf"));
    assert_eq!(meta.created, None);
    assert_eq!(meta.title, "invoice-march");
}

#[test]
fn test_title_rule_replaces_every_match() {
    let meta = extractor(&[], &["s/_/ /g"]).extract(Path::new("my_invoice_march.pdf"));
    assert_eq!(meta.title, "my invoice march");
}

#[test]
fn test_malformed_title_rule_is_skipped() {
    let meta = extractor(&[], &["s/_", "x/a/b/"]).extract(Path::new("my_invoice_march.pdf"));
    assert_eq!(meta.title, "my_invoice_march");
}

#[test]
fn test_rules_apply_in_order() {
    let meta = extractor(
        &[DEFAULT_DATE_RULE],
        &["s/_/ /g", r"s|^(\w+) (\w+)|\2 \1|", "s/INVOICE/Bill/i"],
    )
    .extract(Path::new("2024.01.31-acme_invoice.pdf"));
    assert_eq!(meta.created.as_deref(), Some("2024-01-31"));
    assert_eq!(meta.title, "Bill acme");
}

#[test]
fn test_replace_with_spaces_after_rules() {
    let extractor = MetadataExtractor::new(
        &strings(&[DEFAULT_DATE_RULE]),
        &strings(&["s/-/+/g"]),
        &strings(&["+_"]),
    );
    let meta = extractor.extract(Path::new("2024-02-01-water-bill_feb.pdf"));
    assert_eq!(meta.title, "water bill feb");
}

#[test]
fn test_date_only_name_falls_back_to_stem() {
    let meta = extractor(&[DEFAULT_DATE_RULE], &[]).extract(Path::new("2024-03-05.pdf"));
    assert_eq!(meta.created.as_deref(), Some("2024-03-05"));
    assert_eq!(meta.title, "2024-03-05");
}
