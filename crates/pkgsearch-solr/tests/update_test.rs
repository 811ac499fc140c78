use pkgsearch_core::document::build_virtual;
use pkgsearch_core::types::DocumentId;
use pkgsearch_solr::update::{UpdateBatch, UpdateCommand};

#[test]
fn full_clear_renders_delete_all_then_commit() {
    let mut batch = UpdateBatch::new();
    batch.delete_query("*:*");
    batch.commit();
    assert_eq!(
        batch.to_json().unwrap(),
        r#"{"delete":{"query":"*:*"},"commit":{}}"#
    );
}

#[test]
fn repeated_keys_keep_their_order() {
    let mut batch = UpdateBatch::new();
    batch.delete_id(DocumentId::Package(7));
    batch.add(build_virtual("psr/log-implementation").unwrap());
    batch.add(build_virtual("psr/http-client-implementation").unwrap());
    batch.commit();

    let body = batch.to_json().unwrap();
    assert!(body.starts_with(r#"{"delete":{"id":"7"},"add":{"doc":{"id":"virtual:psr/log-implementation""#));
    let first = body.find("psr/log-implementation").unwrap();
    let second = body.find("psr/http-client-implementation").unwrap();
    assert!(first < second);
    assert!(body.ends_with(r#""commit":{}}"#));
    assert_eq!(batch.documents().count(), 2);
    assert!(matches!(batch.commands()[0], UpdateCommand::DeleteById(DocumentId::Package(7))));
}

#[test]
fn new_batch_is_empty() {
    let batch = UpdateBatch::new();
    assert!(batch.is_empty());
    assert_eq!(batch.to_json().unwrap(), "{}");
    assert!(batch.commands().is_empty());
}
