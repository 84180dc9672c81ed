#![cfg(test)]
#![allow(clippy::panic_in_result_fn)]

use assert_fs::prelude::*;
use assert_fs::TempDir;
use podstats_index::error::{PublishError, ScanError};
use podstats_index::{
    Dataset, DatasetTemplate, Index, LinkOutcome, Publisher, Role, Scanner, UnknownFilePolicy,
};
use podstats_model::vocab::{rdfs, void};
use podstats_model::{
    GraphName, NamedNode, NamedNodeRef, NamedOrBlankNode, Quad, RdfFormat, RdfParser, Term,
};
use std::error::Error;
use std::fs;
use std::path::Path;

const PROFILE: &str = "<http://localhost:3000/pods/alice/profile/card#me> <http://xmlns.com/foaf/0.1/name> \"Alice\" .\n";

const POST: &str = r#"
@prefix ex: <http://example.com/> .

ex:post1 ex:author ex:alice ;
    ex:tag [ ex:label "rust" ] .
"#;

const RELATIVE_POST: &str = r#"
@prefix ex: <http://example.com/> .

<#it> ex:author <../profile/card#me> .
"#;

const AUTHOR: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("http://example.com/author");
const TAG: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("http://example.com/tag");
const LABEL: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("http://example.com/label");
const POST1: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("http://example.com/post1");

fn pod(root: &TempDir) -> Result<Dataset, Box<dyn Error>> {
    let pod = root.child("alice");
    pod.child("profile/card.nq").write_str(PROFILE)?;
    pod.child("posts/1.ttl").write_str(POST)?;
    Ok(DatasetTemplate::default().dataset(pod.path())?)
}

fn read_quads(path: &Path) -> Result<Vec<Quad>, Box<dyn Error>> {
    Ok(RdfParser::from_format(RdfFormat::NQuads)
        .for_reader(fs::File::open(path)?)
        .collect::<Result<Vec<_>, _>>()?)
}

#[test]
fn scan_counts_every_document() -> Result<(), Box<dyn Error>> {
    let root = TempDir::new()?;
    let dataset = pod(&root)?;

    let index = Scanner::new().scan(dataset.root())?;
    assert_eq!(index.triples(), 4);
    assert_eq!(index.predicates().len(), 4);
    assert_eq!(index.count(Role::Predicate, AUTHOR), 1);
    assert_eq!(index.count(Role::Predicate, TAG), 1);
    assert_eq!(index.count(Role::Predicate, LABEL), 1);
    assert_eq!(index.count(Role::Subject, POST1), 2);
    assert_eq!(index.subjects().len(), 3);
    assert_eq!(
        index
            .objects()
            .keys()
            .filter(|term| matches!(term, NamedOrBlankNode::BlankNode(_)))
            .count(),
        1
    );
    assert!(index.graphs().is_empty());
    Ok(())
}

#[test]
fn scanning_twice_yields_the_same_index() -> Result<(), Box<dyn Error>> {
    let root = TempDir::new()?;
    let dataset = pod(&root)?;
    root.child("alice/posts/2.ttl").write_str(POST)?;

    let scanner = Scanner::new();
    let first = scanner.scan(dataset.root())?;
    let second = scanner.scan(dataset.root())?;
    assert_eq!(first, second);
    assert_eq!(
        first.as_faceted_statements().collect::<Vec<_>>(),
        second.as_faceted_statements().collect::<Vec<_>>()
    );
    Ok(())
}

#[test]
fn blank_nodes_of_different_documents_are_distinct() -> Result<(), Box<dyn Error>> {
    let root = TempDir::new()?;
    let dataset = pod(&root)?;
    root.child("alice/posts/2.ttl").write_str(POST)?;

    let index = Scanner::new().scan(dataset.root())?;
    assert_eq!(index.count(Role::Subject, POST1), 4);
    let blank_subjects = index
        .subjects()
        .keys()
        .filter(|term| matches!(term, NamedOrBlankNode::BlankNode(_)))
        .count();
    assert_eq!(blank_subjects, 2);
    Ok(())
}

#[test]
fn unknown_files_fail_the_scan_by_default() -> Result<(), Box<dyn Error>> {
    let root = TempDir::new()?;
    let dataset = pod(&root)?;
    root.child("alice/notes.txt").write_str("not rdf")?;

    let result = Scanner::new().scan(dataset.root());
    let Err(ScanError::UnknownFileType { path }) = result else {
        panic!("expected an unknown file type error, got {result:?}");
    };
    assert!(path.ends_with("notes.txt"));
    Ok(())
}

#[test]
fn unknown_files_can_be_skipped() -> Result<(), Box<dyn Error>> {
    let root = TempDir::new()?;
    let dataset = pod(&root)?;
    let expected = Scanner::new().scan(dataset.root())?;
    root.child("alice/notes.txt").write_str("not rdf")?;

    let index = Scanner::new()
        .with_unknown_file_policy(UnknownFilePolicy::Skip)
        .scan(dataset.root())?;
    assert_eq!(index, expected);
    Ok(())
}

#[test]
fn invalid_documents_fail_the_scan() -> Result<(), Box<dyn Error>> {
    let root = TempDir::new()?;
    let dataset = pod(&root)?;
    root.child("alice/broken.ttl").write_str("<http://example.com/s> <")?;

    assert!(matches!(
        Scanner::new().scan(dataset.root()),
        Err(ScanError::Parse { .. })
    ));
    Ok(())
}

#[test]
fn statistics_artifacts_are_not_counted() -> Result<(), Box<dyn Error>> {
    let root = TempDir::new()?;
    let dataset = pod(&root)?;
    let expected = Scanner::new().scan(dataset.root())?;
    root.child("alice/profile/cardinalities.nq")
        .write_str("<http://example.com/a> <http://example.com/b> <http://example.com/c> .\n")?;

    assert_eq!(Scanner::new().scan(dataset.root())?, expected);
    Ok(())
}

#[test]
fn relative_iris_resolve_against_the_document_url() -> Result<(), Box<dyn Error>> {
    let root = TempDir::new()?;
    let dataset = pod(&root)?;
    root.child("alice/posts/2.ttl").write_str(RELATIVE_POST)?;

    let index = Scanner::new().scan_dataset(&dataset)?;
    let it = NamedNodeRef::new_unchecked("http://localhost:3000/pods/alice/posts/2#it");
    let me = NamedNodeRef::new_unchecked("http://localhost:3000/pods/alice/profile/card#me");
    assert_eq!(index.count(Role::Subject, it), 1);
    assert_eq!(index.count(Role::Object, me), 1);
    assert_eq!(index.count(Role::Predicate, AUTHOR), 2);
    Ok(())
}

#[test]
fn publish_writes_statistics_and_links_them() -> Result<(), Box<dyn Error>> {
    let root = TempDir::new()?;
    let dataset = pod(&root)?;
    let index = Scanner::new().scan_dataset(&dataset)?;

    let report = Publisher::default().publish(&index, &dataset)?;
    assert_eq!(report.link, LinkOutcome::Linked);
    assert_eq!(report.triples, 4);
    assert_eq!(report.properties, 4);

    let statistics = read_quads(dataset.statistics_path())?;
    let dataset_iri = dataset.iri().clone();
    assert!(statistics.contains(&Quad::new(
        dataset_iri.clone(),
        podstats_model::vocab::rdf::TYPE,
        void::DATASET.into_owned(),
        GraphName::DefaultGraph
    )));
    let partitions = statistics
        .iter()
        .filter(|quad| quad.predicate == void::PROPERTY_PARTITION)
        .count();
    assert_eq!(partitions, 4);
    let author = statistics
        .iter()
        .find(|quad| quad.predicate == AUTHOR)
        .map(|quad| quad.object.clone());
    assert_eq!(
        author,
        Some(Term::from(podstats_model::Literal::new_typed_literal(
            "1",
            podstats_model::vocab::xsd::INTEGER
        )))
    );

    let link = Quad::new(
        dataset.profile_iri().clone(),
        rdfs::SEE_ALSO,
        dataset.statistics_iri().clone(),
        GraphName::DefaultGraph,
    );
    let profile = read_quads(dataset.profile_path())?;
    assert_eq!(profile.len(), 2);
    assert!(profile.contains(&link));
    Ok(())
}

#[test]
fn republishing_is_idempotent() -> Result<(), Box<dyn Error>> {
    let root = TempDir::new()?;
    let dataset = pod(&root)?;
    let publisher = Publisher::default();

    let index = Scanner::new().scan_dataset(&dataset)?;
    publisher.publish(&index, &dataset)?;
    let statistics = fs::read(dataset.statistics_path())?;
    let profile = fs::read(dataset.profile_path())?;

    let report = publisher.publish(&index, &dataset)?;
    assert_eq!(report.link, LinkOutcome::AlreadyLinked);
    assert_eq!(fs::read(dataset.statistics_path())?, statistics);
    assert_eq!(fs::read(dataset.profile_path())?, profile);
    Ok(())
}

#[test]
fn rescanning_a_published_pod_only_counts_the_link() -> Result<(), Box<dyn Error>> {
    let root = TempDir::new()?;
    let dataset = pod(&root)?;
    let scanner = Scanner::new();

    let before = scanner.scan_dataset(&dataset)?;
    Publisher::default().publish(&before, &dataset)?;
    let after = scanner.scan_dataset(&dataset)?;
    assert_eq!(after.triples(), before.triples() + 1);
    assert_eq!(after.count(Role::Predicate, rdfs::SEE_ALSO), 1);
    Ok(())
}

#[test]
fn link_failure_keeps_the_statistics_document() -> Result<(), Box<dyn Error>> {
    let root = TempDir::new()?;
    let dataset = pod(&root)?;
    let index = Scanner::new().scan_dataset(&dataset)?;
    root.child("alice/profile/card.nq").write_str("this is not n-quads")?;

    let publisher = Publisher::default();
    let result = publisher.publish(&index, &dataset);
    let Err(error) = result else {
        panic!("publishing with a broken profile should fail");
    };
    assert!(error.is_link_failure());
    let PublishError::Link { source, .. } = error else {
        panic!("expected a link failure");
    };
    assert!(matches!(*source, PublishError::Parse { .. }));
    assert!(!read_quads(dataset.statistics_path())?.is_empty());

    root.child("alice/profile/card.nq").write_str(PROFILE)?;
    assert_eq!(publisher.link_profile(&dataset)?, LinkOutcome::Linked);
    assert_eq!(publisher.link_profile(&dataset)?, LinkOutcome::AlreadyLinked);
    Ok(())
}

#[test]
fn statistics_document_rebuilds_predicate_counts() -> Result<(), Box<dyn Error>> {
    let root = TempDir::new()?;
    let dataset = pod(&root)?;
    let index = Scanner::new().scan_dataset(&dataset)?;
    Publisher::default().write_statistics(&index, &dataset)?;

    let statistics = read_quads(dataset.statistics_path())?;
    let mut counts = Index::default();
    for quad in &statistics {
        if let Term::Literal(literal) = &quad.object {
            if quad.subject.is_blank_node() {
                let predicate: NamedNode = quad.predicate.clone();
                assert_eq!(
                    literal.value().parse::<u64>()?,
                    index.count(Role::Predicate, predicate.as_ref())
                );
                counts.add(quad.as_ref());
            }
        }
    }
    assert_eq!(counts.predicates().len(), index.predicates().len());
    Ok(())
}
