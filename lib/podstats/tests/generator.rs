#![cfg(test)]
#![allow(clippy::panic_in_result_fn)]

use assert_fs::prelude::*;
use assert_fs::TempDir;
use podstats::catalog::Cardinality;
use podstats::config::{GeneratorConfig, UnknownFiles};
use podstats::error::GenerateError;
use podstats::index::error::ScanError;
use podstats::model::NamedNodeRef;
use podstats::{load_static_estimates, Generator};
use predicates::prelude::*;
use std::error::Error;

const POST: &str = r#"
@prefix ex: <http://example.com/> .

<#it> ex:author <../profile/card#me> ;
    ex:text "hello" .
"#;

const AUTHOR: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("http://example.com/author");
const TEXT: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("http://example.com/text");

fn corpus() -> Result<TempDir, Box<dyn Error>> {
    let root = TempDir::new()?;
    root.child("alice/posts/1.ttl").write_str(POST)?;
    root.child("bob/posts/1.ttl").write_str(POST)?;
    root.child("bob/posts/2.ttl").write_str(POST)?;
    root.child("README.md").write_str("Not a pod")?;
    Ok(root)
}

#[test]
fn generate_publishes_every_pod() -> Result<(), Box<dyn Error>> {
    let root = corpus()?;
    let report = Generator::default().generate(root.path())?;

    assert!(report.is_success());
    let published = report
        .succeeded
        .iter()
        .map(|report| (report.dataset.as_str(), report.triples))
        .collect::<Vec<_>>();
    assert_eq!(
        published,
        [
            ("http://localhost:3000/pods/alice", 2),
            ("http://localhost:3000/pods/bob", 4),
        ]
    );
    root.child("alice/profile/cardinalities.nq")
        .assert(predicate::str::contains("http://example.com/author"));
    root.child("bob/profile/card.nq").assert(predicate::str::contains(
        "<http://localhost:3000/pods/bob/profile/card#me> <http://www.w3.org/2000/01/rdf-schema#seeAlso> <http://localhost:3000/pods/bob/profile/cardinalities>",
    ));
    Ok(())
}

#[test]
fn failing_pods_do_not_affect_others() -> Result<(), Box<dyn Error>> {
    let root = corpus()?;
    root.child("bob/posts/broken.ttl")
        .write_str("<http://example.com/s> <http://example.com/p> .")?;

    let report = Generator::default().generate(root.path())?;

    assert_eq!(report.succeeded.len(), 1);
    assert_eq!(report.failed.len(), 1);
    let (pod, error) = &report.failed[0];
    assert_eq!(pod, &root.child("bob").path());
    assert!(matches!(error, GenerateError::Scan(ScanError::Parse { .. })));
    root.child("alice/profile/cardinalities.nq")
        .assert(predicate::path::exists());
    root.child("bob/profile/cardinalities.nq")
        .assert(predicate::path::missing());
    Ok(())
}

#[test]
fn configured_generator_skips_unknown_files() -> Result<(), Box<dyn Error>> {
    let root = corpus()?;
    root.child("alice/notes.txt").write_str("hello")?;

    let report = Generator::default().generate(root.path())?;
    assert!(matches!(
        report.failed.as_slice(),
        [(_, GenerateError::Scan(ScanError::UnknownFileType { .. }))]
    ));

    let config = GeneratorConfig {
        pods: root.path().to_path_buf(),
        unknown_files: UnknownFiles::Skip,
        ..GeneratorConfig::default()
    };
    let report = Generator::from_config(&config)?.generate(&config.pods)?;
    assert!(report.is_success());
    assert_eq!(report.succeeded.len(), 2);
    Ok(())
}

#[test]
fn missing_pods_directory() -> Result<(), Box<dyn Error>> {
    let root = TempDir::new()?;
    assert!(matches!(
        Generator::default().generate(root.child("pods").path()),
        Err(GenerateError::Pods { .. })
    ));
    Ok(())
}

#[test]
fn count_replaces_the_output_directory() -> Result<(), Box<dyn Error>> {
    let root = corpus()?;
    let output = TempDir::new()?;
    output.child("stale.nq").write_str("")?;

    let report = Generator::default().count(root.path(), output.path())?;

    assert!(report.is_success());
    assert_eq!(
        report.succeeded,
        [output.child("alice.nq").path(), output.child("bob.nq").path()]
    );
    output.child("stale.nq").assert(predicate::path::missing());
    output
        .child("bob.nq")
        .assert(predicate::str::contains("urn:podstats:facet:predicate"));
    Ok(())
}

#[test]
fn static_estimates_from_counted_pods() -> Result<(), Box<dyn Error>> {
    let root = corpus()?;
    let output = TempDir::new()?;
    Generator::default().count(root.path(), output.path())?;

    let directory = load_static_estimates(output.path())?;
    assert_eq!(directory.cardinality(AUTHOR), Cardinality::Known(3));
    assert_eq!(directory.cardinality(TEXT), Cardinality::Known(3));

    let single = load_static_estimates(output.child("alice.nq").path())?;
    assert_eq!(single.cardinality(AUTHOR), Cardinality::Known(1));
    assert_eq!(
        single.cardinality(NamedNodeRef::new_unchecked("http://example.com/missing")),
        Cardinality::Unknown
    );
    Ok(())
}
