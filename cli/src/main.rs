#![allow(clippy::print_stdout, reason = "estimates are written to stdout")]
use crate::cli::{Args, Command, CorpusArgs};
use anyhow::{bail, Context};
use clap::Parser;
use podstats::catalog::{EstimateProvider, EstimateRequest, ExtractorChain};
use podstats::config::{EstimateConfig, GeneratorConfig, MirrorConfig, UnknownFiles};
use podstats::model::pattern::{TermPattern, TriplePattern};
use podstats::model::{Iri, NamedNode, Variable};
use podstats::{load_static_estimates, GenerationReport, Generator};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let matches = Args::parse();
    match matches.command {
        Command::Generate { corpus } => {
            let config = generator_config(corpus)?;
            let generator = Generator::from_config(&config)?;
            let report =
                tokio::task::spawn_blocking(move || generator.generate(&config.pods)).await??;
            check_report(&report)
        }
        Command::Count { corpus, output } => {
            let config = generator_config(corpus)?;
            let generator = Generator::from_config(&config)?;
            let report =
                tokio::task::spawn_blocking(move || generator.count(&config.pods, &output))
                    .await??;
            check_report(&report)
        }
        Command::Estimate {
            source,
            predicate,
            config,
            base,
            mirror,
            timeout,
            static_estimates,
        } => {
            Iri::parse(source.as_str())
                .with_context(|| format!("The source URL {source} is invalid"))?;
            let predicate = NamedNode::new(predicate.as_str())
                .with_context(|| format!("The predicate {predicate} is invalid"))?;
            let request = EstimateRequest::new(
                source,
                TriplePattern {
                    subject: TermPattern::Variable(Variable::new_unchecked("s")),
                    predicate: predicate.into(),
                    object: TermPattern::Variable(Variable::new_unchecked("o")),
                },
            );
            let chain = if let Some(path) = static_estimates {
                let provider = tokio::task::spawn_blocking(move || load_static_estimates(&path))
                    .await??;
                ExtractorChain::new().with(Arc::new(provider))
            } else {
                let config = estimate_config(config.as_deref(), base.zip(mirror), timeout)?;
                ExtractorChain::new().with(Arc::new(EstimateProvider::new(config.catalog()?)))
            };
            let metadata = chain.run(&request).await?;
            println!("{}", metadata.cardinality.value);
            Ok(())
        }
    }
}

fn generator_config(corpus: CorpusArgs) -> anyhow::Result<GeneratorConfig> {
    let mut config = match &corpus.config {
        Some(path) => GeneratorConfig::from_file(path)?,
        None => GeneratorConfig::default(),
    };
    if let Some(pods) = corpus.pods {
        config.pods = pods;
    }
    if let Some(url_template) = corpus.url_template {
        config.dataset_url_template = url_template;
    }
    if corpus.skip_unknown_files {
        config.unknown_files = UnknownFiles::Skip;
    }
    Ok(config)
}

fn estimate_config(
    path: Option<&Path>,
    mirror: Option<(String, PathBuf)>,
    timeout: Option<u64>,
) -> anyhow::Result<EstimateConfig> {
    let mut config = match path {
        Some(path) => EstimateConfig::from_file(path)?,
        None => EstimateConfig::default(),
    };
    if let Some((base, root)) = mirror {
        config.mirror = Some(MirrorConfig { base, root });
    }
    if let Some(timeout) = timeout {
        config.catalog.population_timeout = Duration::from_secs(timeout);
    }
    Ok(config)
}

fn check_report<T>(report: &GenerationReport<T>) -> anyhow::Result<()> {
    if !report.is_success() {
        bail!(
            "{} of {} pods failed: {}",
            report.failed.len(),
            report.failed.len() + report.succeeded.len(),
            report
                .failed
                .iter()
                .map(|(pod, _)| pod.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::panic_in_result_fn, reason = "tests")]
mod tests {
    use super::*;
    use anyhow::Result;
    use assert_cmd::Command;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use predicates::prelude::*;

    const POST: &str = r#"
@prefix ex: <http://example.com/> .

<#it> ex:author <../profile/card#me> ;
    ex:text "hello" .
"#;

    fn cli_command() -> Command {
        let mut command = Command::new(env!("CARGO"));
        command.arg("run").arg("--bin").arg("podstats");
        command.arg("--");
        command
    }

    fn corpus() -> Result<TempDir> {
        let pods = TempDir::new()?;
        pods.child("alice/posts/1.ttl").write_str(POST)?;
        pods.child("alice/posts/2.ttl").write_str(POST)?;
        Ok(pods)
    }

    fn estimate(pods: &TempDir, source: &str, predicate: &str) -> Command {
        let mut command = cli_command();
        command
            .arg("estimate")
            .arg(source)
            .arg(predicate)
            .arg("--base")
            .arg("http://localhost:3000/pods")
            .arg("--mirror")
            .arg(pods.path());
        command
    }

    #[test]
    fn cli_help() {
        cli_command()
            .assert()
            .failure()
            .stdout("")
            .stderr(predicate::str::contains("podstats"));
    }

    #[test]
    fn cli_generate_then_estimate() -> Result<()> {
        let pods = corpus()?;
        cli_command()
            .arg("generate")
            .arg("--pods")
            .arg(pods.path())
            .assert()
            .success();
        pods.child("alice/profile/cardinalities.nq")
            .assert(predicate::path::exists());

        estimate(
            &pods,
            "http://localhost:3000/pods/alice",
            "http://example.com/author",
        )
        .assert()
        .stdout("2\n")
        .success();
        estimate(
            &pods,
            "http://localhost:3000/pods/alice",
            "http://example.com/missing",
        )
        .assert()
        .stdout("inf\n")
        .success();
        Ok(())
    }

    #[test]
    fn cli_generate_reports_failing_pods() -> Result<()> {
        let pods = corpus()?;
        pods.child("bob/notes.txt").write_str("hello")?;
        cli_command()
            .arg("generate")
            .arg("--pods")
            .arg(pods.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("1 of 2 pods failed"));
        pods.child("alice/profile/cardinalities.nq")
            .assert(predicate::path::exists());

        cli_command()
            .arg("generate")
            .arg("--pods")
            .arg(pods.path())
            .arg("--skip-unknown-files")
            .assert()
            .success();
        Ok(())
    }

    #[test]
    fn cli_count_then_static_estimate() -> Result<()> {
        let pods = corpus()?;
        let output = TempDir::new()?;
        cli_command()
            .arg("count")
            .arg("--pods")
            .arg(pods.path())
            .arg("--output")
            .arg(output.path())
            .assert()
            .success();
        output
            .child("alice.nq")
            .assert(predicate::str::contains("urn:podstats:facet:predicate"));

        cli_command()
            .arg("estimate")
            .arg("http://example.com/anywhere")
            .arg("http://example.com/text")
            .arg("--static")
            .arg(output.path())
            .assert()
            .stdout("2\n")
            .success();
        Ok(())
    }

    #[test]
    fn cli_rejects_invalid_predicate() {
        cli_command()
            .arg("estimate")
            .arg("http://localhost:3000/pods/alice")
            .arg("not an iri")
            .assert()
            .failure()
            .stderr(predicate::str::contains("The predicate not an iri is invalid"));
    }

    #[test]
    fn cli_rejects_relative_source() {
        cli_command()
            .arg("estimate")
            .arg("pods/alice")
            .arg("http://example.com/author")
            .assert()
            .failure()
            .stderr(predicate::str::contains("The source URL pods/alice is invalid"));
    }

    #[test]
    fn clap_debug() {
        use clap::CommandFactory;

        Args::command().debug_assert()
    }
}
