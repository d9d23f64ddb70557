use crate::domain::model::{Artifact, RunSummary};
use crate::domain::ports::{Pipeline, Storage};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct Engine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> Engine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let name = self.pipeline.name();
        tracing::info!("🚀 Starting {}", name);

        let corpus = self.pipeline.extract().await?;
        tracing::info!(
            "📚 Loaded {} skill files ({} unreadable)",
            corpus.len(),
            corpus.unreadable.len()
        );
        self.monitor.log_phase("extract");

        let artifact = self.pipeline.transform(corpus).await?;
        tracing::debug!(
            "{} produced {} files, {} findings",
            name,
            artifact.files.len(),
            artifact.findings.len()
        );
        self.monitor.log_phase("transform");

        let summary = self.pipeline.load(artifact).await?;
        self.monitor.log_phase("load");
        self.monitor.log_final_stats();

        Ok(summary)
    }
}

/// Shared load step: create directories, write files, print stdout.
pub async fn write_artifact<S: Storage>(storage: &S, artifact: Artifact) -> Result<RunSummary> {
    for dir in &artifact.directories {
        storage.create_dir(dir).await?;
    }

    let mut written = Vec::with_capacity(artifact.files.len());
    for file in &artifact.files {
        storage.write_file(&file.path, &file.contents).await?;
        let location = storage.display_path(&file.path);
        tracing::debug!("Wrote {} ({} bytes)", location, file.contents.len());
        written.push(location);
    }

    if let Some(stdout) = &artifact.stdout {
        println!("{}", stdout);
    }

    Ok(RunSummary {
        message: artifact.summary,
        written,
        findings: artifact.findings,
    })
}
