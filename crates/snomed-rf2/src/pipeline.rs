//! The RF2 import pipeline: discovers files, fans parsing out across a
//! worker pool, and drains typed batches onto a single consumer so that
//! persistence writes stay single-writer (see `snomed-store`).
//!
//! Workers are plain OS threads coordinated through a bounded
//! `crossbeam_channel`, following the fan-out style of
//! [`crate::loader`]'s discovery pass and the batch-parsing shape of
//! [`crate::parser::Rf2Parser::parse_batched`], generalized to run one
//! parser per discovered file concurrently rather than sequentially.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use snomed_types::{
    Rf2AssociationRefsetMember, Rf2AttributeValueRefsetMember, Rf2ComplexMapRefsetMember,
    Rf2Concept, Rf2Description, Rf2LanguageRefsetMember, Rf2RefsetDescriptorMember,
    Rf2Relationship, Rf2SimpleMapRefsetMember, Rf2SimpleRefsetMember,
};
use tracing::{debug, info, warn};

use crate::parser::Rf2Parser;
use crate::types::{Rf2Config, Rf2Files, Rf2Result};

/// A cooperative cancellation signal shared across every worker in the
/// pipeline. Checked between batches, never pre-empts work in progress.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates a token that is not yet cancelled.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Requests cancellation; observed by workers on their next check.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A batch of freshly parsed RF2 records of one kind, handed from a parser
/// worker to the single persistence consumer.
#[derive(Debug)]
pub enum RecordBatch {
    /// A batch of concepts.
    Concepts(Vec<Rf2Concept>),
    /// A batch of descriptions.
    Descriptions(Vec<Rf2Description>),
    /// A batch of relationships.
    Relationships(Vec<Rf2Relationship>),
    /// A batch of simple refset members.
    SimpleRefset(Vec<Rf2SimpleRefsetMember>),
    /// A batch of language refset members.
    LanguageRefset(Vec<Rf2LanguageRefsetMember>),
    /// A batch of association refset members.
    AssociationRefset(Vec<Rf2AssociationRefsetMember>),
    /// A batch of simple-map refset members.
    SimpleMapRefset(Vec<Rf2SimpleMapRefsetMember>),
    /// A batch of complex/extended-map refset members.
    ComplexMapRefset(Vec<Rf2ComplexMapRefsetMember>),
    /// A batch of attribute-value refset members.
    AttributeValueRefset(Vec<Rf2AttributeValueRefsetMember>),
    /// A batch of refset-descriptor members.
    RefsetDescriptor(Vec<Rf2RefsetDescriptorMember>),
}

/// Summary of a completed (or cancelled) import run.
#[derive(Debug, Clone, Default)]
pub struct ImportOutcome {
    /// Total records successfully committed via the consumer callback.
    pub committed: usize,
    /// Rows skipped due to a row-level parse error (logged, not fatal).
    pub skipped_rows: usize,
    /// True if the run stopped early because of cancellation.
    pub cancelled: bool,
}

/// Configuration for the import pipeline, distinct from per-file-kind
/// [`Rf2Config`] (which governs filtering within a single file).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of concurrent parser worker threads. Defaults to the number
    /// of available CPU cores.
    pub worker_count: usize,
    /// Per-file parsing configuration (active-only filter, batch size).
    pub rf2: Rf2Config,
    /// Bound on the channel between parser workers and the consumer; this
    /// is the backpressure knob that keeps memory use predictable.
    pub channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_count: thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            rf2: Rf2Config::default(),
            channel_capacity: 64,
        }
    }
}

/// Drives the worker-pool import pipeline over a discovered [`Rf2Files`]
/// set.
pub struct ImportPipeline {
    config: PipelineConfig,
}

/// One parsing job: a file path plus how to turn it into [`RecordBatch`]es.
type ParseJob = Box<dyn FnOnce(&Rf2Config, &CancellationToken, &crossbeam_channel::Sender<RecordBatch>) -> Rf2Result<(usize, usize)> + Send>;

impl ImportPipeline {
    /// Creates a new pipeline with the given configuration.
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Runs the import: spawns `worker_count` parser threads over the
    /// discovered files, and drains their output on the calling thread,
    /// invoking `on_batch` for each batch in arrival order. Ordering
    /// across files and record kinds is not guaranteed; ordering within a
    /// single committed batch matches the source file.
    pub fn run<F>(
        &self,
        files: &Rf2Files,
        token: &CancellationToken,
        mut on_batch: F,
    ) -> Rf2Result<ImportOutcome>
    where
        F: FnMut(RecordBatch) -> Rf2Result<()>,
    {
        let jobs = build_jobs(files);
        let (tx, rx) = crossbeam_channel::bounded::<RecordBatch>(self.config.channel_capacity);

        let worker_count = self.config.worker_count.max(1);
        let rf2_config = self.config.rf2.clone();
        let token_for_workers = token.clone();

        let outcome = thread::scope(|scope| -> Rf2Result<ImportOutcome> {
            let jobs = Arc::new(std::sync::Mutex::new(jobs));
            let mut handles = Vec::new();

            for worker_id in 0..worker_count {
                let jobs = Arc::clone(&jobs);
                let tx = tx.clone();
                let rf2_config = rf2_config.clone();
                let token = token_for_workers.clone();
                handles.push(scope.spawn(move || -> Rf2Result<(usize, usize)> {
                    let mut parsed = 0;
                    let mut skipped = 0;
                    loop {
                        if token.is_cancelled() {
                            debug!(worker_id, "worker observed cancellation");
                            break;
                        }
                        let job = {
                            let mut jobs = jobs.lock().unwrap();
                            jobs.pop()
                        };
                        let Some(job) = job else { break };
                        let (p, s) = job(&rf2_config, &token, &tx)?;
                        parsed += p;
                        skipped += s;
                    }
                    Ok((parsed, skipped))
                }));
            }
            drop(tx);

            let mut committed = 0;
            let mut cancelled = token.is_cancelled();
            while let Ok(batch) = rx.recv() {
                if token.is_cancelled() {
                    cancelled = true;
                    break;
                }
                let n = batch_len(&batch);
                on_batch(batch)?;
                committed += n;
            }

            let mut skipped_rows = 0;
            for handle in handles {
                let (_, s) = handle.join().expect("parser worker panicked")?;
                skipped_rows += s;
            }

            Ok(ImportOutcome {
                committed,
                skipped_rows,
                cancelled,
            })
        })?;

        info!(
            committed = outcome.committed,
            skipped = outcome.skipped_rows,
            cancelled = outcome.cancelled,
            "import pipeline finished"
        );
        Ok(outcome)
    }
}

fn batch_len(batch: &RecordBatch) -> usize {
    match batch {
        RecordBatch::Concepts(v) => v.len(),
        RecordBatch::Descriptions(v) => v.len(),
        RecordBatch::Relationships(v) => v.len(),
        RecordBatch::SimpleRefset(v) => v.len(),
        RecordBatch::LanguageRefset(v) => v.len(),
        RecordBatch::AssociationRefset(v) => v.len(),
        RecordBatch::SimpleMapRefset(v) => v.len(),
        RecordBatch::ComplexMapRefset(v) => v.len(),
        RecordBatch::AttributeValueRefset(v) => v.len(),
        RecordBatch::RefsetDescriptor(v) => v.len(),
    }
}

/// Builds one [`ParseJob`] per discovered file. Each job streams its file
/// through an [`Rf2Parser`] in batches, wrapping rows of the appropriate
/// kind into a [`RecordBatch`] and sending it down the channel; a row-level
/// parse error is logged and skipped rather than aborting the file.
fn build_jobs(files: &Rf2Files) -> Vec<ParseJob> {
    let mut jobs: Vec<ParseJob> = Vec::new();

    macro_rules! job_for {
        ($path:expr, $record_ty:ty, $wrap:expr) => {
            if let Some(path) = $path.clone() {
                jobs.push(Box::new(move |cfg, token, tx| {
                    run_file::<$record_ty, _>(&path, cfg, token, tx, $wrap)
                }));
            }
        };
    }

    job_for!(files.concept_file, Rf2Concept, RecordBatch::Concepts);
    job_for!(
        files.description_file,
        Rf2Description,
        RecordBatch::Descriptions
    );
    job_for!(
        files.text_definition_file,
        Rf2Description,
        RecordBatch::Descriptions
    );
    job_for!(
        files.relationship_file,
        Rf2Relationship,
        RecordBatch::Relationships
    );
    job_for!(
        files.stated_relationship_file,
        Rf2Relationship,
        RecordBatch::Relationships
    );

    for path in &files.simple_refset_files {
        let path = path.clone();
        jobs.push(Box::new(move |cfg, token, tx| {
            run_file::<Rf2SimpleRefsetMember, _>(&path, cfg, token, tx, RecordBatch::SimpleRefset)
        }));
    }
    for path in &files.language_refset_files {
        let path = path.clone();
        jobs.push(Box::new(move |cfg, token, tx| {
            run_file::<Rf2LanguageRefsetMember, _>(
                &path,
                cfg,
                token,
                tx,
                RecordBatch::LanguageRefset,
            )
        }));
    }
    for path in &files.association_refset_files {
        let path = path.clone();
        jobs.push(Box::new(move |cfg, token, tx| {
            run_file::<Rf2AssociationRefsetMember, _>(
                &path,
                cfg,
                token,
                tx,
                RecordBatch::AssociationRefset,
            )
        }));
    }
    for path in &files.simple_map_refset_files {
        let path = path.clone();
        jobs.push(Box::new(move |cfg, token, tx| {
            run_file::<Rf2SimpleMapRefsetMember, _>(
                &path,
                cfg,
                token,
                tx,
                RecordBatch::SimpleMapRefset,
            )
        }));
    }
    for path in files
        .complex_map_refset_files
        .iter()
        .chain(files.extended_map_refset_files.iter())
    {
        let path = path.clone();
        jobs.push(Box::new(move |cfg, token, tx| {
            run_file::<Rf2ComplexMapRefsetMember, _>(
                &path,
                cfg,
                token,
                tx,
                RecordBatch::ComplexMapRefset,
            )
        }));
    }
    for path in &files.attribute_value_refset_files {
        let path = path.clone();
        jobs.push(Box::new(move |cfg, token, tx| {
            run_file::<Rf2AttributeValueRefsetMember, _>(
                &path,
                cfg,
                token,
                tx,
                RecordBatch::AttributeValueRefset,
            )
        }));
    }
    for path in &files.refset_descriptor_files {
        let path = path.clone();
        jobs.push(Box::new(move |cfg, token, tx| {
            run_file::<Rf2RefsetDescriptorMember, _>(
                &path,
                cfg,
                token,
                tx,
                RecordBatch::RefsetDescriptor,
            )
        }));
    }

    jobs
}

fn run_file<T, W>(
    path: &std::path::Path,
    cfg: &Rf2Config,
    token: &CancellationToken,
    tx: &crossbeam_channel::Sender<RecordBatch>,
    wrap: W,
) -> Rf2Result<(usize, usize)>
where
    T: crate::parser::Rf2Record,
    W: Fn(Vec<T>) -> RecordBatch,
{
    let parser = Rf2Parser::<_, T>::from_path(path, cfg.clone())?;
    let mut committed = 0;
    let mut skipped = 0;

    let batch_size = cfg.batch_size;
    let mut batch = Vec::with_capacity(batch_size);

    for result in parser {
        if token.is_cancelled() {
            return Ok((committed, skipped));
        }
        match result {
            Ok(record) => batch.push(record),
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping malformed RF2 row");
                skipped += 1;
                continue;
            }
        }
        if batch.len() >= batch_size {
            committed += batch.len();
            let sent = std::mem::replace(&mut batch, Vec::with_capacity(batch_size));
            if tx.send(wrap(sent)).is_err() {
                return Ok((committed, skipped));
            }
        }
    }
    if !batch.is_empty() {
        committed += batch.len();
        let _ = tx.send(wrap(batch));
    }

    Ok((committed, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_concepts(dir: &std::path::Path, rows: &[&str]) -> std::path::PathBuf {
        let path = dir.join("sct2_Concept_Snapshot_INT_20250101.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "id\teffectiveTime\tactive\tmoduleId\tdefinitionStatusId").unwrap();
        for row in rows {
            writeln!(f, "{row}").unwrap();
        }
        path
    }

    #[test]
    fn cancellation_token_defaults_uncancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn pipeline_commits_every_row_across_a_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_concepts(
            dir.path(),
            &[
                "24700007\t20020131\t1\t900000000000207008\t900000000000074008",
                "6118003\t20020131\t1\t900000000000207008\t900000000000074008",
            ],
        );

        let mut only_concepts = Rf2Files::new();
        only_concepts.concept_file = Some(path);

        let pipeline = ImportPipeline::new(PipelineConfig {
            worker_count: 2,
            ..Default::default()
        });
        let token = CancellationToken::new();
        let mut seen = 0;
        let outcome = pipeline
            .run(&only_concepts, &token, |batch| {
                if let RecordBatch::Concepts(rows) = batch {
                    seen += rows.len();
                }
                Ok(())
            })
            .unwrap();

        assert_eq!(seen, 2);
        assert_eq!(outcome.committed, 2);
        assert!(!outcome.cancelled);
    }
}
