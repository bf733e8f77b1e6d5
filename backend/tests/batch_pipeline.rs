//! End-to-end tests of the batch run: the blocking row loop, the progress
//! updater and the archive stage, driven with a scripted in-process
//! converter instead of a real rendering engine.

use backend::config::AppConfig;
use backend::db;
use backend::job_controller::state::{start_progress_updater, ProgressState};
use backend::pipeline::convert::{ConvertError, DocumentConverter};
use backend::pipeline::dataset::Dataset;
use backend::services::batches::start::spawn_batch_run;
use chrono::Utc;
use common::model::batch::{Batch, BatchStatus};
use common::model::certificate::CertificateStatus;
use common::model::template::{Template, TemplateType};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Converter that writes a fake PDF, or fails on scripted calls.
struct ScriptedConverter {
    calls: AtomicUsize,
    fail_calls: Vec<usize>,
    fail_all: bool,
}

impl ScriptedConverter {
    fn reliable() -> Self {
        ScriptedConverter {
            calls: AtomicUsize::new(0),
            fail_calls: Vec::new(),
            fail_all: false,
        }
    }

    fn failing_on(calls: Vec<usize>) -> Self {
        ScriptedConverter {
            calls: AtomicUsize::new(0),
            fail_calls: calls,
            fail_all: false,
        }
    }

    fn broken() -> Self {
        ScriptedConverter {
            calls: AtomicUsize::new(0),
            fail_calls: Vec::new(),
            fail_all: true,
        }
    }
}

impl DocumentConverter for ScriptedConverter {
    fn convert(&self, _input: &Path, output: &Path) -> Result<(), ConvertError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_all || self.fail_calls.contains(&call) {
            return Err(ConvertError::Engine {
                status: 1,
                stderr: "engine offline".to_string(),
            });
        }
        std::fs::write(output, b"%PDF-1.4 test")?;
        Ok(())
    }
}

fn test_config(dir: &tempfile::TempDir) -> AppConfig {
    let storage_root = dir.path().join("data");
    std::fs::create_dir_all(&storage_root).unwrap();
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_path: storage_root.join("test.sqlite"),
        converter_bin: "unused".to_string(),
        storage_root,
    }
}

/// Minimal DOCX-shaped package with two placeholders.
fn write_template_package(path: &Path) {
    let file = File::create(path).unwrap();
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    writer.start_file("[Content_Types].xml", options).unwrap();
    writer.write_all(b"<?xml version=\"1.0\"?><Types/>").unwrap();
    writer.start_file("word/document.xml", options).unwrap();
    writer
        .write_all(b"<w:t>Awarded to {{recipient_name}} for {{course}}</w:t>")
        .unwrap();
    writer.finish().unwrap();
}

fn insert_template(config: &AppConfig, owner: &str) -> Template {
    let templates_dir = config.templates_dir();
    std::fs::create_dir_all(&templates_dir).unwrap();
    let file_path = templates_dir.join("cert.docx");
    write_template_package(&file_path);

    let now = Utc::now();
    let template = Template {
        id: "tmpl-1".to_string(),
        owner_id: owner.to_string(),
        name: "Course certificate".to_string(),
        description: None,
        template_type: TemplateType::Docx,
        file_path: file_path.to_string_lossy().into_owned(),
        placeholders: vec!["recipient_name".to_string(), "course".to_string()],
        created_at: now,
        updated_at: now,
    };
    let conn = db::open(config).unwrap();
    db::templates::insert(&conn, &template).unwrap();
    template
}

fn insert_batch(config: &AppConfig, owner: &str, template: &Template, total: u32) -> Batch {
    let now = Utc::now();
    let batch = Batch {
        id: "batch-1".to_string(),
        owner_id: owner.to_string(),
        template_id: template.id.clone(),
        name: template.name.clone(),
        status: BatchStatus::Pending,
        total_certificates: total,
        processed_certificates: 0,
        generated_certificates: 0,
        mappings: mappings(),
        zip_path: None,
        error: None,
        created_at: now,
        updated_at: now,
    };
    let conn = db::open(config).unwrap();
    db::batches::insert(&conn, &batch).unwrap();
    batch
}

fn mappings() -> HashMap<String, String> {
    [
        ("Name".to_string(), "recipient_name".to_string()),
        ("Course".to_string(), "course".to_string()),
    ]
    .into_iter()
    .collect()
}

fn dataset(names: &[&str]) -> Dataset {
    Dataset {
        headers: vec!["Name".to_string(), "Course".to_string()],
        rows: names
            .iter()
            .map(|name| {
                [
                    ("Name".to_string(), name.to_string()),
                    ("Course".to_string(), "Rust".to_string()),
                ]
                .into_iter()
                .collect()
            })
            .collect(),
    }
}

/// Create a throwaway uploaded dataset file, as the handler would.
fn fake_upload(config: &AppConfig) -> PathBuf {
    let dir = config.datasets_dir();
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("batch-1.csv");
    std::fs::write(&path, "Name,Course\n").unwrap();
    path
}

async fn run_to_terminal(
    config: &AppConfig,
    converter: Arc<dyn DocumentConverter>,
    template: Template,
    dataset: Dataset,
) -> Batch {
    let (tx, rx) = mpsc::channel(100);
    let progress = ProgressState { tx };
    let updater_config = config.clone();
    tokio::spawn(async move {
        start_progress_updater(updater_config, rx).await;
    });

    spawn_batch_run(
        config.clone(),
        progress,
        converter,
        "batch-1".to_string(),
        "alice".to_string(),
        template,
        dataset,
        mappings(),
        fake_upload(config),
    );

    for _ in 0..400 {
        tokio::time::sleep(Duration::from_millis(25)).await;
        let conn = db::open(config).unwrap();
        if let Some(batch) = db::batches::get(&conn, "batch-1").unwrap() {
            if batch.status.is_terminal() {
                return batch;
            }
        }
    }
    panic!("batch never reached a terminal state");
}

fn archive_entries(path: &str) -> Vec<String> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn all_rows_valid_completes_with_full_archive() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    db::init_schema(&config).unwrap();
    let template = insert_template(&config, "alice");
    insert_batch(&config, "alice", &template, 3);

    let batch = run_to_terminal(
        &config,
        Arc::new(ScriptedConverter::reliable()),
        template,
        dataset(&["Ada", "Grace", "Katherine"]),
    )
    .await;

    assert_eq!(batch.status, BatchStatus::Completed);
    assert_eq!(batch.processed_certificates, 3);
    assert_eq!(batch.generated_certificates, 3);

    let conn = db::open(&config).unwrap();
    let certificates = db::certificates::list_for_batch(&conn, "batch-1").unwrap();
    assert_eq!(certificates.len(), 3);
    assert!(certificates
        .iter()
        .all(|c| c.status == CertificateStatus::Generated));
    assert_eq!(certificates[0].recipient_name, "Ada");

    let entries = archive_entries(batch.zip_path.as_deref().unwrap());
    assert_eq!(entries, vec!["ada-1.pdf", "grace-2.pdf", "katherine-3.pdf"]);

    // Native intermediates are cleaned up on the success path.
    let leftovers: Vec<_> = std::fs::read_dir(config.batch_dir("batch-1"))
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().map(|x| x == "docx").unwrap_or(false))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn one_bad_row_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    db::init_schema(&config).unwrap();
    let template = insert_template(&config, "alice");
    insert_batch(&config, "alice", &template, 3);

    // Second conversion fails; the batch must still complete.
    let batch = run_to_terminal(
        &config,
        Arc::new(ScriptedConverter::failing_on(vec![1])),
        template,
        dataset(&["Ada", "Grace", "Katherine"]),
    )
    .await;

    assert_eq!(batch.status, BatchStatus::Completed);
    assert_eq!(batch.processed_certificates, 3);
    assert_eq!(batch.generated_certificates, 2);

    let conn = db::open(&config).unwrap();
    let certificates = db::certificates::list_for_batch(&conn, "batch-1").unwrap();
    assert_eq!(certificates.len(), 3);
    assert_eq!(certificates[0].status, CertificateStatus::Generated);
    assert_eq!(certificates[1].status, CertificateStatus::Failed);
    assert!(certificates[1]
        .error
        .as_deref()
        .unwrap()
        .contains("engine offline"));
    assert_eq!(certificates[2].status, CertificateStatus::Generated);

    // The failed row leaves no entry in the archive.
    let entries = archive_entries(batch.zip_path.as_deref().unwrap());
    assert_eq!(entries, vec!["ada-1.pdf", "katherine-3.pdf"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn engine_down_for_every_row_still_completes() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    db::init_schema(&config).unwrap();
    let template = insert_template(&config, "alice");
    insert_batch(&config, "alice", &template, 2);

    let batch = run_to_terminal(
        &config,
        Arc::new(ScriptedConverter::broken()),
        template,
        dataset(&["Ada", "Grace"]),
    )
    .await;

    // Row errors are absorbed, so the batch completes with zero output.
    assert_eq!(batch.status, BatchStatus::Completed);
    assert_eq!(batch.processed_certificates, 2);
    assert_eq!(batch.generated_certificates, 0);

    let conn = db::open(&config).unwrap();
    let certificates = db::certificates::list_for_batch(&conn, "batch-1").unwrap();
    assert_eq!(certificates.len(), 2);
    assert!(certificates
        .iter()
        .all(|c| c.status == CertificateStatus::Failed));

    assert!(archive_entries(batch.zip_path.as_deref().unwrap()).is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_template_file_fails_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    db::init_schema(&config).unwrap();
    let template = insert_template(&config, "alice");
    insert_batch(&config, "alice", &template, 2);

    // Template vanishes between acceptance and processing.
    std::fs::remove_file(&template.file_path).unwrap();

    let upload = config.datasets_dir().join("batch-1.csv");
    let batch = run_to_terminal(
        &config,
        Arc::new(ScriptedConverter::reliable()),
        template,
        dataset(&["Ada", "Grace"]),
    )
    .await;

    assert_eq!(batch.status, BatchStatus::Failed);
    assert!(batch.error.as_deref().unwrap().contains("missing"));
    assert_eq!(batch.processed_certificates, 0);

    let conn = db::open(&config).unwrap();
    assert!(db::certificates::list_for_batch(&conn, "batch-1")
        .unwrap()
        .is_empty());

    // Fatal-path cleanup: working directory and uploaded dataset gone.
    assert!(!config.batch_dir("batch-1").exists());
    assert!(!upload.exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn counters_stay_bounded_by_total() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    db::init_schema(&config).unwrap();
    let template = insert_template(&config, "alice");
    insert_batch(&config, "alice", &template, 5);

    let names = ["Ada", "Grace", "Katherine", "Margaret", "Radia"];
    let batch = run_to_terminal(
        &config,
        Arc::new(ScriptedConverter::failing_on(vec![0, 4])),
        template,
        dataset(&names),
    )
    .await;

    assert_eq!(batch.status, BatchStatus::Completed);
    assert_eq!(batch.processed_certificates, batch.total_certificates);
    assert!(batch.generated_certificates <= batch.total_certificates);
    assert_eq!(batch.generated_certificates, 3);
}
