//! Batch controller scenarios against scripted fakes of every collaborator.

use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use aconv_media::{
    truncate_on_char_boundary, EncodeProcess, Encoder, ExitOutcome, FfmpegCommand,
    MediaInspector, MediaResult,
};
use aconv_models::{BatchRequest, EncodingConfig, OutputFormat};
use aconv_worker::{
    AcceptAll, BatchController, Collaborators, ConverterConfig, DisplaySurface, LossPolicy,
    Notification, Notifier, PolicyQuery, SurfaceHandle,
};
use async_trait::async_trait;
use tempfile::TempDir;

#[derive(Debug, Clone)]
enum Step {
    /// Append an elapsed-time record (microseconds) and keep running
    Progress(u64),
    Exit(i32),
}

#[derive(Debug, Clone)]
struct Script {
    steps: Vec<Step>,
    diagnostics: String,
}

impl Script {
    fn halfway_then_ok() -> Self {
        Self {
            steps: vec![Step::Progress(5_000_000), Step::Exit(0)],
            diagnostics: String::new(),
        }
    }

    fn fails_with(diagnostics: &str) -> Self {
        Self {
            steps: vec![Step::Exit(1)],
            diagnostics: diagnostics.to_string(),
        }
    }

    fn runs_forever() -> Self {
        Self {
            steps: vec![Step::Progress(5_000_000)],
            diagnostics: String::new(),
        }
    }
}

#[derive(Debug, Default)]
struct EncoderLog {
    spawned: Vec<String>,
    killed: Vec<String>,
}

struct FakeEncoder {
    scripts: HashMap<String, Script>,
    log: Arc<Mutex<EncoderLog>>,
}

#[async_trait]
impl Encoder for FakeEncoder {
    async fn spawn(&self, cmd: &FfmpegCommand) -> MediaResult<Box<dyn EncodeProcess>> {
        let name = file_name(cmd.input());
        let script = self
            .scripts
            .get(&name)
            .cloned()
            .unwrap_or_else(Script::halfway_then_ok);
        std::fs::write(cmd.output(), b"partial")?;
        self.log.lock().unwrap().spawned.push(name.clone());

        Ok(Box::new(FakeProcess {
            name,
            steps: script.steps.into(),
            diagnostics: script.diagnostics,
            progress: cmd.progress_path().map(Path::to_path_buf),
            exit: None,
            log: self.log.clone(),
        }))
    }
}

struct FakeProcess {
    name: String,
    steps: VecDeque<Step>,
    diagnostics: String,
    progress: Option<PathBuf>,
    exit: Option<ExitOutcome>,
    log: Arc<Mutex<EncoderLog>>,
}

#[async_trait]
impl EncodeProcess for FakeProcess {
    fn try_wait(&mut self) -> MediaResult<Option<ExitOutcome>> {
        if self.exit.is_some() {
            return Ok(self.exit);
        }
        match self.steps.pop_front() {
            Some(Step::Progress(us)) => {
                if let Some(path) = &self.progress {
                    let mut file = std::fs::OpenOptions::new().append(true).open(path)?;
                    write!(file, "out_time_ms={us}\nprogress=continue\n")?;
                }
                Ok(None)
            }
            Some(Step::Exit(code)) => {
                self.exit = Some(ExitOutcome { code: Some(code) });
                Ok(self.exit)
            }
            None => Ok(None),
        }
    }

    async fn kill(&mut self) -> MediaResult<()> {
        self.log.lock().unwrap().killed.push(self.name.clone());
        self.exit = Some(ExitOutcome { code: None });
        Ok(())
    }

    async fn diagnostics(&mut self, limit: usize) -> String {
        truncate_on_char_boundary(&self.diagnostics, limit)
    }
}

/// Durations per file name, falling back to a default; codec follows the file
/// extension.
struct FakeInspector {
    duration: Option<f64>,
    durations: HashMap<String, f64>,
    probed: Mutex<Vec<String>>,
}

#[async_trait]
impl MediaInspector for FakeInspector {
    async fn duration(&self, path: &Path) -> Option<f64> {
        let name = file_name(path);
        let duration = self.durations.get(&name).copied().or(self.duration);
        self.probed.lock().unwrap().push(name);
        duration
    }

    async fn audio_codec(&self, path: &Path) -> Option<String> {
        self.probed.lock().unwrap().push(file_name(path));
        path.extension().map(|e| e.to_string_lossy().into_owned())
    }
}

#[derive(Debug, Default)]
struct SurfaceLog {
    opened: Vec<(String, String)>,
    updates: Vec<(u8, Option<String>)>,
    closes: usize,
}

/// Records each value with the label that followed it.
struct FakeSurface {
    available: bool,
    /// Value whose update reports the surface gone
    fail_at_value: Option<u8>,
    log: Arc<Mutex<SurfaceLog>>,
}

#[async_trait]
impl DisplaySurface for FakeSurface {
    async fn open(&self, title: &str, label: &str) -> Option<SurfaceHandle> {
        self.log
            .lock()
            .unwrap()
            .opened
            .push((title.to_string(), label.to_string()));
        self.available
            .then(|| SurfaceHandle::parse("org.kde.kdialog-1 /ProgressDialog"))
            .flatten()
    }

    async fn update(&self, _handle: &SurfaceHandle, value: u8) -> bool {
        self.log.lock().unwrap().updates.push((value, None));
        self.fail_at_value != Some(value)
    }

    async fn set_label(&self, _handle: &SurfaceHandle, label: &str) {
        if let Some(last) = self.log.lock().unwrap().updates.last_mut() {
            last.1 = Some(label.to_string());
        }
    }

    async fn close(&self, _handle: &SurfaceHandle) {
        self.log.lock().unwrap().closes += 1;
    }
}

/// Rejects lossy sources without asking.
struct RejectLossy;

#[async_trait]
impl LossPolicy for RejectLossy {
    async fn accept(&self, query: &PolicyQuery) -> bool {
        !query.needs_confirmation()
    }
}

#[derive(Default)]
struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
    dialogs: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) {
        self.notifications.lock().unwrap().push(notification.clone());
    }

    async fn error_dialog(&self, title: &str, message: &str) {
        self.dialogs
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

struct Harness {
    media: TempDir,
    work: TempDir,
    scripts: HashMap<String, Script>,
    duration: Option<f64>,
    durations: HashMap<String, f64>,
    surface_available: bool,
    fail_at_value: Option<u8>,
    policy: Arc<dyn LossPolicy>,
}

struct Run {
    result: aconv_models::BatchResult,
    encoder: Arc<Mutex<EncoderLog>>,
    surface: Arc<Mutex<SurfaceLog>>,
    inspector: Arc<FakeInspector>,
    notifier: Arc<RecordingNotifier>,
}

impl Harness {
    fn new() -> Self {
        Self {
            media: TempDir::new().unwrap(),
            work: TempDir::new().unwrap(),
            scripts: HashMap::new(),
            duration: Some(10.0),
            durations: HashMap::new(),
            surface_available: true,
            fail_at_value: None,
            policy: Arc::new(AcceptAll),
        }
    }

    fn input(&self, name: &str) -> PathBuf {
        let path = self.media.path().join(name);
        std::fs::write(&path, b"audio").unwrap();
        path
    }

    fn script(mut self, name: &str, script: Script) -> Self {
        self.scripts.insert(name.to_string(), script);
        self
    }

    async fn run(&self, inputs: Vec<PathBuf>, format: OutputFormat) -> Run {
        let encoder_log = Arc::new(Mutex::new(EncoderLog::default()));
        let surface_log = Arc::new(Mutex::new(SurfaceLog::default()));
        let inspector = Arc::new(FakeInspector {
            duration: self.duration,
            durations: self.durations.clone(),
            probed: Mutex::new(Vec::new()),
        });
        let notifier = Arc::new(RecordingNotifier::default());

        let collaborators = Collaborators {
            inspector: inspector.clone(),
            encoder: Arc::new(FakeEncoder {
                scripts: self.scripts.clone(),
                log: encoder_log.clone(),
            }),
            surface: Arc::new(FakeSurface {
                available: self.surface_available,
                fail_at_value: self.fail_at_value,
                log: surface_log.clone(),
            }),
            policy: self.policy.clone(),
            notifier: notifier.clone(),
        };

        let mut config = ConverterConfig::default()
            .with_poll_interval(Duration::from_millis(1))
            .with_work_dir(self.work.path());
        config.surface_call_timeout = Duration::from_secs(5);

        let request =
            BatchRequest::from_encoding(inputs, &EncodingConfig::with_default_quality(format));
        let result = BatchController::new(config, collaborators)
            .run(&request)
            .await;

        Run {
            result,
            encoder: encoder_log,
            surface: surface_log,
            inspector,
            notifier,
        }
    }

    fn work_dir_is_empty(&self) -> bool {
        std::fs::read_dir(self.work.path()).unwrap().next().is_none()
    }
}

impl Run {
    fn values(&self) -> Vec<u8> {
        self.surface.lock().unwrap().updates.iter().map(|(v, _)| *v).collect()
    }

    fn converting_values(&self) -> Vec<u8> {
        self.surface
            .lock()
            .unwrap()
            .updates
            .iter()
            .filter(|(_, label)| {
                label
                    .as_deref()
                    .is_some_and(|l| l.starts_with("Converting:"))
            })
            .map(|(v, _)| *v)
            .collect()
    }
}

fn assert_non_decreasing(values: &[u8]) {
    assert!(
        values.windows(2).all(|w| w[0] <= w[1]),
        "forwarded values went backwards: {values:?}"
    );
}

#[tokio::test]
async fn two_tasks_sweep_the_scale_once() {
    let harness = Harness::new();
    let inputs = vec![harness.input("a.flac"), harness.input("b.flac")];
    let run = harness.run(inputs, OutputFormat::Mp3).await;

    assert_eq!(run.result.done, 2);
    assert!(!run.result.cancelled);
    assert!(run.result.errors.is_empty());
    assert_eq!(run.converting_values(), vec![25, 75]);

    let surface = run.surface.lock().unwrap();
    assert_eq!(
        surface.opened,
        vec![(
            "Audio Converter - MP3 (V0)".to_string(),
            "Starting… (0 of 2)".to_string()
        )]
    );
    let labels: Vec<_> = surface
        .updates
        .iter()
        .map(|(v, l)| (*v, l.clone().unwrap_or_default()))
        .collect();
    assert_eq!(
        labels,
        vec![
            (0, "Preparing: [1/2] a.flac".to_string()),
            (25, "Converting: [1/2] a.flac".to_string()),
            (50, "Done: [1/2] a.flac".to_string()),
            (50, "Preparing: [2/2] b.flac".to_string()),
            (75, "Converting: [2/2] b.flac".to_string()),
            (100, "Done: [2/2] b.flac".to_string()),
            (100, "Finished".to_string()),
        ]
    );
    assert_eq!(surface.closes, 1);
    drop(surface);

    assert!(harness.media.path().join("a.mp3").exists());
    assert!(harness.media.path().join("b.mp3").exists());
    assert!(harness.work_dir_is_empty());

    let notes = run.notifier.notifications.lock().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "Audio Converter - Done");
    assert_eq!(notes[0].body, "✔  2 files → MP3 (V0)");
}

#[tokio::test]
async fn each_task_uses_its_own_duration() {
    let mut harness = Harness::new().script(
        "b.flac",
        Script {
            steps: vec![Step::Progress(10_000_000), Step::Exit(0)],
            diagnostics: String::new(),
        },
    );
    harness.durations.insert("a.flac".to_string(), 10.0);
    harness.durations.insert("b.flac".to_string(), 20.0);
    let inputs = vec![harness.input("a.flac"), harness.input("b.flac")];
    let run = harness.run(inputs, OutputFormat::Mp3).await;

    assert_eq!(run.result.done, 2);
    assert_eq!(run.converting_values(), vec![25, 75]);
}

#[tokio::test]
async fn failed_encode_is_recorded_and_the_batch_continues() {
    let harness = Harness::new().script(
        "b.flac",
        Script::fails_with("Invalid data found when processing input"),
    );
    let inputs = vec![
        harness.input("a.flac"),
        harness.input("b.flac"),
        harness.input("c.flac"),
    ];
    let run = harness.run(inputs, OutputFormat::Mp3).await;

    assert_eq!(run.result.done, 2);
    assert_eq!(
        run.result.errors,
        vec!["b.flac:\nInvalid data found when processing input".to_string()]
    );
    assert!(!run.result.cancelled);
    assert_eq!(
        run.encoder.lock().unwrap().spawned,
        vec!["a.flac", "b.flac", "c.flac"]
    );

    assert!(harness.media.path().join("a.mp3").exists());
    assert!(!harness.media.path().join("b.mp3").exists());
    assert!(harness.media.path().join("c.mp3").exists());
    assert!(harness.work_dir_is_empty());

    let values = run.values();
    assert_non_decreasing(&values);
    assert_eq!(values.last(), Some(&100));

    let dialogs = run.notifier.dialogs.lock().unwrap();
    assert_eq!(dialogs.len(), 1);
    assert!(dialogs[0].1.starts_with("Converted 2 of 3 file(s).\n\nErrors:\n"));
    let notes = run.notifier.notifications.lock().unwrap();
    assert_eq!(notes[0].body, "2/3 converted, 1 failed.");
}

#[tokio::test]
async fn lost_display_cancels_the_whole_batch() {
    let mut harness = Harness::new().script("b.flac", Script::runs_forever());
    // Task 2 of 3 owns [33, 66); halfway through it is 49.
    harness.fail_at_value = Some(49);
    let inputs = vec![
        harness.input("a.flac"),
        harness.input("b.flac"),
        harness.input("c.flac"),
    ];
    let run = harness.run(inputs, OutputFormat::Ogg).await;

    assert_eq!(run.result.done, 1);
    assert!(run.result.cancelled);
    assert_eq!(run.result.cancelled_at, Some(2));
    assert!(run.result.errors.is_empty());

    let encoder = run.encoder.lock().unwrap();
    assert_eq!(encoder.spawned, vec!["a.flac", "b.flac"]);
    assert_eq!(encoder.killed, vec!["b.flac"]);
    drop(encoder);

    assert!(harness.media.path().join("a.ogg").exists());
    assert!(!harness.media.path().join("b.ogg").exists());
    assert!(!harness.media.path().join("c.ogg").exists());
    assert!(harness.work_dir_is_empty());

    let surface = run.surface.lock().unwrap();
    assert_eq!(surface.closes, 1);
    // Nothing is pushed once the failing update has been seen, not even its label.
    assert_eq!(surface.updates.last(), Some(&(49, None)));
    drop(surface);

    let notes = run.notifier.notifications.lock().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "Audio Converter - Cancelled");
    assert_eq!(notes[0].body, "Cancelled on file 2 of 3");
}

#[tokio::test]
async fn missing_input_spawns_nothing() {
    let harness = Harness::new();
    let gone = harness.media.path().join("gone.flac");
    let inputs = vec![harness.input("a.flac"), gone.clone(), harness.input("c.flac")];
    let run = harness.run(inputs, OutputFormat::Wav).await;

    assert_eq!(run.result.done, 2);
    assert_eq!(
        run.result.errors,
        vec![format!("File not found: {}", gone.display())]
    );
    assert_eq!(run.encoder.lock().unwrap().spawned, vec!["a.flac", "c.flac"]);
    assert!(!run
        .inspector
        .probed
        .lock()
        .unwrap()
        .contains(&"gone.flac".to_string()));
    assert!(harness.work_dir_is_empty());
}

#[tokio::test]
async fn policy_rejection_skips_without_failing() {
    let mut harness = Harness::new();
    harness.policy = Arc::new(RejectLossy);
    let inputs = vec![harness.input("a.flac"), harness.input("b.mp3")];
    let run = harness.run(inputs, OutputFormat::Ogg).await;

    assert_eq!(run.result.done, 1);
    assert_eq!(run.result.skipped, 1);
    assert!(run.result.errors.is_empty());
    assert!(!run.result.cancelled);
    assert_eq!(run.encoder.lock().unwrap().spawned, vec!["a.flac"]);
    assert_eq!(run.values().last(), Some(&100));

    let notes = run.notifier.notifications.lock().unwrap();
    assert_eq!(notes[0].body, "✔  1 file → OGG (Q6)");
}

#[tokio::test]
async fn unknown_duration_advances_only_at_completion() {
    let mut harness = Harness::new();
    harness.duration = None;
    let inputs = vec![harness.input("a.flac"), harness.input("b.flac")];
    let run = harness.run(inputs, OutputFormat::Flac).await;

    assert_eq!(run.result.done, 2);
    assert!(run.converting_values().is_empty());
    assert_eq!(run.values(), vec![0, 50, 50, 100, 100]);
}

#[tokio::test]
async fn batch_runs_without_a_display() {
    let mut harness = Harness::new().script("b.flac", Script::fails_with("boom"));
    harness.surface_available = false;
    let inputs = vec![harness.input("a.flac"), harness.input("b.flac")];
    let run = harness.run(inputs, OutputFormat::M4a).await;

    assert_eq!(run.result.done, 1);
    assert_eq!(run.result.errors.len(), 1);
    assert!(!run.result.cancelled);

    let surface = run.surface.lock().unwrap();
    assert_eq!(surface.opened.len(), 1);
    assert!(surface.updates.is_empty());
    assert_eq!(surface.closes, 0);
}

#[tokio::test]
async fn forwarded_values_never_decrease_across_many_tasks() {
    let harness = Harness::new().script("f3.flac", Script::fails_with("bad"));
    let inputs: Vec<_> = (0..7).map(|i| harness.input(&format!("f{i}.flac"))).collect();
    let run = harness.run(inputs, OutputFormat::Opus).await;

    assert_eq!(run.result.done, 6);
    let values = run.values();
    assert_non_decreasing(&values);
    assert_eq!(values.first(), Some(&0));
    assert_eq!(values.last(), Some(&100));
}
