//! Integration tests for the blog workflow
//!
//! These tests drive the whole pipeline through the public API using a
//! scripted model and a recording publisher.

use async_trait::async_trait;
use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
use quill_rs::adk::agent::{LLMAgent, StructuredAgent};
use quill_rs::adk::error::{QuillError, Result, WorkflowError};
use quill_rs::adk::model::{Content, GenerationConfig, Model};
use quill_rs::quill::blogger::credentials::StaticToken;
use quill_rs::quill::blogger::{BloggerClient, PostPayload, PublishedPost, Publisher};
use quill_rs::quill::format::{format_text_to_html, render_document};
use quill_rs::quill::workflow::{
    BlogWorkflow, Checkpointer, Decision, FileCheckpointer, HumanInput, MemoryCheckpointer,
    NodeId, RunOutcome, WorkflowSettings,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Mock Components
// ============================================================================

/// Mock model that replays canned replies in order and records every prompt
struct MockModel {
    replies: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
}

impl MockModel {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().rev().map(|r| r.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn writer_prompts(&self) -> Vec<String> {
        self.prompts()
            .into_iter()
            .filter(|p| p.starts_with("Write a blog content"))
            .collect()
    }
}

#[async_trait]
impl Model for MockModel {
    async fn generate_content(
        &self,
        history: &[Content],
        _config: Option<&GenerationConfig>,
    ) -> Result<Content> {
        let prompt = history.last().map(|c| c.text()).unwrap_or_default();
        self.prompts.lock().unwrap().push(prompt);
        match self.replies.lock().unwrap().pop() {
            Some(reply) => Ok(Content::model(reply)),
            None => Err(QuillError::other("mock model ran out of replies")),
        }
    }
}

/// Mock publisher that records every payload
#[derive(Default)]
struct RecordingPublisher {
    posts: Mutex<Vec<PostPayload>>,
}

impl RecordingPublisher {
    fn count(&self) -> usize {
        self.posts.lock().unwrap().len()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn insert_post(&self, post: &PostPayload) -> Result<PublishedPost> {
        let mut posts = self.posts.lock().unwrap();
        posts.push(post.clone());
        Ok(PublishedPost {
            author: "Ada".to_string(),
            status: "LIVE".to_string(),
            url: format!("https://blog.example/posts/{}", posts.len()),
        })
    }
}

/// Publisher that waits before answering, or fails every call
struct SlowPublisher {
    delay: Duration,
    fail: bool,
    calls: AtomicUsize,
}

impl SlowPublisher {
    fn new(delay: Duration, fail: bool) -> Arc<Self> {
        Arc::new(Self {
            delay,
            fail,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Publisher for SlowPublisher {
    async fn insert_post(&self, _post: &PostPayload) -> Result<PublishedPost> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(QuillError::api("Blogger", "503 Service Unavailable"));
        }
        Ok(PublishedPost {
            author: "Ada".to_string(),
            status: "LIVE".to_string(),
            url: "https://blog.example/slow".to_string(),
        })
    }
}

fn approve(feedback: &str) -> String {
    json!({ "approve_or_reject": "Approved", "feedback": feedback }).to_string()
}

fn reject(feedback: &str) -> String {
    json!({ "approve_or_reject": "Rejected", "feedback": feedback }).to_string()
}

fn workflow_with(
    model: Arc<MockModel>,
    publisher: Arc<dyn Publisher>,
    checkpointer: Arc<dyn Checkpointer>,
    settings: WorkflowSettings,
) -> BlogWorkflow {
    let model: Arc<dyn Model> = model;
    let writer = LLMAgent::new(
        "Blog Writer".to_string(),
        "Writes drafts".to_string(),
        "You write blog posts.".to_string(),
        model.clone(),
    );
    let reviewer = StructuredAgent::new(
        "Blog Reviewer".to_string(),
        "You review blog posts.".to_string(),
        model,
    )
    .unwrap();

    BlogWorkflow::new(
        Arc::new(writer),
        Arc::new(reviewer),
        publisher,
        checkpointer,
        settings,
    )
}

fn workflow(model: Arc<MockModel>, publisher: Arc<RecordingPublisher>) -> BlogWorkflow {
    workflow_with(
        model,
        publisher,
        Arc::new(MemoryCheckpointer::new()),
        WorkflowSettings::default(),
    )
}

// ============================================================================
// Workflow Tests
// ============================================================================

#[tokio::test]
async fn test_reject_then_approve_then_publish() {
    let review_f = reject("F");
    let review_ok = approve("Good");
    let model = MockModel::new(&["draft one", review_f.as_str(), "## T\ndraft two", review_ok.as_str()]);
    let publisher = Arc::new(RecordingPublisher::default());
    let wf = workflow(model.clone(), publisher.clone());

    let outcome = wf.start_session("e2e", "T").await.unwrap();
    assert!(outcome.is_suspended());
    assert_eq!(outcome.state().content, "## T\ndraft two");
    assert_eq!(outcome.state().revisions, 2);
    assert_eq!(publisher.count(), 0);

    let writer_prompts = model.writer_prompts();
    assert_eq!(writer_prompts.len(), 2);
    assert_eq!(writer_prompts[0], "Write a blog content about the T");
    assert!(writer_prompts[1].contains("take into account the feedback F"));

    let checkpoint = wf.status("e2e").await.unwrap().unwrap();
    assert_eq!(checkpoint.node, NodeId::HumanGate);
    assert_eq!(checkpoint.state.reviewer_decision, Some(Decision::Approved));

    let done = wf.resume("e2e", HumanInput::approve()).await.unwrap();
    match &done {
        RunOutcome::Completed { state, .. } => {
            assert_eq!(
                state.published_url.as_deref(),
                Some("https://blog.example/posts/1")
            );
        }
        other => panic!("expected completion, got {:?}", other),
    }

    assert_eq!(publisher.count(), 1);
    let post = publisher.posts.lock().unwrap()[0].clone();
    assert_eq!(post.title, "T");
    assert_eq!(post.content_type, "html");
    assert_eq!(post.custom_meta_data, "This is meta data");
    assert!(post.content.contains("<h1>T</h1>"));
    assert!(post.content.contains("<p>draft two</p>"));

    assert!(wf.status("e2e").await.unwrap().is_none());
}

#[tokio::test]
async fn test_reviewer_approval_always_pauses_at_gate() {
    let review_ok = approve("");
    let model = MockModel::new(&["draft", review_ok.as_str()]);
    let publisher = Arc::new(RecordingPublisher::default());
    let wf = workflow(model, publisher.clone());

    let outcome = wf.start("Rust").await.unwrap();
    assert!(outcome.is_suspended());
    assert!(outcome.state().human_decision.is_none());
    assert_eq!(publisher.count(), 0);
}

#[tokio::test]
async fn test_human_rejection_returns_to_writer_without_publishing() {
    let review_ok = approve("fine");
    let model = MockModel::new(&["draft one", review_ok.as_str(), "draft two", review_ok.as_str()]);
    let publisher = Arc::new(RecordingPublisher::default());
    let wf = workflow(model.clone(), publisher.clone());

    wf.start_session("h", "Rust").await.unwrap();
    let outcome = wf
        .resume("h", HumanInput::reject("more examples"))
        .await
        .unwrap();

    assert!(outcome.is_suspended());
    assert_eq!(outcome.state().content, "draft two");
    assert_eq!(publisher.count(), 0);

    let writer_prompts = model.writer_prompts();
    assert_eq!(writer_prompts.len(), 2);
    assert!(writer_prompts[1].ends_with("take into account the feedback more examples"));
}

#[tokio::test]
async fn test_revision_limit_stops_endless_rejection() {
    let review_no = reject("still bad");
    let model = MockModel::new(&["d1", review_no.as_str(), "d2", review_no.as_str(), "d3", review_no.as_str()]);
    let publisher = Arc::new(RecordingPublisher::default());
    let settings = WorkflowSettings {
        max_revisions: 2,
        ..WorkflowSettings::default()
    };
    let wf = workflow_with(
        model.clone(),
        publisher.clone(),
        Arc::new(MemoryCheckpointer::new()),
        settings,
    );

    let err = wf.start_session("loop", "Rust").await.unwrap_err();
    assert!(matches!(err, QuillError::MaxIterations { limit: 2, .. }));
    assert_eq!(model.writer_prompts().len(), 2);
    assert_eq!(publisher.count(), 0);
    assert!(wf.status("loop").await.unwrap().is_none());
}

#[tokio::test]
async fn test_revision_limit_reached_through_human_rejections() {
    let review_ok = approve("ok");
    let model = MockModel::new(&["d1", review_ok.as_str(), "d2", review_ok.as_str(), "d3", review_ok.as_str()]);
    let publisher = Arc::new(RecordingPublisher::default());
    let settings = WorkflowSettings {
        max_revisions: 2,
        ..WorkflowSettings::default()
    };
    let wf = workflow_with(
        model.clone(),
        publisher.clone(),
        Arc::new(MemoryCheckpointer::new()),
        settings,
    );

    wf.start_session("people", "Rust").await.unwrap();
    let second = wf
        .resume("people", HumanInput::reject("shorter"))
        .await
        .unwrap();
    assert!(second.is_suspended());

    let err = wf
        .resume("people", HumanInput::reject("shorter still"))
        .await
        .unwrap_err();
    assert!(matches!(err, QuillError::MaxIterations { limit: 2, .. }));
    assert_eq!(model.writer_prompts().len(), 2);
    assert_eq!(publisher.count(), 0);

    let checkpoint = wf.status("people").await.unwrap().unwrap();
    assert_eq!(checkpoint.node, NodeId::HumanGate);
    assert_eq!(checkpoint.state.content, "d2");
    assert_eq!(checkpoint.state.revisions, 2);

    // The paused draft can still be approved
    let done = wf.resume("people", HumanInput::approve()).await.unwrap();
    assert!(done.state().is_published());
    assert_eq!(publisher.count(), 1);
}

#[tokio::test]
async fn test_concurrent_resumes_publish_once() {
    let review_ok = approve("ok");
    let model = MockModel::new(&["draft", review_ok.as_str()]);
    let publisher = SlowPublisher::new(Duration::from_millis(100), false);
    let wf = workflow_with(
        model,
        publisher.clone(),
        Arc::new(MemoryCheckpointer::new()),
        WorkflowSettings::default(),
    );
    wf.start_session("s", "Rust").await.unwrap();

    let (first, second) = tokio::join!(
        wf.resume("s", HumanInput::approve()),
        wf.resume("s", HumanInput::approve())
    );

    assert_eq!(publisher.calls(), 1);
    let (done, lost) = match (first, second) {
        (Ok(done), Err(lost)) | (Err(lost), Ok(done)) => (done, lost),
        other => panic!("expected one success and one failure, got {:?}", other),
    };
    assert!(!done.is_suspended());
    assert!(matches!(
        lost,
        QuillError::Workflow(WorkflowError::SessionNotFound(_))
    ));
    assert!(wf.status("s").await.unwrap().is_none());
}

#[tokio::test]
async fn test_concurrent_resumes_across_file_stores() {
    let dir = tempfile::tempdir().unwrap();
    let review_ok = approve("ok");
    let publisher = SlowPublisher::new(Duration::from_millis(100), false);

    let first = workflow_with(
        MockModel::new(&["draft", review_ok.as_str()]),
        publisher.clone(),
        Arc::new(FileCheckpointer::new(dir.path())),
        WorkflowSettings::default(),
    );
    let second = workflow_with(
        MockModel::new(&[]),
        publisher.clone(),
        Arc::new(FileCheckpointer::new(dir.path())),
        WorkflowSettings::default(),
    );
    first.start_session("shared", "Rust").await.unwrap();

    let (a, b) = tokio::join!(
        first.resume("shared", HumanInput::approve()),
        second.resume("shared", HumanInput::approve())
    );
    assert_eq!(publisher.calls(), 1);
    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
}

#[tokio::test]
async fn test_publish_failure_keeps_checkpoint_for_retry() {
    let review_ok = approve("ok");
    let checkpointer: Arc<dyn Checkpointer> = Arc::new(MemoryCheckpointer::new());
    let failing = SlowPublisher::new(Duration::from_millis(0), true);
    let wf = workflow_with(
        MockModel::new(&["## Rust\nbody", review_ok.as_str()]),
        failing.clone(),
        checkpointer.clone(),
        WorkflowSettings::default(),
    );
    wf.start_session("retry", "Rust").await.unwrap();

    let err = wf.resume("retry", HumanInput::approve()).await.unwrap_err();
    match &err {
        QuillError::Api { provider, message } => {
            assert_eq!(provider, "Blogger");
            assert!(message.contains("503"));
        }
        other => panic!("expected API error, got {:?}", other),
    }
    assert_eq!(failing.calls(), 1);

    let checkpoint = wf.status("retry").await.unwrap().unwrap();
    assert_eq!(checkpoint.node, NodeId::HumanGate);
    assert!(checkpoint.state.published_url.is_none());
    assert!(checkpoint.state.final_content.is_none());

    let publisher = Arc::new(RecordingPublisher::default());
    let retry = workflow_with(
        MockModel::new(&[]),
        publisher.clone(),
        checkpointer,
        WorkflowSettings::default(),
    );
    let done = retry.resume("retry", HumanInput::approve()).await.unwrap();
    assert_eq!(
        done.state().published_url.as_deref(),
        Some("https://blog.example/posts/1")
    );
    assert_eq!(publisher.count(), 1);
    assert!(retry.status("retry").await.unwrap().is_none());
}

#[tokio::test]
async fn test_malformed_review_is_an_error() {
    let model = MockModel::new(&["draft", "I think it is Approved"]);
    let publisher = Arc::new(RecordingPublisher::default());
    let wf = workflow(model, publisher.clone());

    let err = wf.start("Rust").await.unwrap_err();
    assert!(matches!(err, QuillError::Model(_)));
    assert_eq!(publisher.count(), 0);
}

#[tokio::test]
async fn test_resume_errors() {
    let review_ok = approve("ok");
    let model = MockModel::new(&["draft", review_ok.as_str()]);
    let wf = workflow(model, Arc::new(RecordingPublisher::default()));

    let err = wf.resume("nope", HumanInput::approve()).await.unwrap_err();
    assert!(matches!(
        err,
        QuillError::Workflow(WorkflowError::SessionNotFound(_))
    ));

    wf.start_session("dup", "Rust").await.unwrap();
    let err = wf.start_session("dup", "Rust").await.unwrap_err();
    assert!(matches!(
        err,
        QuillError::Workflow(WorkflowError::SessionExists(_))
    ));

    assert!(wf.cancel("dup").await.unwrap());
    assert!(wf.status("dup").await.unwrap().is_none());
}

#[tokio::test]
async fn test_pause_and_resume_across_processes() {
    let dir = tempfile::tempdir().unwrap();
    let review_ok = approve("ok");

    let first = workflow_with(
        MockModel::new(&["saved draft", review_ok.as_str()]),
        Arc::new(RecordingPublisher::default()),
        Arc::new(FileCheckpointer::new(dir.path())),
        WorkflowSettings::default(),
    );
    first.start_session("disk", "Rust").await.unwrap();
    drop(first);

    let publisher = Arc::new(RecordingPublisher::default());
    let second = workflow_with(
        MockModel::new(&[]),
        publisher.clone(),
        Arc::new(FileCheckpointer::new(dir.path())),
        WorkflowSettings::default(),
    );
    assert_eq!(second.sessions().await.unwrap(), vec!["disk"]);

    let done = second.resume("disk", HumanInput::approve()).await.unwrap();
    assert!(!done.is_suspended());
    assert_eq!(publisher.count(), 1);
    assert!(publisher.posts.lock().unwrap()[0]
        .content
        .contains("<p>saved draft</p>"));
    assert!(second.sessions().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_independent_sessions() {
    let review_ok = approve("ok");
    let model = MockModel::new(&["rust draft", review_ok.as_str(), "go draft", review_ok.as_str()]);
    let wf = workflow(model, Arc::new(RecordingPublisher::default()));

    wf.start_session("a", "Rust").await.unwrap();
    wf.start_session("b", "Go").await.unwrap();

    let a = wf.status("a").await.unwrap().unwrap();
    let b = wf.status("b").await.unwrap().unwrap();
    assert_eq!(a.state.content, "rust draft");
    assert_eq!(b.state.content, "go draft");
}

// ============================================================================
// Formatter Tests
// ============================================================================

#[test]
fn test_formatter_scenarios() {
    assert_eq!(
        format_text_to_html("## Title\nIntro"),
        "<h1>Title</h1>\n<p>Intro</p>"
    );
    assert_eq!(
        format_text_to_html("- a\n- b\nend"),
        "<ul>\n<li>a</li>\n<li>b</li>\n</ul>\n<p>end</p>"
    );
    assert_eq!(
        format_text_to_html("1. one\n2. two"),
        "<ol>\n<li>one</li>\n<li>two</li>\n</ol>"
    );
}

#[test]
fn test_document_wrapper() {
    let doc = render_document("Rust", "Hello");
    assert!(doc.starts_with("<html>"));
    assert!(doc.contains("<title>Rust</title>"));
    assert!(doc.contains("<body>\n<p>Hello</p>\n</body>"));
}

// ============================================================================
// Blogger Client Tests
// ============================================================================

#[derive(Clone, Default)]
struct FakeBlogger {
    requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn insert_post(
    State(fake): State<FakeBlogger>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    fake.requests.lock().unwrap().push((auth, body.clone()));

    if body["title"] == "forbidden" {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": { "message": "insufficient permissions" } })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "kind": "blogger#post",
            "status": "LIVE",
            "url": "http://fake.blogspot.com/2026/10/post.html",
            "author": { "displayName": "Ada" }
        })),
    )
}

async fn spawn_fake_blogger() -> (String, FakeBlogger) {
    let fake = FakeBlogger::default();
    let app = Router::new()
        .route("/blogger/v3/blogs/{blog_id}/posts", post(insert_post))
        .with_state(fake.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/blogger/v3", addr), fake)
}

#[tokio::test]
async fn test_blogger_client_publishes_with_bearer_token() {
    let (base, fake) = spawn_fake_blogger().await;
    let client = BloggerClient::new(base, "4629984879079699160", Arc::new(StaticToken("tok".into())));

    let post = client
        .insert_post(&PostPayload::html("Rust", "<html></html>", "This is meta data"))
        .await
        .unwrap();
    assert_eq!(post.author, "Ada");
    assert_eq!(post.status, "LIVE");
    assert_eq!(post.url, "http://fake.blogspot.com/2026/10/post.html");

    let requests = fake.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (auth, body) = &requests[0];
    assert_eq!(auth.as_deref(), Some("Bearer tok"));
    assert_eq!(body["kind"], "blogger#post");
    assert_eq!(body["contentType"], "html");
    assert_eq!(body["customMetaData"], "This is meta data");
}

#[tokio::test]
async fn test_blogger_client_reports_http_errors() {
    let (base, _fake) = spawn_fake_blogger().await;
    let client = BloggerClient::new(base, "1", Arc::new(StaticToken("tok".into())));

    let err = client
        .insert_post(&PostPayload::html("forbidden", "x", "m"))
        .await
        .unwrap_err();
    match err {
        QuillError::Api { provider, message } => {
            assert_eq!(provider, "Blogger");
            assert!(message.contains("403"));
        }
        other => panic!("expected API error, got {:?}", other),
    }
}
