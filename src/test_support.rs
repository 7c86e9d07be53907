//! Fakes shared by the test suites: a scripted stand-in for the whisper CLI and
//! a local chat-completion endpoint.

use actix_web::dev::ServerHandle;
use actix_web::http::StatusCode;
use actix_web::{App, HttpResponse, HttpServer, web};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use crate::engine::EngineConfig;

/// Writes an executable `sh` script and returns its path.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
    path
}

pub enum FakeEngine {
    /// Writes `{"text": ...}` next to the audio stem and exits 0.
    Succeed(&'static str),
    /// Prints to stderr and exits with the code, writing nothing.
    Fail(i32),
    /// Exits 0 without writing an output file.
    NoOutput,
    /// Exits 0 after writing truncated JSON.
    Corrupt,
    /// Records its pid and a background child's pid, then sleeps.
    Hang,
    /// Logs `start`/`end` around a short sleep, then succeeds.
    Slow(&'static str),
}

pub struct FakeEngineHandle {
    pub config: EngineConfig,
    args_file: PathBuf,
    pid_file: PathBuf,
    child_pid_file: PathBuf,
    log_file: PathBuf,
}

impl FakeEngineHandle {
    pub fn was_invoked(&self) -> bool {
        self.args_file.exists()
    }

    /// Arguments of the most recent invocation, one per element.
    pub fn recorded_args(&self) -> Vec<String> {
        std::fs::read_to_string(&self.args_file)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Pids of the engine process and of the child it put in the background.
    pub fn recorded_pids(&self) -> (String, String) {
        let read = |path: &Path| std::fs::read_to_string(path).unwrap().trim().to_string();
        (read(&self.pid_file), read(&self.child_pid_file))
    }

    /// `start`/`end` lines in the order all runs wrote them.
    pub fn logged_events(&self) -> Vec<String> {
        std::fs::read_to_string(&self.log_file)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

/// Whether `pid` is still running. Zombies count as gone.
#[cfg(target_os = "linux")]
pub fn process_alive(pid: &str) -> bool {
    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        Ok(stat) => !stat
            .rsplit(')')
            .next()
            .is_some_and(|rest| rest.trim_start().starts_with('Z')),
        Err(_) => false,
    }
}

/// Builds an engine config whose program is a fake whisper script and whose
/// work dir lives under `dir`.
pub fn fake_engine(dir: &Path, behaviour: FakeEngine) -> FakeEngineHandle {
    let work_dir = dir.join("work");
    std::fs::create_dir_all(&work_dir).unwrap();
    let args_file = dir.join("engine-args.txt");
    let pid_file = dir.join("engine.pid");
    let child_pid_file = dir.join("engine-child.pid");
    let log_file = dir.join("engine-log.txt");

    let record = format!("printf '%s\\n' \"$@\" > '{}'", args_file.display());
    let locate = r#"audio="$1"
out=.
while [ $# -gt 0 ]; do
  case "$1" in
    --output_dir) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
name=$(basename "$audio")
name="${name%.*}""#;

    let write_output = |text: &str| {
        let payload = json!({ "text": format!(" {text}"), "segments": [], "language": "en" });
        format!("{locate}\ncat > \"$out/$name.json\" <<'JSON'\n{payload}\nJSON\nexit 0")
    };

    let action = match behaviour {
        FakeEngine::Succeed(text) => write_output(text),
        FakeEngine::Fail(code) => format!("echo 'model not found' >&2\nexit {code}"),
        FakeEngine::NoOutput => "exit 0".to_string(),
        FakeEngine::Corrupt => format!("{locate}\nprintf '{{\"text\": ' > \"$out/$name.json\"\nexit 0"),
        FakeEngine::Hang => format!(
            "echo $$ > '{}'\nsleep 30 &\necho $! > '{}'\nexec sleep 30",
            pid_file.display(),
            child_pid_file.display()
        ),
        FakeEngine::Slow(text) => format!(
            "echo start >> '{log}'\nsleep 0.3\necho end >> '{log}'\n{}",
            write_output(text),
            log = log_file.display()
        ),
    };

    let program = write_script(dir, "fake-whisper.sh", &format!("{record}\n{action}"));
    FakeEngineHandle {
        config: EngineConfig {
            program,
            work_dir,
            timeout: Duration::from_secs(10),
            max_jobs: 2,
        },
        args_file,
        pid_file,
        child_pid_file,
        log_file,
    }
}

pub enum ChatReply {
    Content(&'static str),
    Status(u16),
    NoChoices,
}

struct MockChatState {
    reply: ChatReply,
    requests: Mutex<Vec<Value>>,
}

/// A local OpenAI-style `/chat/completions` endpoint.
pub struct MockChat {
    pub base_url: String,
    state: web::Data<MockChatState>,
    handle: ServerHandle,
}

impl MockChat {
    pub async fn start(reply: ChatReply) -> Self {
        let state = web::Data::new(MockChatState {
            reply,
            requests: Mutex::new(Vec::new()),
        });

        let app_state = state.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(app_state.clone())
                .route("/chat/completions", web::post().to(completions))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();

        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        Self {
            base_url: format!("http://{addr}/"),
            state,
            handle,
        }
    }

    pub fn requests(&self) -> Vec<Value> {
        self.state.requests.lock().unwrap().clone()
    }

    pub async fn stop(self) {
        self.handle.stop(false).await;
    }
}

async fn completions(
    state: web::Data<MockChatState>,
    headers: actix_web::HttpRequest,
    body: web::Json<Value>,
) -> HttpResponse {
    let mut request = body.into_inner();
    if let Some(auth) = headers.headers().get("authorization") {
        request["authorization"] = json!(auth.to_str().unwrap_or_default());
    }
    state.requests.lock().unwrap().push(request);

    match &state.reply {
        ChatReply::Content(content) => HttpResponse::Ok().json(json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        })),
        ChatReply::Status(code) => {
            HttpResponse::build(StatusCode::from_u16(*code).unwrap()).body("upstream unavailable")
        }
        ChatReply::NoChoices => HttpResponse::Ok().json(json!({ "choices": [] })),
    }
}
