//! Shared test harness for answercheck integration tests.
//!
//! Provides:
//! 1. `FakeGemini` -- an in-process `generateContent` server with scripted replies
//! 2. `TestEnv` builder -- isolated HOME with a judge config pointing at the fake server
//! 3. `write_xlsx` -- a minimal single-sheet workbook writer for spreadsheet input

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use zip::write::SimpleFileOptions;

pub const HEADER: &str = "questions,correct_answers,answers_by_llm";

// ---------------------------------------------------------------------------
// RunResult
// ---------------------------------------------------------------------------

/// Captures exit code, stdout, and stderr from an answercheck invocation.
pub struct RunResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl RunResult {
    /// Assert the process exited with `expected`, showing output on failure.
    pub fn assert_exit(&self, expected: i32) {
        assert_eq!(
            self.exit_code, expected,
            "Expected exit code {} but got {}\nstdout: {}\nstderr: {}",
            expected, self.exit_code, self.stdout, self.stderr
        );
    }

    /// Assert that stderr contains `substring`.
    pub fn assert_stderr_contains(&self, substring: &str) {
        assert!(
            self.stderr.contains(substring),
            "Expected stderr to contain '{}'\nstdout: {}\nstderr: {}",
            substring,
            self.stdout,
            self.stderr
        );
    }
}

// ---------------------------------------------------------------------------
// FakeGemini
// ---------------------------------------------------------------------------

/// A scripted HTTP reply.
#[derive(Clone)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    /// A successful `generateContent` response carrying `text`.
    pub fn text(text: &str) -> Self {
        let body = serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }], "role": "model" },
                "finishReason": "STOP"
            }]
        });
        Self {
            status: 200,
            body: body.to_string(),
        }
    }

    pub fn status(status: u16, message: &str) -> Self {
        let body = serde_json::json!({
            "error": { "code": status, "message": message }
        });
        Self {
            status,
            body: body.to_string(),
        }
    }
}

/// One request received by the fake server.
#[derive(Clone, Debug)]
pub struct Received {
    pub head: String,
    pub body: String,
}

impl Received {
    /// The prompt text sent in the request body.
    pub fn prompt(&self) -> String {
        let parsed: serde_json::Value = serde_json::from_str(&self.body)
            .unwrap_or_else(|e| panic!("request body is not JSON: {e}\n{}", self.body));
        parsed["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap_or_else(|| panic!("no prompt in request body: {}", self.body))
            .to_string()
    }
}

/// Serves scripted replies in order, one per connection. Once the script runs
/// out every request gets a 500.
pub struct FakeGemini {
    base_url: String,
    received: Arc<Mutex<Vec<Received>>>,
}

impl FakeGemini {
    pub fn start(replies: Vec<Reply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake server");
        let addr = listener.local_addr().unwrap();
        let received = Arc::new(Mutex::new(Vec::new()));
        let script = Arc::new(Mutex::new(VecDeque::from(replies)));

        let log = Arc::clone(&received);
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                let reply = script
                    .lock()
                    .unwrap()
                    .pop_front()
                    .unwrap_or_else(|| Reply::status(500, "script exhausted"));
                serve(stream, &reply, &log);
            }
        });

        Self {
            base_url: format!("http://{addr}/v1beta"),
            received,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn requests(&self) -> Vec<Received> {
        self.received.lock().unwrap().clone()
    }
}

/// Read one request, record it, then answer with `reply`. Recording happens
/// before the response so the request is visible once the client returns.
fn serve(stream: TcpStream, reply: &Reply, log: &Mutex<Vec<Received>>) -> Option<()> {
    let mut reader = BufReader::new(stream.try_clone().ok()?);
    let mut head = String::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).ok()? == 0 {
            return None;
        }
        if line == "\r\n" {
            break;
        }
        head.push_str(&line);
    }

    let content_length = head
        .lines()
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).ok()?;
    log.lock().unwrap().push(Received {
        head,
        body: String::from_utf8_lossy(&body).to_string(),
    });

    let reason = match reply.status {
        200 => "OK",
        429 => "Too Many Requests",
        _ => "Error",
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        reply.status,
        reason,
        reply.body.len(),
        reply.body
    );
    let mut stream = stream;
    stream.write_all(response.as_bytes()).ok()?;
    stream.flush().ok()
}

// ---------------------------------------------------------------------------
// TestEnv builder
// ---------------------------------------------------------------------------

/// Builder for constructing a `TestEnv`.
pub struct TestEnvBuilder {
    base_url: String,
    api_key: Option<String>,
    extra_config: String,
}

/// An isolated HOME and working directory. Temp directories are cleaned up on drop.
pub struct TestEnv {
    home_dir: tempfile::TempDir,
    work_dir: tempfile::TempDir,
    api_key: Option<String>,
}

impl TestEnv {
    /// Start building a test environment whose judge talks to `server`.
    pub fn new(server: &FakeGemini) -> TestEnvBuilder {
        TestEnvBuilder {
            base_url: server.base_url().to_string(),
            api_key: Some("test-key".to_string()),
            extra_config: String::new(),
        }
    }

    /// Write `content` to `name` inside the working directory and return its path.
    pub fn write_input(&self, name: &str, content: &str) -> PathBuf {
        let path = self.work_dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Run answercheck with `args` from the working directory.
    pub fn run(&self, args: &[&str]) -> RunResult {
        let mut cmd = Command::new(answercheck_bin());
        cmd.args(args)
            .current_dir(self.work_dir.path())
            .env_clear()
            .env("HOME", self.home_dir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(ref key) = self.api_key {
            cmd.env("GOOGLE_API_KEY", key);
        }

        let output = cmd.output().expect("Failed to spawn answercheck");
        RunResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }

    /// Read a file from the working directory.
    pub fn read_output(&self, name: &str) -> String {
        std::fs::read_to_string(self.work_dir.path().join(name))
            .unwrap_or_else(|e| panic!("failed to read output {name}: {e}"))
    }

    pub fn work_path(&self) -> &Path {
        self.work_dir.path()
    }

    pub fn home_path(&self) -> &Path {
        self.home_dir.path()
    }

    pub fn log_path(&self) -> PathBuf {
        self.home_path()
            .join(".local")
            .join("state")
            .join("answercheck")
            .join("judgments.jsonl")
    }
}

impl TestEnvBuilder {
    /// Run without any API key in the environment.
    pub fn without_api_key(mut self) -> Self {
        self.api_key = None;
        self
    }

    /// Append extra YAML lines to the generated judge config.
    pub fn with_config(mut self, yaml: &str) -> Self {
        self.extra_config.push_str(yaml);
        self.extra_config.push('\n');
        self
    }

    /// Build the environment, writing `~/.config/answercheck/judge.yaml`.
    pub fn build(self) -> TestEnv {
        let home_dir = tempfile::TempDir::new().expect("Failed to create temp HOME dir");
        let work_dir = tempfile::TempDir::new().expect("Failed to create temp work dir");

        // Millisecond backoff keeps retry tests fast
        let config_dir = home_dir.path().join(".config").join("answercheck");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            config_dir.join("judge.yaml"),
            format!(
                "base_url: {}\ntimeout: 5\nbackoff_unit_ms: 1\n{}",
                self.base_url, self.extra_config
            ),
        )
        .unwrap();

        TestEnv {
            home_dir,
            work_dir,
            api_key: self.api_key,
        }
    }
}

/// Path to the compiled answercheck binary.
pub fn answercheck_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_answercheck"))
}

/// Build a CSV input from `(question, expected, candidate)` rows.
pub fn csv_input(rows: &[(&str, &str, &str)]) -> String {
    let mut out = format!("{HEADER}\n");
    for (q, e, c) in rows {
        out.push_str(&format!("{q},{e},{c}\n"));
    }
    out
}

// ---------------------------------------------------------------------------
// Workbook fixtures
// ---------------------------------------------------------------------------

/// One cell of a generated worksheet.
#[derive(Clone, Copy)]
pub enum XlsxCell<'a> {
    Text(&'a str),
    Number(f64),
    /// A serial date shown with the built-in `mm-dd-yy` format.
    Date(f64),
    /// No `<c>` element at all.
    Missing,
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

// Style 0 is general, style 1 is built-in date format 14.
const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/><xf numFmtId="14" fontId="0" fillId="0" borderId="0" applyNumberFormat="1"/></cellXfs></styleSheet>"#;

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn sheet_xml(rows: &[Vec<XlsxCell<'_>>]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (r, row) in rows.iter().enumerate() {
        let row_num = r + 1;
        xml.push_str(&format!(r#"<row r="{row_num}">"#));
        for (c, cell) in row.iter().enumerate() {
            let cell_ref = format!("{}{row_num}", (b'A' + c as u8) as char);
            match cell {
                XlsxCell::Text(text) => xml.push_str(&format!(
                    r#"<c r="{cell_ref}" t="inlineStr"><is><t>{}</t></is></c>"#,
                    xml_escape(text)
                )),
                XlsxCell::Number(n) => {
                    xml.push_str(&format!(r#"<c r="{cell_ref}"><v>{n}</v></c>"#))
                }
                XlsxCell::Date(serial) => {
                    xml.push_str(&format!(r#"<c r="{cell_ref}" s="1"><v>{serial}</v></c>"#))
                }
                XlsxCell::Missing => {}
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

/// Write a one-sheet `.xlsx` workbook holding `rows` (first row is the header).
pub fn write_xlsx(path: &Path, rows: &[Vec<XlsxCell<'_>>]) {
    let file = std::fs::File::create(path).expect("create workbook");
    let mut zip = zip::ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", ROOT_RELS.to_string()),
        ("xl/workbook.xml", WORKBOOK.to_string()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.to_string()),
        ("xl/styles.xml", STYLES.to_string()),
        ("xl/worksheets/sheet1.xml", sheet_xml(rows)),
    ];
    for (name, body) in parts {
        zip.start_file(name, options).expect("start workbook part");
        zip.write_all(body.as_bytes()).expect("write workbook part");
    }
    zip.finish().expect("finish workbook");
}
