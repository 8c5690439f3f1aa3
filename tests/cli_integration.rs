use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

const ADMIN_SESSION: &str = r#"{
  "display_name": "Jane Doe",
  "email": "jane.doe@fitcheck.io",
  "is_admin": true,
  "signed_in_at": "2026-10-19T10:00:00Z"
}"#;

const MEMBER_SESSION: &str = r#"{
  "display_name": "Sam",
  "email": "sam@fitcheck.io",
  "is_admin": false,
  "signed_in_at": "2026-10-19T10:00:00Z"
}"#;

/// Isolated config/session/download folders for one test
struct Sandbox {
    root: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        fs::create_dir_all(root.path().join("config")).expect("config dir");
        Self { root }
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.root.path().join(rel)
    }

    fn config_dir(&self) -> PathBuf {
        self.path("config")
    }

    fn downloads(&self) -> PathBuf {
        self.path("Downloads")
    }

    fn sign_in(&self, session: &str) {
        fs::write(self.config_dir().join("session.json"), session).expect("write session");
    }

    fn write_file(&self, rel: &str, content: &[u8]) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, content).expect("write test file");
        path
    }

    fn run(&self, args: &[&str]) -> (bool, Vec<u8>, Vec<u8>) {
        self.run_with_stdin(args, None)
    }

    fn run_with_stdin(&self, args: &[&str], stdin: Option<&str>) -> (bool, Vec<u8>, Vec<u8>) {
        self.run_with_env(args, stdin, &[])
    }

    fn run_with_env(
        &self,
        args: &[&str],
        stdin: Option<&str>,
        envs: &[(&str, &str)],
    ) -> (bool, Vec<u8>, Vec<u8>) {
        let bin = std::env::var("CARGO_BIN_EXE_fitcheck").unwrap_or_else(|_| {
            let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
            path.push("target");
            path.push("debug");
            if cfg!(windows) {
                path.push("fitcheck.exe");
            } else {
                path.push("fitcheck");
            }
            path.to_string_lossy().into_owned()
        });
        let mut cmd = Command::new(bin);
        cmd.args(args)
            .env("HOME", self.root.path())
            .env("FITCHECK_CONFIG_DIR", self.config_dir())
            .env("FITCHECK_DOWNLOADS", self.downloads())
            .env_remove("FITCHECK_CLOTHES")
            .env_remove("FITCHECK_SERVICE_URL")
            .env_remove("FITCHECK_SERVICE_KEY")
            .env_remove("FITCHECK_PREDICT_URL")
            .env_remove("RUST_LOG");
        cmd.envs(envs.iter().copied());
        if let Some(input) = stdin {
            use std::io::Write;
            use std::process::Stdio;
            cmd.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped());
            let mut child = cmd.spawn().expect("spawn fitcheck");
            child
                .stdin
                .take()
                .expect("stdin")
                .write_all(input.as_bytes())
                .expect("write stdin");
            let output = child.wait_with_output().expect("wait fitcheck");
            return (output.status.success(), output.stdout, output.stderr);
        }
        let output = cmd.output().expect("run fitcheck");
        (output.status.success(), output.stdout, output.stderr)
    }
}

fn stderr_text(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr).into_owned()
}

fn file_text(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

#[test]
fn save_falls_back_to_two_downloads() {
    let sb = Sandbox::new();
    sb.sign_in(ADMIN_SESSION);
    let image = sb.write_file("input/photo.PNG", b"png-bytes");

    let (ok, stdout, stderr) = sb.run(&[
        "save",
        image.to_str().expect("utf8 path"),
        "--name",
        "denim shirt",
        "--json",
    ]);
    assert!(ok, "stderr: {}", stderr_text(&stderr));

    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(json["sink"], "download");
    assert_eq!(json["status"], "downloaded");
    assert_eq!(json["manual_move_required"], true);

    let downloaded: Vec<String> = {
        let mut names: Vec<String> = fs::read_dir(sb.downloads())
            .expect("downloads dir")
            .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    };
    assert_eq!(downloaded, vec!["denim_shirt.PNG", "denim_shirt.json"]);
    assert_eq!(fs::read(sb.downloads().join("denim_shirt.PNG")).unwrap(), b"png-bytes");
    assert_eq!(file_text(&sb.downloads().join("denim_shirt.json")), "{}");
}

#[test]
fn save_writes_into_clothes_directory() {
    let sb = Sandbox::new();
    sb.sign_in(ADMIN_SESSION);
    let image = sb.write_file("input/photo.PNG", b"png-bytes");
    let label = sb.write_file("input/denim.json", br#"{"denim": true, "shirt": true}"#);
    let clothes = sb.path("Clothes");
    fs::create_dir_all(&clothes).unwrap();

    let (ok, stdout, stderr) = sb.run(&[
        "save",
        image.to_str().unwrap(),
        "-n",
        "denim shirt",
        "--label-file",
        label.to_str().unwrap(),
        "--dir",
        clothes.to_str().unwrap(),
    ]);
    assert!(ok, "stderr: {}", stderr_text(&stderr));
    assert!(String::from_utf8_lossy(&stdout).contains("Saved successfully"));

    assert_eq!(fs::read(clothes.join("denim_shirt.PNG")).unwrap(), b"png-bytes");
    assert_eq!(
        file_text(&clothes.join("labels").join("denim_shirt.json")),
        r#"{"denim": true, "shirt": true}"#
    );
    assert!(!sb.downloads().exists());
}

#[test]
fn save_defaults_name_to_image_stem() {
    let sb = Sandbox::new();
    sb.sign_in(ADMIN_SESSION);
    let image = sb.write_file("input/red coat.webp", b"webp");
    let clothes = sb.path("Clothes");

    let (ok, _, stderr) = sb.run(&[
        "save",
        image.to_str().unwrap(),
        "--label",
        r#"{"coat": true}"#,
        "--dir",
        clothes.to_str().unwrap(),
        "--create-dir",
    ]);
    assert!(ok, "stderr: {}", stderr_text(&stderr));
    assert!(clothes.join("red_coat.webp").is_file());
    assert_eq!(
        file_text(&clothes.join("labels").join("red_coat.json")),
        r#"{"coat": true}"#
    );
}

#[test]
fn save_with_blank_name_writes_nothing() {
    let sb = Sandbox::new();
    sb.sign_in(ADMIN_SESSION);
    let image = sb.write_file("input/photo.png", b"png");

    let (ok, _, stderr) = sb.run(&["save", image.to_str().unwrap(), "--name", "   "]);
    assert!(!ok);
    assert!(stderr_text(&stderr).contains("missing name"));
    assert!(!sb.downloads().exists());
}

#[test]
fn save_rejects_names_that_leave_the_folder() {
    let sb = Sandbox::new();
    sb.sign_in(ADMIN_SESSION);
    let image = sb.write_file("input/photo.png", b"png");
    let clothes = sb.path("work/Clothes");
    fs::create_dir_all(&clothes).unwrap();

    let (ok, _, stderr) = sb.run(&[
        "save",
        image.to_str().unwrap(),
        "--name",
        "../../escaped",
        "--dir",
        clothes.to_str().unwrap(),
    ]);
    assert!(!ok);
    assert!(stderr_text(&stderr).contains("invalid name"));
    assert!(!sb.path("escaped.png").exists());
    assert!(!sb.path("work/escaped.png").exists());
    assert_eq!(fs::read_dir(&clothes).unwrap().count(), 0);
}

#[test]
fn save_without_image_is_rejected() {
    let sb = Sandbox::new();
    sb.sign_in(ADMIN_SESSION);

    let (ok, _, stderr) = sb.run(&["save", "--name", "shirt"]);
    assert!(!ok);
    assert!(stderr_text(&stderr).contains("missing image"));
}

#[test]
fn save_requires_admin() {
    let sb = Sandbox::new();
    sb.sign_in(MEMBER_SESSION);
    let image = sb.write_file("input/photo.png", b"png");

    let (ok, _, stderr) = sb.run(&["save", image.to_str().unwrap()]);
    assert!(!ok);
    assert!(stderr_text(&stderr).contains("Admin access required"));
}

#[test]
fn upload_requires_sign_in() {
    let sb = Sandbox::new();
    let image = sb.write_file("input/photo.png", b"png");

    let (ok, _, stderr) = sb.run(&["upload", image.to_str().unwrap()]);
    assert!(!ok);
    assert!(stderr_text(&stderr).contains("You must be logged in to upload clothes."));
}

#[test]
fn whoami_reflects_session() {
    let sb = Sandbox::new();

    let (ok, stdout, _) = sb.run(&["whoami"]);
    assert!(ok);
    assert_eq!(String::from_utf8_lossy(&stdout).trim(), "Not logged in");

    sb.sign_in(ADMIN_SESSION);
    let (ok, stdout, _) = sb.run(&["whoami", "--json"]);
    assert!(ok);
    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(json["signed_in"], true);
    assert_eq!(json["display_name"], "Jane Doe");
    assert_eq!(json["is_admin"], true);
}

#[test]
fn logout_without_service_clears_session() {
    let sb = Sandbox::new();
    sb.sign_in(MEMBER_SESSION);

    let (ok, stdout, stderr) = sb.run(&["logout"]);
    assert!(ok, "stderr: {}", stderr_text(&stderr));
    assert!(String::from_utf8_lossy(&stdout).contains("Signed out Sam"));
    assert!(!sb.config_dir().join("session.json").exists());
}

#[test]
fn login_needs_configured_service() {
    let sb = Sandbox::new();
    let (ok, _, stderr) = sb.run_with_stdin(&["login", "sam@fitcheck.io"], Some("pw\n"));
    assert!(!ok);
    assert!(stderr_text(&stderr).contains("account service URL not set"));
}

#[test]
fn login_reads_password_from_stdin() {
    let sb = Sandbox::new();
    let (ok, _, stderr) = sb.run_with_env(
        &["login", "sam@fitcheck.io"],
        Some("pw\n"),
        &[
            ("FITCHECK_SERVICE_URL", "http://127.0.0.1:9"),
            ("FITCHECK_SERVICE_KEY", "anon-key"),
        ],
    );
    assert!(!ok);
    assert!(stderr_text(&stderr).contains("Cannot reach http://127.0.0.1:9/rest/v1/Members"));
    assert!(!sb.config_dir().join("session.json").exists());
}

#[test]
fn catalog_lists_saved_pairs() {
    let sb = Sandbox::new();
    sb.write_file("Clothes/denim_shirt.png", b"png");
    sb.write_file("Clothes/labels/denim_shirt.json", br#"{"denim": true, "red": false}"#);
    sb.write_file("Clothes/orphan.jpg", b"jpg");
    let clothes = sb.path("Clothes");

    let (ok, stdout, stderr) = sb.run(&["catalog", "--dir", clothes.to_str().unwrap(), "--json"]);
    assert!(ok, "stderr: {}", stderr_text(&stderr));

    let json: Value = serde_json::from_slice(&stdout).expect("json");
    let entries = json["entries"].as_array().expect("entries");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["base_name"], "denim_shirt");
    assert_eq!(entries[0]["images"][0], "denim_shirt.png");
    assert_eq!(entries[0]["tags"], serde_json::json!(["denim"]));
    assert_eq!(json["unlabelled"], serde_json::json!(["orphan.jpg"]));
}

#[test]
fn catalog_uses_configured_clothes_dir() {
    let sb = Sandbox::new();
    let clothes = sb.path("Wardrobe");
    sb.write_file("Wardrobe/labels/hat.json", b"{}");
    fs::write(
        sb.config_dir().join("config.toml"),
        format!("clothes_dir = {:?}\n", clothes.to_string_lossy()),
    )
    .unwrap();

    let (ok, stdout, stderr) = sb.run(&["catalog", "--json"]);
    assert!(ok, "stderr: {}", stderr_text(&stderr));
    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(json["entries"][0]["base_name"], "hat");
}
